//! Metrics definitions for the aggregator.

use shared::metrics_defs::{MetricDef, MetricType};

pub const AGGREGATION_DURATION: MetricDef = MetricDef {
    name: "aggregation.duration",
    metric_type: MetricType::Histogram,
    description: "Time to build one person document in seconds, including all upstream fetches",
};

pub const AGGREGATION_SUCCESS: MetricDef = MetricDef {
    name: "aggregation.success",
    metric_type: MetricType::Counter,
    description: "Number of person documents built successfully",
};

pub const AGGREGATION_NOT_FOUND: MetricDef = MetricDef {
    name: "aggregation.not_found",
    metric_type: MetricType::Counter,
    description: "Number of aggregations for persons unknown to the upstream catalog",
};

pub const AGGREGATION_FAILED: MetricDef = MetricDef {
    name: "aggregation.failed",
    metric_type: MetricType::Counter,
    description: "Number of aggregations aborted by an upstream fetch failure",
};

pub const UPSTREAM_FETCH: MetricDef = MetricDef {
    name: "upstream.fetch",
    metric_type: MetricType::Counter,
    description: "Number of upstream fetches, tagged with outcome (ok, not_found, bad_status, error)",
};

pub const ALL_METRICS: &[MetricDef] = &[
    AGGREGATION_DURATION,
    AGGREGATION_SUCCESS,
    AGGREGATION_NOT_FOUND,
    AGGREGATION_FAILED,
    UPSTREAM_FETCH,
];
