//! Metrics definitions for the record service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const RECORDS_CREATED: MetricDef = MetricDef {
    name: "records.created",
    metric_type: MetricType::Counter,
    description: "Number of records created from upstream persons",
};

pub const RECORDS_PATCHED: MetricDef = MetricDef {
    name: "records.patched",
    metric_type: MetricType::Counter,
    description: "Number of patches applied to stored records",
};

pub const RECORDS_DELETED: MetricDef = MetricDef {
    name: "records.deleted",
    metric_type: MetricType::Counter,
    description: "Number of records deleted",
};

pub const API_ERRORS: MetricDef = MetricDef {
    name: "api.errors",
    metric_type: MetricType::Counter,
    description: "Number of error responses. Tagged with status.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    RECORDS_CREATED,
    RECORDS_PATCHED,
    RECORDS_DELETED,
    API_ERRORS,
];
