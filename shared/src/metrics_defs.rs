//! Common types for metrics definitions.
//!
//! Each crate declares its metrics as `MetricDef` constants and lists them in an
//! `ALL_METRICS` slice so the binary can register descriptions at startup.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Gauge => "Gauge",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Registers the description of every metric with the installed recorder.
/// Must be called after the global recorder is set, otherwise it is a no-op.
pub fn describe_all(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Gauge => metrics::describe_gauge!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}

/// Returns the names that appear more than once across the given definitions.
pub fn duplicate_names(defs: &[MetricDef]) -> Vec<&'static str> {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();
    for def in defs {
        if !seen.insert(def.name) && !duplicates.contains(&def.name) {
            duplicates.push(def.name);
        }
    }
    duplicates
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
    ($def:expr, $($label:expr => $value:expr),+ $(,)?) => {
        metrics::counter!($def.name, $($label => $value),+)
    };
}

#[macro_export]
macro_rules! gauge {
    ($def:expr) => {
        metrics::gauge!($def.name)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
    ($def:expr, $($label:expr => $value:expr),+ $(,)?) => {
        metrics::histogram!($def.name, $($label => $value),+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MetricDef = MetricDef {
        name: "a",
        metric_type: MetricType::Counter,
        description: "first",
    };
    const B: MetricDef = MetricDef {
        name: "b",
        metric_type: MetricType::Histogram,
        description: "second",
    };

    #[test]
    fn test_duplicate_names() {
        assert!(duplicate_names(&[A, B]).is_empty());
        assert_eq!(duplicate_names(&[A, B, A, A]), vec!["a"]);
    }

    #[test]
    fn test_describe_without_recorder() {
        // No recorder installed, must not panic
        describe_all(&[A, B]);
        counter!(A).increment(1);
        histogram!(B, "outcome" => "ok").record(1.0);
    }
}
