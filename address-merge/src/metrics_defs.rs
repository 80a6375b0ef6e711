use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "requests",
    metric_type: MetricType::Counter,
    description: "Number of skill requests handled. Tagged with status.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status.",
};

pub const RECORDS_PROCESSED: MetricDef = MetricDef {
    name: "records.processed",
    metric_type: MetricType::Counter,
    description: "Number of records merged. Tagged with outcome (success, error).",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, REQUEST_DURATION, RECORDS_PROCESSED];
