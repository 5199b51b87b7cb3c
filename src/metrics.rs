use metrics::{describe_gauge, gauge, Gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics exporter and return its render handle.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Full exposition name: `namespace_subsystem_name_unit`, skipping empty
/// segments (prometheus client naming convention).
pub fn gauge_name(namespace: &str, subsystem: &str, name: &str, unit: &str) -> String {
    [namespace, subsystem, name, unit]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Register a gauge under `name` with its help text and return the handle.
pub fn register_gauge(name: &str, description: &str) -> Gauge {
    describe_gauge!(name.to_string(), description.to_string());
    gauge!(name.to_string())
}
