use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;

const METRICS_PREFIX: &str = "address_merge";

#[derive(thiserror::Error, Debug)]
pub enum MetricsInitError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(String),
    #[error("a metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Installs a statsd recorder as the global `metrics` recorder.
pub fn init(config: &MetricsConfig) -> Result<(), MetricsInitError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| MetricsInitError::Statsd(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|_| MetricsInitError::AlreadyInstalled)?;
    shared::describe_metrics!(address_merge::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
