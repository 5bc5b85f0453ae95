use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;


lazy_static! {
    /// Announcer decisions, labelled by `SayOutcome`
    pub static ref ANNOUNCEMENT_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("announcement", "announcement requests by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref HANDLER_FAULT_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("handler_fault", "faults escaping a feature handler"),
        &["feature"]
    )
    .expect("metric can not be created");

    pub static ref HANDLER_RELEASE_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("handler_release", "cached handles released as unusable"),
        &["feature"]
    )
    .expect("metric can not be created");

    pub static ref HANDLER_DISABLED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("handler_disabled", "handlers disabled for the session"),
        &["feature", "reason"]
    )
    .expect("metric can not be created");
}

/// Register all crate metrics on `registry`.
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(ANNOUNCEMENT_METRIC.clone()))?;
    registry.register(Box::new(HANDLER_FAULT_METRIC.clone()))?;
    registry.register(Box::new(HANDLER_RELEASE_METRIC.clone()))?;
    registry.register(Box::new(HANDLER_DISABLED_METRIC.clone()))?;
    Ok(())
}

/// Text exposition of `registry`, e.g. for a debug dump on shutdown.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::warn!("could not encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
