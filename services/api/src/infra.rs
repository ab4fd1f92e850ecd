use metrics_exporter_prometheus::PrometheusHandle;
use scout_ai::config::RecruitingConfig;
use scout_ai::workflows::recruiting::{
    DemoSourcingAgent, LoggingOutreachSender, RecruitingService, TemplatePitchWriter,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service wired to the deterministic agents; no provider credentials needed.
pub(crate) type DemoService =
    RecruitingService<DemoSourcingAgent, TemplatePitchWriter, LoggingOutreachSender>;

pub(crate) fn build_service(config: RecruitingConfig, sourcing_latency: Duration) -> Arc<DemoService> {
    Arc::new(RecruitingService::new(
        Arc::new(DemoSourcingAgent::new(sourcing_latency)),
        Arc::new(TemplatePitchWriter),
        Arc::new(LoggingOutreachSender),
        config,
    ))
}
