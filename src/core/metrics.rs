use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) const IEP_REPORTS_CREATED: &str = "iep_reports_created_total";
pub(crate) const IEP_OBJECTIVE_UPDATES: &str = "iep_objective_updates_total";
pub(crate) const IEP_REPORTS_SENT: &str = "iep_reports_sent_total";

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_objective_updates(operation: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    metrics::counter!(IEP_OBJECTIVE_UPDATES, "operation" => operation).increment(count as u64);
}

pub(crate) fn record_report_created() {
    metrics::counter!(IEP_REPORTS_CREATED).increment(1);
}

pub(crate) fn record_report_sent(email_sent: bool) {
    let email_sent = if email_sent { "true" } else { "false" };
    metrics::counter!(IEP_REPORTS_SENT, "email_sent" => email_sent).increment(1);
}
