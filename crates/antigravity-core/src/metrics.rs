//! Prometheus metrics for the routing core (C8's `/api/metrics`).
//!
//! Exposes `health_score` gauges per (account, model), issue counts by
//! status, and the event-log size — modeled on the teacher's
//! `proxy::prometheus` module, scoped down to what this core actually owns.

use std::sync::OnceLock;

use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use antigravity_types::models::Account;

use crate::health::HealthSummary;
use crate::issues::IssueAggregator;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Idempotent; safe to call once at
/// startup.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus metrics recorder");

            describe_gauge!("antigravity_health_score", "Per (account, model) health score, 0-100");
            describe_gauge!("antigravity_accounts_total", "Total registered accounts");
            describe_gauge!("antigravity_accounts_enabled", "Accounts currently enabled");
            describe_gauge!("antigravity_health_healthy_total", "(account, model) pairs in the healthy bucket");
            describe_gauge!("antigravity_health_warning_total", "(account, model) pairs in the warning bucket");
            describe_gauge!("antigravity_health_critical_total", "(account, model) pairs in the critical bucket");
            describe_gauge!("antigravity_health_disabled_total", "(account, model) pairs disabled");
            describe_gauge!("antigravity_issues_active_total", "Active issues");
            describe_gauge!("antigravity_issues_acknowledged_total", "Acknowledged issues");
            describe_gauge!("antigravity_event_log_size", "Events currently held in memory");

            handle
        })
        .clone()
}

/// Refresh every gauge from current state. Called on each `/api/metrics`
/// scrape rather than on a timer — scrape rate is the dashboard's concern.
pub fn update_gauges(accounts: &[Account], summary: &HealthSummary, issues: &IssueAggregator, event_log_size: usize) {
    gauge!("antigravity_accounts_total").set(accounts.len() as f64);
    gauge!("antigravity_accounts_enabled").set(accounts.iter().filter(|a| a.enabled).count() as f64);

    for account in accounts {
        for (model, rec) in &account.health {
            let labels = [("account", account.email.clone()), ("model", model.clone())];
            gauge!("antigravity_health_score", &labels).set(rec.health_score);
        }
    }

    gauge!("antigravity_health_healthy_total").set(summary.healthy as f64);
    gauge!("antigravity_health_warning_total").set(summary.warning as f64);
    gauge!("antigravity_health_critical_total").set(summary.critical as f64);
    gauge!("antigravity_health_disabled_total").set(summary.disabled as f64);

    let stats = issues.stats();
    gauge!("antigravity_issues_active_total").set(stats.active as f64);
    gauge!("antigravity_issues_acknowledged_total").set(stats.acknowledged as f64);

    gauge!("antigravity_event_log_size").set(event_log_size as f64);
}

pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE.get().map_or_else(|| "# metrics not initialized\n".to_string(), PrometheusHandle::render)
}
