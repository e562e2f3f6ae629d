//! Rescan Scheduler
//!
//! A single task drives every cycle, so at most one cycle is ever active.
//! Ticks missed while a slow cycle runs are skipped, not queued.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::{CollectionReport, SourceOrchestrator};
use crate::health::HealthCheck;

/// Default time between collection cycles.
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Run one cycle, log its summary and record it for readiness.
pub async fn run_once(orchestrator: &SourceOrchestrator, health: &HealthCheck) -> CollectionReport {
    let report = orchestrator.collect().await;

    info!(
        source = %report.source,
        controllers = report.controllers,
        physical_drives = report.physical_drives,
        virtual_drives = report.virtual_drives,
        devices = report.devices,
        measurements = report.measurements,
        elapsed_ms = report.elapsed_ms,
        "Collection cycle complete"
    );
    if report.failed_writes > 0 {
        warn!(failed_writes = report.failed_writes, "Some measurements were not written");
    }
    match serde_json::to_string(&report) {
        Ok(json) => debug!(report = %json, "Collection report"),
        Err(e) => debug!(error = %e, "Could not serialize collection report"),
    }

    health.record_cycle(&report);
    report
}

/// Run cycles forever, the first immediately and then once per `every`.
#[instrument(skip(orchestrator, health))]
pub async fn run_periodic(orchestrator: &SourceOrchestrator, every: Duration, health: &HealthCheck) {
    info!("Starting rescan scheduler");

    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        info!("Rescanning hardware");
        run_once(orchestrator, health).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemorySink, StaticCommandRunner};
    use crate::collector::{CollectorConfig, DataSource};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_once_marks_ready() {
        let orchestrator = SourceOrchestrator::new(
            CollectorConfig::default(),
            Arc::new(StaticCommandRunner::new()),
            Arc::new(InMemorySink::new()),
        );
        let health = HealthCheck::new();

        let report = run_once(&orchestrator, &health).await;

        assert_eq!(report.source, DataSource::Fallback);
        assert!(health.is_ready());
    }

    #[tokio::test]
    async fn test_first_cycle_runs_immediately() {
        let runner = Arc::new(StaticCommandRunner::new());
        let orchestrator = SourceOrchestrator::new(
            CollectorConfig::default(),
            runner.clone(),
            Arc::new(InMemorySink::new()),
        );
        let health = HealthCheck::new();

        let scheduler = run_periodic(&orchestrator, DEFAULT_RESCAN_INTERVAL, &health);
        let _ = tokio::time::timeout(Duration::from_millis(200), scheduler).await;

        assert!(health.is_ready());
        assert_eq!(health.check_all().cycles, 1);
        assert!(runner.was_called(&CollectorConfig::default().controller_dump_command()));
    }
}
