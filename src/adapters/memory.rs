//! In-Memory Adapters
//!
//! Test doubles for both ports: a sink that records every gauge value and a
//! command runner that replays canned output.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::ports::check_cardinality;
use crate::domain::{CommandRunner, MeasurementSink, Metric};
use crate::error::{Error, Result};

// =============================================================================
// In-Memory Sink
// =============================================================================

type SeriesKey = (Metric, Vec<String>);

/// Records gauge values for later inspection.
#[derive(Debug, Default)]
pub struct InMemorySink {
    series: RwLock<BTreeMap<SeriesKey, f64>>,
    resets: AtomicUsize,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of one series.
    pub fn get(&self, metric: Metric, labels: &[&str]) -> Option<f64> {
        let key = (metric, labels.iter().map(|l| l.to_string()).collect());
        self.series.read().get(&key).copied()
    }

    /// Get every series of a metric, ordered by label values.
    pub fn series(&self, metric: Metric) -> Vec<(Vec<String>, f64)> {
        self.series
            .read()
            .iter()
            .filter(|((m, _), _)| *m == metric)
            .map(|((_, labels), value)| (labels.clone(), *value))
            .collect()
    }

    /// Count the series of a metric.
    pub fn count(&self, metric: Metric) -> usize {
        self.series.read().keys().filter(|(m, _)| *m == metric).count()
    }

    /// Total number of series.
    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    /// Check if no series are recorded.
    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// How many times the sink has been reset.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }
}

impl MeasurementSink for InMemorySink {
    fn reset(&self) {
        self.series.write().clear();
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn set(&self, metric: Metric, labels: &[&str], value: f64) -> Result<()> {
        check_cardinality(metric, labels)?;
        let key = (metric, labels.iter().map(|l| l.to_string()).collect());
        self.series.write().insert(key, value);
        Ok(())
    }
}

// =============================================================================
// Static Command Runner
// =============================================================================

#[derive(Debug, Clone)]
enum CannedResponse {
    Output(String),
    Failure(String),
    Timeout(String),
}

/// Replays canned responses keyed by exact command line.
///
/// Commands without a response fail as if the tool were not installed.
#[derive(Debug, Default)]
pub struct StaticCommandRunner {
    responses: HashMap<String, CannedResponse>,
    calls: RwLock<Vec<String>>,
}

impl StaticCommandRunner {
    /// Create a runner with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `command` with `output`.
    pub fn with_output(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses
            .insert(command.into(), CannedResponse::Output(output.into()));
        self
    }

    /// Fail `command` with `reason`.
    pub fn with_failure(mut self, command: impl Into<String>, reason: impl Into<String>) -> Self {
        self.responses
            .insert(command.into(), CannedResponse::Failure(reason.into()));
        self
    }

    /// Time `command` out with the given partial stderr.
    pub fn with_timeout(mut self, command: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.responses
            .insert(command.into(), CannedResponse::Timeout(stderr.into()));
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    /// Check if `command` has been run.
    pub fn was_called(&self, command: &str) -> bool {
        self.calls.read().iter().any(|c| c == command)
    }
}

#[async_trait]
impl CommandRunner for StaticCommandRunner {
    async fn run(&self, command: &str) -> Result<String> {
        self.calls.write().push(command.to_string());

        match self.responses.get(command) {
            Some(CannedResponse::Output(output)) => Ok(output.clone()),
            Some(CannedResponse::Failure(reason)) => Err(Error::CommandFailed {
                command: command.to_string(),
                reason: reason.clone(),
            }),
            Some(CannedResponse::Timeout(stderr)) => Err(Error::CommandTimeout {
                command: command.to_string(),
                timeout_secs: 30,
                stderr: stderr.clone(),
            }),
            None => Err(Error::CommandFailed {
                command: command.to_string(),
                reason: "exit status: 127: command not found".to_string(),
            }),
        }
    }
}
