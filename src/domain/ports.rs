//! Domain Ports
//!
//! The two capabilities the extraction core consumes. Infrastructure adapters
//! implement these traits; the core never spawns processes or touches a
//! registry directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Extraction Core                         │
//! │  SmartAttributeDecoder │ DiscoveryScanner │ TopologyWalker  │
//! └─────────────────────────────────────────────────────────────┘
//!          │ CommandRunner                  │ MeasurementSink
//!          ▼                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ShellCommandRunner │ PrometheusSink │ in-memory doubles    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use super::measurement::Metric;
use crate::error::Result;

// =============================================================================
// Command Port
// =============================================================================

/// Port for running an external tool and capturing its standard output.
///
/// Implementations enforce a bounded wall-clock duration: `run` either returns
/// the output, fails with [`Error::CommandFailed`](crate::Error::CommandFailed),
/// or fails with [`Error::CommandTimeout`](crate::Error::CommandTimeout) after
/// the child has been terminated.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command line and return its standard output.
    async fn run(&self, command: &str) -> Result<String>;
}

// =============================================================================
// Measurement Port
// =============================================================================

/// Port for publishing labeled gauge values.
///
/// The sink is long-lived and written by a single collection cycle at a time.
/// Each cycle calls [`reset`](MeasurementSink::reset) before writing, so label
/// sets from earlier cycles never linger.
pub trait MeasurementSink: Send + Sync {
    /// Drop every label combination of every metric.
    fn reset(&self);

    /// Set a gauge. `labels` are values in the order of
    /// [`Metric::label_names`].
    fn set(&self, metric: Metric, labels: &[&str], value: f64) -> Result<()>;
}

/// Check label values against a metric's schema.
pub(crate) fn check_cardinality(metric: Metric, labels: &[&str]) -> Result<()> {
    let expected = metric.label_names().len();
    if labels.len() != expected {
        return Err(crate::error::Error::LabelCardinality {
            metric: metric.name(),
            expected,
            got: labels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use assert_matches::assert_matches;

    #[test]
    fn test_cardinality_match() {
        assert!(check_cardinality(Metric::DriveTemp, &["0", "Drive /c0/e32/s1"]).is_ok());
    }

    #[test]
    fn test_cardinality_mismatch() {
        let result = check_cardinality(Metric::ControllerInfo, &["0"]);
        assert_matches!(
            result,
            Err(Error::LabelCardinality {
                metric: "controller_info",
                expected: 4,
                got: 1
            })
        );
    }
}
