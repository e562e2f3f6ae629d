//! Prometheus Sink Adapter
//!
//! Implements the `MeasurementSink` port with one `GaugeVec` per metric in a
//! private registry, so the `/metrics` endpoint exposes only exporter series.

use std::collections::HashMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::domain::ports::check_cardinality;
use crate::domain::{MeasurementSink, Metric, NAMESPACE};
use crate::error::{Error, Result};

/// Gauge registry for every exported metric.
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<Metric, GaugeVec>,
}

impl PrometheusSink {
    /// Register a gauge family for each metric.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(Metric::ALL.len());

        for metric in Metric::ALL {
            let opts = Opts::new(metric.name(), metric.help()).namespace(NAMESPACE);
            let gauge = GaugeVec::new(opts, metric.label_names())?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(metric, gauge);
        }

        debug!(metrics = gauges.len(), "Registered gauge families");
        Ok(Self { registry, gauges })
    }

    /// Get the underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every series in the text exposition format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    /// Render every series as a string.
    pub fn encode_to_string(&self) -> Result<String> {
        String::from_utf8(self.encode()?)
            .map_err(|e| Error::Internal(format!("Exposition is not UTF-8: {}", e)))
    }

    fn gauge(&self, metric: Metric) -> Result<&GaugeVec> {
        self.gauges
            .get(&metric)
            .ok_or_else(|| Error::Internal(format!("Gauge {} is not registered", metric)))
    }
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink")
            .field("gauge_count", &self.gauges.len())
            .finish()
    }
}

impl MeasurementSink for PrometheusSink {
    fn reset(&self) {
        for gauge in self.gauges.values() {
            gauge.reset();
        }
    }

    fn set(&self, metric: Metric, labels: &[&str], value: f64) -> Result<()> {
        check_cardinality(metric, labels)?;
        self.gauge(metric)?
            .get_metric_with_label_values(labels)?
            .set(value);
        Ok(())
    }
}
