//! Health Checks
//!
//! Readiness state and routing for the health endpoints. The process is live
//! while it can answer at all; it is ready once its first collection cycle
//! has completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use hyper::StatusCode;
use parking_lot::RwLock;
use serde::Serialize;

use crate::collector::CollectionReport;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Service is unhealthy
    Unhealthy,
}

impl HealthStatus {
    fn from_flag(ok: bool) -> Self {
        if ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Check if status is healthy
    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Body of the readiness endpoint
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub cycles: u64,
    /// Most recent collection cycle
    pub last_collection: Option<CollectionReport>,
}

/// Health check manager
#[derive(Debug)]
pub struct HealthCheck {
    start_time: Instant,
    ready: AtomicBool,
    cycles: RwLock<u64>,
    last_collection: RwLock<Option<CollectionReport>>,
}

impl HealthCheck {
    /// Create a new health check manager
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ready: AtomicBool::new(false),
            cycles: RwLock::new(0),
            last_collection: RwLock::new(None),
        }
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check readiness
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Record a completed cycle and mark the service ready.
    pub fn record_cycle(&self, report: &CollectionReport) {
        *self.cycles.write() += 1;
        *self.last_collection.write() = Some(report.clone());
        self.ready.store(true, Ordering::Relaxed);
    }

    /// Get readiness status
    pub fn readiness(&self) -> HealthStatus {
        HealthStatus::from_flag(self.is_ready())
    }

    /// Build the readiness response
    pub fn check_all(&self) -> HealthResponse {
        HealthResponse {
            status: self.readiness(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime().as_secs(),
            cycles: *self.cycles.read(),
            last_collection: self.last_collection.read().clone(),
        }
    }

    /// Status and body for a request to the health server.
    pub fn route(&self, path: &str) -> (StatusCode, Vec<u8>) {
        match path {
            "/healthz" | "/livez" => (StatusCode::OK, b"ok".to_vec()),
            "/readyz" => {
                let status = if self.is_ready() {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                let body = serde_json::to_vec(&self.check_all())
                    .unwrap_or_else(|_| self.readiness().to_string().into_bytes());
                (status, body)
            }
            _ => (StatusCode::NOT_FOUND, b"not found".to_vec()),
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
