//! ESXi RAID Exporter
//!
//! Periodically collects RAID controller and SMART telemetry and serves it on
//! a Prometheus `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ESXi RAID Exporter                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │  Scheduler   │───▶│ Orchestrator │───▶│  Prometheus  │       │
//! │  │  (rescan)    │    │  (collect)   │    │    Sink      │       │
//! │  └──────────────┘    └──────────────┘    └──────────────┘       │
//! │                            │                     │               │
//! │                     perccli / esxcli /      GET /metrics         │
//! │                         smartctl                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use esxi_raid_exporter::adapters::{PrometheusSink, ShellCommandRunner, ShellConfig};
use esxi_raid_exporter::collector::{self, CollectorConfig, SourceOrchestrator};
use esxi_raid_exporter::error::{Error, Result};
use esxi_raid_exporter::health::HealthCheck;

// =============================================================================
// CLI Arguments
// =============================================================================

/// ESXi RAID Exporter - RAID controller and SMART metrics for Prometheus
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Metrics server bind address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:10424")]
    listen_addr: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:10425")]
    health_addr: String,

    /// Hours between hardware rescans
    #[arg(long, env = "RESCAN_INTERVAL_HOURS", default_value = "24")]
    rescan_interval_hours: u64,

    /// Per-command timeout in seconds
    #[arg(long, env = "COMMAND_TIMEOUT_SECONDS", default_value = "30")]
    command_timeout_seconds: u64,

    /// Value of the host label on smartctl fallback metrics
    #[arg(long, env = "HOST_LABEL", default_value = "localhost")]
    host_label: String,

    /// Directory containing the perccli binary
    #[arg(long, env = "PERCCLI_DIR", default_value = "/opt/lsi/perccli")]
    perccli_dir: String,

    /// Directory containing the smartctl binary
    #[arg(long, env = "SMARTCTL_DIR", default_value = "/opt/smartmontools")]
    smartctl_dir: String,

    /// Run a single collection, print the exposition and exit
    #[arg(long, env = "COLLECT_ONCE")]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn rescan_interval(&self) -> Result<Duration> {
        if self.rescan_interval_hours == 0 {
            return Err(Error::Config(
                "rescan interval must be at least one hour".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.rescan_interval_hours * 60 * 60))
    }

    fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            host_label: self.host_label.clone(),
            perccli_dir: self.perccli_dir.clone(),
            smartctl_dir: self.smartctl_dir.clone(),
        }
    }

    fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            timeout: Duration::from_secs(self.command_timeout_seconds),
            ..Default::default()
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let rescan_interval = args.rescan_interval()?;

    info!("Starting ESXi RAID Exporter");
    info!("  Metrics address: {}", args.listen_addr);
    info!("  Rescan interval: {} hours", args.rescan_interval_hours);
    info!("  Command timeout: {} seconds", args.command_timeout_seconds);
    info!("  perccli directory: {}", args.perccli_dir);
    info!("  smartctl directory: {}", args.smartctl_dir);

    let sink = Arc::new(PrometheusSink::new()?);
    let runner = Arc::new(ShellCommandRunner::new(args.shell_config()));
    let orchestrator = Arc::new(SourceOrchestrator::new(
        args.collector_config(),
        runner,
        sink.clone(),
    ));
    let health = Arc::new(HealthCheck::new());

    if args.once {
        collector::run_once(&orchestrator, &health).await;
        print!("{}", sink.encode_to_string()?);
        return Ok(());
    }

    let metrics_addr = parse_addr(&args.listen_addr, "metrics")?;
    let health_addr = parse_addr(&args.health_addr, "health")?;

    // Start health server
    let health_state = health.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(health_addr, health_state).await {
            error!("Health server error: {}", e);
        }
    });

    // Start rescan scheduler
    let scheduler_health = health.clone();
    tokio::spawn(async move {
        collector::run_periodic(&orchestrator, rescan_interval, &scheduler_health).await;
    });

    // Serve metrics until the process is stopped
    run_metrics_server(metrics_addr, sink).await?;

    info!("Exporter shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if let Ok(directive) = "hyper=warn".parse() {
        filter = filter.add_directive(directive);
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// HTTP Helpers
// =============================================================================

fn parse_addr(addr: &str, server: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|e| Error::Config(format!("Invalid {} server address '{}': {}", server, addr, e)))
}

fn respond(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

async fn bind(addr: SocketAddr, server: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {} server: {}", server, e)))?;
    info!("{} server listening on {}", server, addr);
    Ok(listener)
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: SocketAddr, health: Arc<HealthCheck>) -> Result<()> {
    fn health_handler(req: Request<hyper::body::Incoming>, health: &HealthCheck) -> Response<Full<Bytes>> {
        let (status, body) = health.route(req.uri().path());
        respond(status, body)
    }

    let listener = bind(addr, "Health").await?;

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("Health server accept error: {}", e)))?;

        let io = TokioIo::new(stream);
        let health = health.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let response = health_handler(req, &health);
                async move { Ok::<_, std::convert::Infallible>(response) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Health server connection error: {}", e);
            }
        });
    }
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: SocketAddr, sink: Arc<PrometheusSink>) -> Result<()> {
    fn metrics_handler(req: Request<hyper::body::Incoming>, sink: &PrometheusSink) -> Response<Full<Bytes>> {
        match req.uri().path() {
            "/metrics" => match sink.encode() {
                Ok(buffer) => {
                    let mut response = respond(StatusCode::OK, buffer);
                    response.headers_mut().insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static(prometheus::TEXT_FORMAT),
                    );
                    response
                }
                Err(e) => {
                    error!("Failed to encode metrics: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics")
                }
            },
            _ => respond(StatusCode::NOT_FOUND, "not found"),
        }
    }

    let listener = bind(addr, "Metrics").await?;

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("Metrics server accept error: {}", e)))?;

        let io = TokioIo::new(stream);
        let sink = sink.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let response = metrics_handler(req, &sink);
                async move { Ok::<_, std::convert::Infallible>(response) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Metrics server connection error: {}", e);
            }
        });
    }
}
