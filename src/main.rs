use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use pointing_monitor_rs::config::{MonitorConfig, DEFAULT_ENDPOINT};
use pointing_monitor_rs::dashboard::{self, AppState};
use pointing_monitor_rs::log_book::{LogCadence, DEFAULT_LOG_CAPACITY, DEFAULT_LOG_EVERY};
use pointing_monitor_rs::smoothing::{SmoothingPolicy, DEFAULT_ALPHA};
use pointing_monitor_rs::{PointingMonitor, TelemetryReceiver};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SmoothingMode {
    Exponential,
    Raw,
}

#[derive(Parser, Debug)]
#[command(name = "pointing_monitor")]
#[command(about = "Artillery pointing aid - live IMU/GNSS dashboard with target deviation bars", long_about = None)]
struct Args {
    /// Telemetry WebSocket endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Dashboard bind address
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Dashboard port
    #[arg(long, default_value = "8081")]
    port: u16,

    /// Attitude smoothing (exponential, raw)
    #[arg(long, value_enum, default_value = "exponential")]
    smoothing: SmoothingMode,

    /// Exponential smoothing gain, (0, 1]
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Full-scale deviation of the bars in degrees
    #[arg(long, default_value = "3.0")]
    max_deviation: f64,

    /// Log one entry every N attitude frames
    #[arg(long, default_value_t = DEFAULT_LOG_EVERY, value_parser = clap::value_parser!(u32).range(1..))]
    log_every: u32,

    /// Log at most one entry per interval instead of every N frames
    #[arg(long, conflicts_with = "log_every")]
    log_interval_ms: Option<u64>,

    /// Entries kept in the rolling log
    #[arg(long, default_value_t = DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,

    /// Also write every exported report into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Dashboard refresh interval
    #[arg(long, default_value = "50")]
    push_interval_ms: u64,
}

impl Args {
    fn monitor_config(&self) -> Result<MonitorConfig> {
        let smoothing = match self.smoothing {
            SmoothingMode::Raw => SmoothingPolicy::Raw,
            SmoothingMode::Exponential => SmoothingPolicy::exponential(self.alpha)?,
        };
        let log_cadence = match self.log_interval_ms {
            Some(ms) => LogCadence::Interval(chrono::Duration::milliseconds(ms as i64)),
            None => LogCadence::EveryNth(self.log_every),
        };
        Ok(MonitorConfig {
            endpoint: self.endpoint.clone(),
            smoothing,
            max_deviation: self.max_deviation,
            log_capacity: self.log_capacity,
            log_cadence,
            export_dir: self.export_dir.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = args.monitor_config()?;
    info!("Pointing monitor starting");
    info!("  Endpoint: {}", config.endpoint);
    info!("  Smoothing: {:?}", config.smoothing);
    info!("  Max deviation: {:.1}°", config.max_deviation);
    info!("  Log cadence: {:?} (capacity {})", config.log_cadence, config.log_capacity);
    if let Some(dir) = config.export_dir.as_ref() {
        info!("  Export dir: {}", dir.display());
    }

    let export_dir = config.export_dir.clone();
    let endpoint = config.endpoint.clone();
    let monitor = PointingMonitor::new(config)
        .context("invalid monitor configuration")?
        .shared();

    let mut receiver = TelemetryReceiver::new(endpoint, monitor.clone());
    receiver.start();

    let state = AppState::new(monitor, receiver)
        .with_export_dir(export_dir)
        .with_push_interval(Duration::from_millis(args.push_interval_ms.max(1)));
    let receiver = state.receiver.clone();

    let addr = SocketAddr::new(args.bind, args.port);
    dashboard::start_dashboard(state, addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await
    .with_context(|| format!("dashboard failed on {}", addr))?;

    // Release the telemetry socket before exit
    receiver.lock().await.shutdown().await;
    info!("Pointing monitor stopped");

    Ok(())
}
