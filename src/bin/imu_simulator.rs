use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use pointing_monitor_rs::simulator::{self, SimulatorSettings, DEFAULT_RATE_HZ, DEFAULT_SIMULATOR_PORT};

#[derive(Parser, Debug)]
#[command(name = "imu_simulator")]
#[command(about = "Streams simulated IMU/GNSS frames over WebSocket", long_about = None)]
struct Args {
    /// Address to serve on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to serve on
    #[arg(long, default_value_t = DEFAULT_SIMULATOR_PORT)]
    port: u16,

    /// Frames per second
    #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
    rate_hz: f64,

    /// Disable jitter and GNSS drift
    #[arg(long, default_value_t = false)]
    noiseless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = SimulatorSettings::from_rate_hz(args.rate_hz);
    settings.noisy = !args.noiseless;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        "IMU simulator starting on ws://{} ({:.0} Hz)",
        listener.local_addr()?,
        1.0 / settings.period.as_secs_f64()
    );

    axum::serve(listener, simulator::router(settings)).await?;
    Ok(())
}
