use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tower_http::cors::CorsLayer;

use crate::live_status::LiveStatus;
use crate::monitor::{SharedMonitor, TargetAck};
use crate::receiver::TelemetryReceiver;
use crate::types::LogEntry;

/// Browser refresh cadence (20 Hz)
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone)]
pub struct AppState {
    pub monitor: SharedMonitor,
    pub receiver: Arc<Mutex<TelemetryReceiver>>,
    pub export_dir: Option<PathBuf>,
    pub push_interval: Duration,
}

impl AppState {
    pub fn new(monitor: SharedMonitor, receiver: TelemetryReceiver) -> Self {
        AppState {
            monitor,
            receiver: Arc::new(Mutex::new(receiver)),
            export_dir: None,
            push_interval: DEFAULT_PUSH_INTERVAL,
        }
    }

    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn with_push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = interval;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectAck {
    pub started: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/position", get(position_handler))
        .route("/ws", get(ws_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/target", post(set_target_handler))
        .route("/api/report", get(report_handler))
        .route("/api/log", get(log_handler))
        .route("/api/reconnect", post(reconnect_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_dashboard<F>(state: AppState, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("dashboard_static.html"))
}

async fn position_handler() -> Html<&'static str> {
    Html(include_str!("position_static.html"))
}

async fn snapshot_handler(State(state): State<AppState>) -> Json<LiveStatus> {
    let monitor = state.monitor.read().await;
    Json(LiveStatus::capture(&monitor, Local::now()))
}

async fn set_target_handler(State(state): State<AppState>) -> Json<TargetAck> {
    let ack = state.monitor.write().await.set_target();

    // The browser gets the report either way; the disk copy is best effort
    if let Some(dir) = state.export_dir.as_ref() {
        match ack.report.save(dir) {
            Ok(path) => info!("Report written to {}", path.display()),
            Err(e) => warn!("Could not write report to {}: {}", dir.display(), e),
        }
    }
    Json(ack)
}

async fn report_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.monitor.read().await.export_report();
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.body,
    )
}

async fn log_handler(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.monitor.read().await.log_entries())
}

async fn reconnect_handler(State(state): State<AppState>) -> Json<ReconnectAck> {
    let mut receiver = state.receiver.lock().await;
    let started = receiver.start();
    if started {
        info!(
            "Operator requested reconnect to {} (attempt {})",
            receiver.endpoint(),
            receiver.attempts()
        );
    } else {
        info!("Reconnect ignored: telemetry connection still active");
    }
    Json(ReconnectAck { started })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    loop {
        let status = {
            let monitor = state.monitor.read().await;
            LiveStatus::capture(&monitor, Local::now())
        };

        let json = match serde_json::to_string(&status) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode dashboard status: {}", e);
                break;
            }
        };
        if socket.send(Message::Text(json)).await.is_err() {
            // Client disconnected
            break;
        }

        sleep(state.push_interval).await;
    }
}
