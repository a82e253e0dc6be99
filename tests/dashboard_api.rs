use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use pointing_monitor_rs::dashboard::{self, AppState, ReconnectAck};
use pointing_monitor_rs::smoothing::SmoothingPolicy;
use pointing_monitor_rs::{
    LogEntry, MonitorConfig, PointingMonitor, SharedMonitor, TargetAck, TelemetryReceiver,
};

fn raw_config() -> MonitorConfig {
    MonitorConfig {
        smoothing: SmoothingPolicy::Raw,
        ..MonitorConfig::default()
    }
}

fn app(config: MonitorConfig, export_dir: Option<std::path::PathBuf>) -> (Router, SharedMonitor) {
    let monitor = PointingMonitor::new(config).unwrap().shared();
    // Nothing listens on the discard port; the receiver is never started here
    let receiver = TelemetryReceiver::new("ws://127.0.0.1:9", monitor.clone());
    let state = AppState::new(monitor.clone(), receiver).with_export_dir(export_dir);
    (dashboard::router(state), monitor)
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_index_pages_are_served() {
    let (app, _) = app(MonitorConfig::default(), None);

    let (status, _, body) = call(&app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Artillery Pointing System"));

    let (status, _, body) = call(&app, "GET", "/position").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Present Position"));
}

#[tokio::test]
async fn test_snapshot_starts_disconnected() {
    let (app, _) = app(MonitorConfig::default(), None);
    let (status, _, body) = call(&app, "GET", "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["connection"], "disconnected");
    assert_eq!(json["target"]["pitch"], 0.0);
    assert_eq!(json["deviation"]["roll"]["severity"], "good");
}

#[tokio::test]
async fn test_set_target_returns_report() {
    let (app, monitor) = app(raw_config(), None);
    {
        let mut m = monitor.write().await;
        m.on_open();
        m.handle_message(r#"{"imu":{"pitch":3.2,"roll":-1.1,"yaw":0},"gnss":{"latitude":28.6139,"longitude":77.209}}"#);
    }

    let (status, _, body) = call(&app, "POST", "/api/target").await;
    assert_eq!(status, StatusCode::OK);

    let ack: TargetAck = serde_json::from_slice(&body).unwrap();
    assert!(!ack.stale);
    assert_eq!(ack.target.pitch, 3.2);
    assert_eq!(ack.target.roll, -1.1);
    assert!(ack.report.filename.starts_with("PostureData_"));
    assert!(ack.report.filename.ends_with(".txt"));
    assert!(ack.report.body.contains("  Pitch Target: 3.20°"));
    assert!(ack.report.body.contains("  Roll Target : -1.10°"));
    assert!(ack.report.body.contains("  Altitude : -- m"));
    assert_eq!(monitor.read().await.target(), ack.target);
}

#[tokio::test]
async fn test_set_target_while_disconnected_is_flagged() {
    let (app, _) = app(MonitorConfig::default(), None);
    let (_, _, body) = call(&app, "POST", "/api/target").await;
    let ack: TargetAck = serde_json::from_slice(&body).unwrap();
    assert!(ack.stale);
}

#[tokio::test]
async fn test_set_target_writes_export_dir() {
    let dir = std::env::temp_dir().join(format!("pointing_export_{}", std::process::id()));
    let (app, _) = app(MonitorConfig::default(), Some(dir.clone()));

    let (_, _, body) = call(&app, "POST", "/api/target").await;
    let ack: TargetAck = serde_json::from_slice(&body).unwrap();

    let written = std::fs::read_to_string(dir.join(&ack.report.filename)).unwrap();
    assert_eq!(written, ack.report.body);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_report_download_headers() {
    let (app, monitor) = app(MonitorConfig::default(), None);
    let (status, headers, body) = call(&app, "GET", "/api/report").await;
    assert_eq!(status, StatusCode::OK);

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"PostureData_"));
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));

    let body = String::from_utf8(body).unwrap();
    assert!(body.starts_with("==== Artillery Pointing Log ===="));
    // Export never moves the target
    assert_eq!(monitor.read().await.target().pitch, 0.0);
}

#[tokio::test]
async fn test_log_endpoint_lists_entries() {
    let config = MonitorConfig {
        log_cadence: pointing_monitor_rs::log_book::LogCadence::EveryNth(2),
        ..raw_config()
    };
    let (app, monitor) = app(config, None);
    {
        let mut m = monitor.write().await;
        for pitch in 1..=6 {
            m.handle_message(&format!(r#"{{"imu":{{"pitch":{},"roll":0,"yaw":0}}}}"#, pitch));
        }
    }

    let (status, _, body) = call(&app, "GET", "/api/log").await;
    assert_eq!(status, StatusCode::OK);
    let entries: Vec<LogEntry> = serde_json::from_slice(&body).unwrap();
    let pitches: Vec<&str> = entries.iter().map(|e| e.pitch.as_str()).collect();
    assert_eq!(pitches, vec!["2.00", "4.00", "6.00"]);
}

#[tokio::test]
async fn test_reconnect_starts_attempt() {
    let (app, _) = app(MonitorConfig::default(), None);
    let (status, _, body) = call(&app, "POST", "/api/reconnect").await;
    assert_eq!(status, StatusCode::OK);
    let ack: ReconnectAck = serde_json::from_slice(&body).unwrap();
    assert!(ack.started);
}
