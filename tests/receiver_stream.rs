use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout, Instant};

use pointing_monitor_rs::simulator::{self, SimulatorSettings};
use pointing_monitor_rs::smoothing::SmoothingPolicy;
use pointing_monitor_rs::{
    ConnectionState, MonitorConfig, PointingMonitor, SharedMonitor, TelemetryReceiver,
};

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn raw_monitor() -> SharedMonitor {
    PointingMonitor::new(MonitorConfig {
        smoothing: SmoothingPolicy::Raw,
        ..MonitorConfig::default()
    })
    .unwrap()
    .shared()
}

async fn wait_for<F>(monitor: &SharedMonitor, what: &str, check: F)
where
    F: Fn(&PointingMonitor) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if check(&*monitor.read().await) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_receiver_follows_simulator() {
    let settings = SimulatorSettings {
        period: Duration::from_millis(5),
        noisy: false,
    };
    let addr = serve(simulator::router(settings)).await;

    let monitor = raw_monitor();
    let mut receiver = TelemetryReceiver::new(format!("ws://{}/", addr), monitor.clone());
    assert!(receiver.start());

    wait_for(&monitor, "simulator frames", |m| m.attitude_frames() >= 3).await;
    {
        let m = monitor.read().await;
        assert_eq!(m.connection(), ConnectionState::Connected);
        assert_eq!(m.position().latitude, Some(28.6139));
        assert_eq!(m.frames_rejected(), 0);
    }

    // A live connection is never duplicated
    assert!(!receiver.start());

    receiver.shutdown().await;
    assert!(!receiver.is_running());
    assert_eq!(monitor.read().await.connection(), ConnectionState::Disconnected);

    // Operator reconnect opens a fresh connection
    assert!(receiver.start());
    wait_for(&monitor, "reconnect", |m| m.connection().is_connected()).await;
    receiver.shutdown().await;
    assert_eq!(receiver.attempts(), 2);
}

async fn one_shot_source(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        let _ = socket.send(Message::Text("not json".to_string())).await;
        let _ = socket
            .send(Message::Text(
                r#"{"imu":{"pitch":1,"roll":2,"yaw":3}}"#.to_string(),
            ))
            .await;
        let _ = socket.send(Message::Close(None)).await;
    })
}

#[tokio::test]
async fn test_remote_close_marks_disconnected() {
    let addr = serve(Router::new().route("/", get(one_shot_source))).await;

    let monitor = raw_monitor();
    let mut receiver = TelemetryReceiver::new(format!("ws://{}/", addr), monitor.clone());
    receiver.start();

    wait_for(&monitor, "remote close", |m| {
        m.attitude_frames() == 1 && !m.connection().is_connected()
    })
    .await;

    let m = monitor.read().await;
    assert_eq!(m.frames_rejected(), 1);
    assert_eq!(m.attitude().pitch, 1.0);
    assert_eq!(m.attitude().yaw, 3.0);
    drop(m);

    receiver.shutdown().await;
    assert!(!receiver.is_running());
}

#[tokio::test]
async fn test_shutdown_during_handshake_releases_socket() {
    // Accepts TCP but never answers the WebSocket upgrade
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepted_tx, accepted_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (peer, _) = listener.accept().await.unwrap();
        let _ = accepted_tx.send(peer);
    });

    let monitor = raw_monitor();
    let mut receiver = TelemetryReceiver::new(format!("ws://{}/", addr), monitor.clone());
    assert!(receiver.start());

    let mut peer = timeout(Duration::from_secs(5), accepted_rx)
        .await
        .expect("receiver never dialled")
        .unwrap();

    timeout(Duration::from_secs(2), receiver.shutdown())
        .await
        .expect("shutdown hung on a pending handshake");
    assert!(!receiver.is_running());

    // The abandoned attempt must not hold the socket open
    let mut drained = Vec::new();
    let read = timeout(Duration::from_secs(2), peer.read_to_end(&mut drained))
        .await
        .expect("socket still open after shutdown");
    assert!(read.is_ok());

    let m = monitor.read().await;
    assert_eq!(m.connection(), ConnectionState::Disconnected);
    assert_eq!(m.attitude_frames(), 0);
}

#[tokio::test]
async fn test_drop_before_first_frame_closes_connection() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<&'static str>();
    let silent = Router::new().route(
        "/",
        get(move |ws: WebSocketUpgrade| {
            let seen_tx = seen_tx.clone();
            async move {
                ws.on_upgrade(move |mut socket| async move {
                    // Never sends; reports how the client left
                    let outcome = match socket.recv().await {
                        Some(Ok(Message::Close(_))) => "closed",
                        None => "eof",
                        _ => "other",
                    };
                    let _ = seen_tx.send(outcome);
                })
            }
        }),
    );
    let addr = serve(silent).await;

    let monitor = raw_monitor();
    let mut receiver = TelemetryReceiver::new(format!("ws://{}/", addr), monitor.clone());
    assert!(receiver.start());
    wait_for(&monitor, "connect", |m| m.connection().is_connected()).await;

    drop(receiver);

    let outcome = timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .expect("server never saw the client leave");
    assert_eq!(outcome, Some("closed"));
    wait_for(&monitor, "disconnect after drop", |m| !m.connection().is_connected()).await;
    assert_eq!(monitor.read().await.attitude_frames(), 0);
}
