use futures::StreamExt;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};

use crate::error::MonitorError;
use crate::monitor::SharedMonitor;

/// How a connected stream came to an end
#[derive(Debug)]
enum StreamEnd {
    Shutdown,
    RemoteClosed,
    Error(MonitorError),
}

/// Owns the single telemetry connection task.
///
/// `start` spawns one connection attempt. The socket is closed exactly once
/// when that task ends, whether through `shutdown`, a remote close or a read
/// error. There is no automatic reconnection; a new attempt only happens when
/// the operator calls `start` again after the previous task has finished.
pub struct TelemetryReceiver {
    endpoint: String,
    monitor: SharedMonitor,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    attempts: u32,
}

impl TelemetryReceiver {
    /// Idle until `start` is called
    pub fn new(endpoint: impl Into<String>, monitor: SharedMonitor) -> Self {
        TelemetryReceiver {
            endpoint: endpoint.into(),
            monitor,
            shutdown: None,
            task: None,
            attempts: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Connection attempts started this session
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Spawn a connection attempt unless one is still alive.
    /// Returns true when a new attempt was started.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let (tx, rx) = oneshot::channel();
        self.shutdown = Some(tx);
        self.attempts += 1;
        self.task = Some(tokio::spawn(run_connection(
            self.endpoint.clone(),
            self.monitor.clone(),
            rx,
        )));
        true
    }

    /// Signal the connection task to close and wait for it
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Telemetry task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TelemetryReceiver {
    fn drop(&mut self) {
        // The task owns the socket and closes it on its way out
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn run_connection(
    endpoint: String,
    monitor: SharedMonitor,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("Connecting to telemetry stream at {}", endpoint);

    let connected = tokio::select! {
        result = connect_async(endpoint.as_str()) => result,
        _ = &mut shutdown => {
            debug!("Shutdown requested before telemetry connection was established");
            return;
        }
    };

    let mut stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            monitor.write().await.on_error(&MonitorError::from(e));
            return;
        }
    };

    monitor.write().await.on_open();
    let end = pump_messages(&mut stream, &monitor, &mut shutdown).await;

    // Single release point for the socket
    if let Err(e) = stream.close(None).await {
        debug!("Close handshake incomplete: {}", e);
    }

    let mut guard = monitor.write().await;
    match end {
        StreamEnd::Error(err) => guard.on_error(&err),
        StreamEnd::Shutdown | StreamEnd::RemoteClosed => guard.on_close(),
    }
}

async fn pump_messages<S>(
    stream: &mut WebSocketStream<S>,
    monitor: &SharedMonitor,
    shutdown: &mut oneshot::Receiver<()>,
) -> StreamEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = &mut *shutdown => return StreamEnd::Shutdown,
            next = stream.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    monitor.write().await.handle_message(&text);
                }
                Some(Ok(Message::Binary(bytes))) => {
                    debug!("Ignoring {} byte binary frame", bytes.len());
                }
                Some(Ok(Message::Close(_))) | None => return StreamEnd::RemoteClosed,
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => return StreamEnd::Error(MonitorError::from(e)),
            },
        }
    }
}
