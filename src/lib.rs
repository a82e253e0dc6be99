// Artillery pointing aid: live IMU/GNSS telemetry, smoothed attitude,
// deviation from an operator target, and the operator dashboard.

pub mod config;
pub mod dashboard;
pub mod deviation;
pub mod error;
pub mod live_status;
pub mod log_book;
pub mod monitor;
pub mod position;
pub mod receiver;
pub mod report;
pub mod simulator;
pub mod smoothing;
pub mod telemetry;
pub mod types;

pub use config::MonitorConfig;
pub use error::{MResult, MonitorError};
pub use monitor::{PointingMonitor, SharedMonitor, TargetAck};
pub use receiver::TelemetryReceiver;
pub use types::{AttitudeSample, ConnectionState, LogEntry, PositionFix, Target};
