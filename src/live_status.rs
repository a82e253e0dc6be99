use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::monitor::{Deviation, PointingMonitor};
use crate::position::PresentPosition;
use crate::smoothing::SmoothingPolicy;
use crate::types::{AttitudeSample, ConnectionState, PositionFix, Target};

/// Everything the dashboard renders, pushed to browsers as JSON
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    pub connection: ConnectionState,
    pub endpoint: String,
    // Smoothed IMU
    pub attitude: AttitudeSample,
    pub position: PositionFix,
    pub target: Target,
    // Deflection bars
    pub deviation: Deviation,
    pub max_deviation: f64,
    pub smoothing: SmoothingPolicy,
    pub present_position: PresentPosition,
    // Counters
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub attitude_frames: u64,
    pub gnss_frames: u64,
    pub log_entries: usize,
}

impl LiveStatus {
    pub fn capture(monitor: &PointingMonitor, now: DateTime<Local>) -> Self {
        let uptime = now
            .signed_duration_since(monitor.started_at())
            .num_seconds()
            .max(0) as u64;

        Self {
            timestamp: current_timestamp(),
            uptime_seconds: uptime,
            connection: monitor.connection(),
            endpoint: monitor.config().endpoint.clone(),
            attitude: monitor.attitude(),
            position: monitor.position(),
            target: monitor.target(),
            deviation: monitor.deviation(),
            max_deviation: monitor.config().max_deviation,
            smoothing: monitor.config().smoothing,
            present_position: monitor.present_position(now),
            frames_received: monitor.frames_received(),
            frames_rejected: monitor.frames_rejected(),
            attitude_frames: monitor.attitude_frames(),
            gnss_frames: monitor.gnss_frames(),
            log_entries: monitor.log_len(),
        }
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    #[test]
    fn test_capture_serializes_for_dashboard() {
        let mut monitor = PointingMonitor::new(MonitorConfig::default()).unwrap();
        monitor.on_open();
        monitor.handle_message(r#"{"imu":{"pitch":30,"roll":0,"yaw":0}}"#);

        let status = LiveStatus::capture(&monitor, Local::now());
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["connection"], "connected");
        assert_eq!(json["deviation"]["pitch"]["severity"], "bad");
        assert_eq!(json["deviation"]["pitch"]["percent"], 100.0);
        assert_eq!(json["smoothing"]["mode"], "exponential");
        assert_eq!(json["present_position"]["fix_type"], "INS");
        assert_eq!(json["attitude_frames"], 1);
    }
}
