use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::MonitorConfig;
use crate::deviation::{is_on_target, AxisDeviation};
use crate::error::{MResult, MonitorError};
use crate::log_book::LogBook;
use crate::position::{PositionInputs, PresentPosition};
use crate::report::ExportedReport;
use crate::smoothing::AttitudeSmoother;
use crate::telemetry::{parse_frame, TelemetryFrame};
use crate::types::{AttitudeSample, ConnectionState, LogEntry, PositionFix, Target};

/// Monitor shared between the socket task and the dashboard handlers.
/// Every mutation runs to completion under the write lock.
pub type SharedMonitor = Arc<RwLock<PointingMonitor>>;

/// Outcome of one inbound text frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Applied { imu: bool, gnss: bool },
    Rejected,
}

/// Acknowledgement returned to the operator after SET
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAck {
    pub target: Target,
    /// Target was taken while disconnected or before any attitude arrived
    pub stale: bool,
    pub report: ExportedReport,
}

/// Per-axis deviation of the smoothed attitude from the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    /// Y-axis bar
    pub pitch: AxisDeviation,
    /// X-axis bar
    pub roll: AxisDeviation,
    pub on_target: bool,
}

/// Session state of the pointing aid
pub struct PointingMonitor {
    config: MonitorConfig,
    smoother: AttitudeSmoother,
    position: PositionFix,
    target: Target,
    connection: ConnectionState,
    log: LogBook,
    on_target: bool,
    frames_received: u64,
    frames_rejected: u64,
    attitude_frames: u64,
    gnss_frames: u64,
    last_imu_at: Option<DateTime<Local>>,
    last_gnss_at: Option<DateTime<Local>>,
    target_set_at: Option<DateTime<Local>>,
    started_at: DateTime<Local>,
}

impl PointingMonitor {
    pub fn new(config: MonitorConfig) -> MResult<Self> {
        config.validate()?;
        Ok(PointingMonitor {
            smoother: AttitudeSmoother::new(config.smoothing),
            position: PositionFix::default(),
            target: Target::default(),
            connection: ConnectionState::Disconnected,
            log: LogBook::new(config.log_capacity, config.log_cadence),
            on_target: false,
            frames_received: 0,
            frames_rejected: 0,
            attitude_frames: 0,
            gnss_frames: 0,
            last_imu_at: None,
            last_gnss_at: None,
            target_set_at: None,
            started_at: Local::now(),
            config,
        })
    }

    pub fn shared(self) -> SharedMonitor {
        Arc::new(RwLock::new(self))
    }

    pub fn on_open(&mut self) {
        if !self.connection.is_connected() {
            info!("Telemetry stream connected ({})", self.config.endpoint);
        }
        self.connection = ConnectionState::Connected;
    }

    pub fn on_close(&mut self) {
        if self.connection.is_connected() {
            info!("Telemetry stream closed");
        }
        self.connection = ConnectionState::Disconnected;
    }

    pub fn on_error(&mut self, err: &MonitorError) {
        warn!("Telemetry stream error: {}", err);
        self.connection = ConnectionState::Disconnected;
    }

    pub fn handle_message(&mut self, text: &str) -> FrameOutcome {
        self.handle_message_at(text, Local::now())
    }

    /// Parse and apply one text frame. A frame that does not parse is
    /// counted and dropped; state is left exactly as it was.
    pub fn handle_message_at(&mut self, text: &str, now: DateTime<Local>) -> FrameOutcome {
        self.frames_received += 1;
        match parse_frame(text) {
            Ok(frame) => self.apply_frame(&frame, now),
            Err(e) => {
                self.frames_rejected += 1;
                warn!("Dropping telemetry frame: {}", e);
                FrameOutcome::Rejected
            }
        }
    }

    pub fn apply_frame(&mut self, frame: &TelemetryFrame, now: DateTime<Local>) -> FrameOutcome {
        if let Some(sample) = frame.imu.as_ref() {
            let smoothed = self.smoother.apply(sample);
            self.attitude_frames += 1;
            self.last_imu_at = Some(now);
            if self.log.observe(&smoothed, now) {
                debug!("Logged attitude ({} entries)", self.log.len());
            }
            self.track_on_target();
        }

        if let Some(fix) = frame.gnss {
            self.position = fix;
            self.gnss_frames += 1;
            self.last_gnss_at = Some(now);
        }

        FrameOutcome::Applied {
            imu: frame.imu.is_some(),
            gnss: frame.gnss.is_some(),
        }
    }

    fn track_on_target(&mut self) {
        let reached = self.deviation().on_target;
        if reached && !self.on_target {
            info!("Target reached. Waiting for SET...");
        }
        self.on_target = reached;
    }

    pub fn set_target(&mut self) -> TargetAck {
        self.set_target_at(Local::now())
    }

    /// Snapshot the smoothed attitude as the new target and export a report
    pub fn set_target_at(&mut self, now: DateTime<Local>) -> TargetAck {
        let stale = !self.connection.is_connected() || self.attitude_frames == 0;
        self.target = Target::from_attitude(&self.attitude());
        self.target_set_at = Some(now);
        self.on_target = self.deviation().on_target;

        if stale {
            warn!(
                "Target set from stale attitude (connection: {}, attitude frames: {})",
                self.connection.label(),
                self.attitude_frames
            );
        }
        info!(
            "Target set to pitch {:.2}°, roll {:.2}°",
            self.target.pitch, self.target.roll
        );

        TargetAck {
            target: self.target,
            stale,
            report: self.export_report_at(now),
        }
    }

    pub fn export_report(&self) -> ExportedReport {
        self.export_report_at(Local::now())
    }

    pub fn export_report_at(&self, now: DateTime<Local>) -> ExportedReport {
        ExportedReport::build(&self.attitude(), &self.position, &self.target, now)
    }

    pub fn deviation(&self) -> Deviation {
        let attitude = self.attitude();
        let max = self.config.max_deviation;
        let pitch = AxisDeviation::compute(attitude.pitch, self.target.pitch, max);
        let roll = AxisDeviation::compute(attitude.roll, self.target.roll, max);
        Deviation {
            on_target: is_on_target(&pitch, &roll),
            pitch,
            roll,
        }
    }

    pub fn present_position(&self, now: DateTime<Local>) -> PresentPosition {
        PresentPosition::evaluate(
            &PositionInputs {
                fix: self.position,
                last_gnss_at: self.last_gnss_at,
                last_imu_at: self.last_imu_at,
                target_set_at: self.target_set_at,
            },
            now,
        )
    }

    /// Smoothed attitude
    pub fn attitude(&self) -> AttitudeSample {
        self.smoother.current()
    }

    pub fn position(&self) -> PositionFix {
        self.position
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    pub fn attitude_frames(&self) -> u64 {
        self.attitude_frames
    }

    pub fn gnss_frames(&self) -> u64 {
        self.gnss_frames
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}
