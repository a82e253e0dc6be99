use std::path::PathBuf;

use crate::deviation::DEFAULT_MAX_DEVIATION_DEG;
use crate::error::{MResult, MonitorError};
use crate::log_book::{LogCadence, DEFAULT_LOG_CAPACITY};
use crate::smoothing::SmoothingPolicy;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:2003";

/// Session parameters for the pointing monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub endpoint: String,
    pub smoothing: SmoothingPolicy,
    pub max_deviation: f64,
    pub log_capacity: usize,
    pub log_cadence: LogCadence,
    /// Exported reports are also written here when set
    pub export_dir: Option<PathBuf>,
}

impl MonitorConfig {
    pub fn validate(&self) -> MResult<()> {
        if !(self.max_deviation.is_finite() && self.max_deviation > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "max deviation must be positive, got {}",
                self.max_deviation
            )));
        }
        if self.log_capacity == 0 {
            return Err(MonitorError::InvalidConfig(
                "log capacity must be at least 1".to_string(),
            ));
        }
        match self.log_cadence {
            LogCadence::EveryNth(0) => Err(MonitorError::InvalidConfig(
                "log cadence must be at least every frame".to_string(),
            )),
            LogCadence::Interval(d) if d <= chrono::Duration::zero() => Err(
                MonitorError::InvalidConfig("log interval must be positive".to_string()),
            ),
            _ => Ok(()),
        }?;
        // Local plain-text stream only; no TLS stack is linked
        if !self.endpoint.starts_with("ws://") {
            return Err(MonitorError::InvalidConfig(format!(
                "endpoint must be a ws:// URL, got {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            smoothing: SmoothingPolicy::default(),
            max_deviation: DEFAULT_MAX_DEVIATION_DEG,
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_cadence: LogCadence::default(),
            export_dir: None,
        }
    }
}
