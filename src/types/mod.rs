use serde::{Deserialize, Serialize};

/// Placeholder rendered wherever an optional reading is missing
pub const MISSING_PLACEHOLDER: &str = "--";

/// IMU attitude in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttitudeSample {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl AttitudeSample {
    pub fn new(pitch: f64, roll: f64, yaw: f64) -> Self {
        Self { pitch, roll, yaw }
    }
}

/// GNSS fix. Any field may be absent on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>, // meters
}

impl PositionFix {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, altitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

impl Default for PositionFix {
    // Session starts at the origin, same as a fresh screen
    fn default() -> Self {
        Self {
            latitude: Some(0.0),
            longitude: Some(0.0),
            altitude: Some(0.0),
        }
    }
}

/// Operator reference orientation. Yaw is deliberately unconstrained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pitch: f64,
    pub roll: f64,
}

impl Target {
    pub fn from_attitude(attitude: &AttitudeSample) -> Self {
        Self {
            pitch: attitude.pitch,
            roll: attitude.roll,
        }
    }
}

/// One row of the rolling attitude log, pre-formatted for display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub pitch: String,
    pub roll: String,
    pub yaw: String,
}

impl LogEntry {
    pub fn new(time: String, attitude: &AttitudeSample) -> Self {
        Self {
            time,
            pitch: format!("{:.2}", attitude.pitch),
            roll: format!("{:.2}", attitude.roll),
            yaw: format!("{:.2}", attitude.yaw),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        }
    }
}

/// Fixed-point rendering with a placeholder for missing values
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => MISSING_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_two_decimals() {
        let entry = LogEntry::new("12:00:00".to_string(), &AttitudeSample::new(1.005, -2.0, 359.999));
        assert_eq!(entry.roll, "-2.00");
        assert_eq!(entry.yaw, "360.00");
    }

    #[test]
    fn test_format_optional_placeholder() {
        assert_eq!(format_optional(None, 2), "--");
        assert_eq!(format_optional(Some(28.61391234), 6), "28.613912");
    }

    #[test]
    fn test_target_ignores_yaw() {
        let target = Target::from_attitude(&AttitudeSample::new(3.2, -1.1, 90.0));
        assert_eq!(target, Target { pitch: 3.2, roll: -1.1 });
    }

    #[test]
    fn test_connection_defaults_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert!(!ConnectionState::default().is_connected());
    }
}
