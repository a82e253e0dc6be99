use serde_json::Value;

use crate::error::{MResult, MonitorError};
use crate::types::{AttitudeSample, PositionFix};

/// One decoded inbound frame. Either block may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    pub imu: Option<AttitudeSample>,
    pub gnss: Option<PositionFix>,
}

impl TelemetryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imu(mut self, imu: AttitudeSample) -> Self {
        self.imu = Some(imu);
        self
    }

    pub fn with_gnss(mut self, gnss: PositionFix) -> Self {
        self.gnss = Some(gnss);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.imu.is_none() && self.gnss.is_none()
    }
}

/// Decode a text frame of shape `{ imu?: {pitch, roll, yaw}, gnss?: {latitude, longitude, altitude} }`.
///
/// Numeric fields may arrive as JSON numbers or numeric strings. Attitude
/// fields that fail coercion or exceed two full turns become 0; GNSS fields become `None`. Blocks that
/// are missing, `null`, `false`, `0` or `""` are treated as absent. Any other
/// top-level shape is tolerated and yields an empty frame, except a bare
/// `null`, which is rejected like unparsable text.
pub fn parse_frame(text: &str) -> MResult<TelemetryFrame> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_null() {
        return Err(MonitorError::MalformedFrame("frame is null".to_string()));
    }

    let mut frame = TelemetryFrame::new();
    if let Some(block) = value.get("imu").filter(|block| is_present(block)) {
        frame = frame.with_imu(attitude_from_block(block));
    }
    if let Some(block) = value.get("gnss").filter(|block| is_present(block)) {
        frame = frame.with_gnss(position_from_block(block));
    }
    Ok(frame)
}

/// Attitude angles beyond two full turns are treated as failed coercion
pub const MAX_ATTITUDE_DEG: f64 = 720.0;

fn attitude_from_block(block: &Value) -> AttitudeSample {
    let angle = |key: &str| {
        coerce_f64(block.get(key))
            .filter(|v| v.abs() <= MAX_ATTITUDE_DEG)
            .unwrap_or(0.0)
    };
    AttitudeSample {
        pitch: angle("pitch"),
        roll: angle("roll"),
        yaw: angle("yaw"),
    }
}

fn position_from_block(block: &Value) -> PositionFix {
    PositionFix {
        latitude: coerce_f64(block.get("latitude")),
        longitude: coerce_f64(block.get("longitude")),
        altitude: coerce_f64(block.get("altitude")),
    }
}

fn is_present(block: &Value) -> bool {
    match block {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numbers pass through, numeric strings are parsed, everything else fails.
/// Non-finite results count as failures.
fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
