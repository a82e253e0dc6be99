use serde::{Deserialize, Serialize};

/// Full-scale deviation in degrees
pub const DEFAULT_MAX_DEVIATION_DEG: f64 = 3.0;

/// Below this |percent| the axis is in tolerance
pub const GOOD_THRESHOLD_PCT: f64 = 10.0;
/// Below this |percent| the axis is drifting
pub const WARNING_THRESHOLD_PCT: f64 = 30.0;

/// Both axes within this many degrees of target counts as "on target"
pub const ON_TARGET_TOLERANCE_DEG: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Bad,
}

impl Severity {
    /// Classify a display percentage. Only the magnitude matters.
    pub fn classify(percent: f64) -> Self {
        let magnitude = percent.abs();
        if magnitude < GOOD_THRESHOLD_PCT {
            Severity::Good
        } else if magnitude < WARNING_THRESHOLD_PCT {
            Severity::Warning
        } else {
            Severity::Bad
        }
    }
}

/// Fill segment of a deflection bar, in percent of the track length.
/// Anchored at the 50% mark; a saturated bar reaches exactly one end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarFill {
    pub start: f64,
    pub length: f64,
}

impl BarFill {
    pub fn from_percent(percent: f64) -> Self {
        let length = percent.clamp(-100.0, 100.0).abs() / 2.0;
        let start = if percent >= 0.0 { 50.0 } else { 50.0 - length };
        BarFill { start, length }
    }
}

/// Deviation of one axis from its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDeviation {
    pub actual: f64,
    pub target: f64,
    pub error: f64,
    pub percent: f64,
    pub severity: Severity,
    pub bar: BarFill,
}

impl AxisDeviation {
    pub fn compute(actual: f64, target: f64, max_deviation: f64) -> Self {
        let error = actual - target;
        let percent = deviation_percent(error, max_deviation);
        AxisDeviation {
            actual,
            target,
            error,
            percent,
            severity: Severity::classify(percent),
            bar: BarFill::from_percent(percent),
        }
    }
}

/// `clamp(error / max_deviation * 100, -100, 100)`. An undefined error
/// saturates so it can never read as in tolerance.
pub fn deviation_percent(error: f64, max_deviation: f64) -> f64 {
    let percent = error / max_deviation * 100.0;
    if percent.is_nan() {
        return 100.0;
    }
    percent.clamp(-100.0, 100.0)
}

/// True when both axis errors are inside the on-target tolerance
pub fn is_on_target(pitch: &AxisDeviation, roll: &AxisDeviation) -> bool {
    pitch.error.abs() < ON_TARGET_TOLERANCE_DEG && roll.error.abs() < ON_TARGET_TOLERANCE_DEG
}
