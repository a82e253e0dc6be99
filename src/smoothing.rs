use serde::{Deserialize, Serialize};

use crate::error::{MResult, MonitorError};
use crate::types::AttitudeSample;

/// Default exponential gain for displayed attitude
pub const DEFAULT_ALPHA: f64 = 0.1;

/// How raw IMU samples are folded into the displayed attitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SmoothingPolicy {
    /// Each sample overwrites the displayed value
    Raw,
    /// `v <- v + (s - v) * alpha`
    Exponential { alpha: f64 },
}

impl SmoothingPolicy {
    pub fn exponential(alpha: f64) -> MResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "smoothing gain must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(SmoothingPolicy::Exponential { alpha })
    }

    /// Effective gain; raw pass-through is the alpha = 1 case
    pub fn gain(&self) -> f64 {
        match self {
            SmoothingPolicy::Raw => 1.0,
            SmoothingPolicy::Exponential { alpha } => *alpha,
        }
    }

    pub fn step(&self, previous: f64, sample: f64) -> f64 {
        match self {
            SmoothingPolicy::Raw => sample,
            SmoothingPolicy::Exponential { alpha } => previous + (sample - previous) * alpha,
        }
    }
}

impl Default for SmoothingPolicy {
    fn default() -> Self {
        SmoothingPolicy::Exponential {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Smoothed attitude, applied independently to pitch, roll and yaw
pub struct AttitudeSmoother {
    policy: SmoothingPolicy,
    current: AttitudeSample,
}

impl AttitudeSmoother {
    /// Starts from the zero attitude
    pub fn new(policy: SmoothingPolicy) -> Self {
        AttitudeSmoother {
            policy,
            current: AttitudeSample::default(),
        }
    }

    /// Fold one raw sample in and return the new displayed attitude
    pub fn apply(&mut self, sample: &AttitudeSample) -> AttitudeSample {
        self.current = AttitudeSample {
            pitch: self.policy.step(self.current.pitch, sample.pitch),
            roll: self.policy.step(self.current.roll, sample.roll),
            yaw: self.policy.step(self.current.yaw, sample.yaw),
        };
        self.current
    }

    pub fn current(&self) -> AttitudeSample {
        self.current
    }
}
