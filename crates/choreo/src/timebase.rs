use serde::{Deserialize, Serialize};

/// Rational frame rate: `frames = seconds * numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    /// A zero denominator is treated as 1.
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator: denominator.max(1),
        }
    }

    pub fn fps(&self) -> f64 {
        self.numerator as f64 / self.denominator.max(1) as f64
    }

    pub fn to_frames(&self, seconds: f64) -> f64 {
        seconds * self.numerator as f64 / self.denominator.max(1) as f64
    }

    pub fn to_seconds(&self, frames: f64) -> f64 {
        if self.numerator == 0 {
            return 0.0;
        }
        frames * self.denominator.max(1) as f64 / self.numerator as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(24, 1)
    }
}
