//! Ordinal fire-risk labels derived from fire radiative power (FRP).

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// FRP (MW) at or above which a cell-day counts as high intensity.
pub const HIGH_FRP_THRESHOLD: f64 = 10.0;

/// Fire-risk class of a cell-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum FireClass {
    None = 0,
    Low = 1,
    High = 2,
}

impl FireClass {
    pub const ALL: [FireClass; 3] = [FireClass::None, FireClass::Low, FireClass::High];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Result<Self> {
        match i {
            0 => Ok(FireClass::None),
            1 => Ok(FireClass::Low),
            2 => Ok(FireClass::High),
            _ => Err(PipelineError::UnknownClass(i.min(u8::MAX as usize) as u8)),
        }
    }
}

impl From<FireClass> for u8 {
    fn from(c: FireClass) -> u8 {
        c as u8
    }
}

impl TryFrom<u8> for FireClass {
    type Error = PipelineError;

    fn try_from(v: u8) -> Result<Self> {
        FireClass::from_index(v as usize)
    }
}

/// Map a (non-negative) FRP value to its class.
///
/// `0` → `None`, `(0, 10)` → `Low`, `[10, ∞)` → `High`.
/// Negative and NaN inputs are outside the domain and map to `None`.
pub fn classify(frp: f64) -> FireClass {
    if frp >= HIGH_FRP_THRESHOLD {
        FireClass::High
    } else if frp > 0.0 {
        FireClass::Low
    } else {
        FireClass::None
    }
}
