//! # SIL Band Mapping
//!
//! Maps an aggregated integrity value onto the standardized integrity bands
//! (IEC 61508 decade tables). The mapping is pure, deterministic, and total:
//! the five bands partition [0, ∞) with no gaps or overlap. A value exactly
//! on a decade boundary belongs to the band whose inclusive lower bound it
//! is (PFDavg = 1e-4 maps to SIL 3, not SIL 4). Values below the SIL-4
//! floor clamp to SIL 4: a loop performing better than required is never
//! reported as band 0.

use serde::{Deserialize, Serialize};

use crate::component::DemandMode;
use crate::error::{ConfigReason, SilError, SilResult};

/// Safety Integrity Level band, 0 (none) through 4 (highest).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SilBand {
    Sil0,
    Sil1,
    Sil2,
    Sil3,
    Sil4,
}

impl SilBand {
    /// Integer level 0–4.
    pub fn level(&self) -> u8 {
        match self {
            SilBand::Sil0 => 0,
            SilBand::Sil1 => 1,
            SilBand::Sil2 => 2,
            SilBand::Sil3 => 3,
            SilBand::Sil4 => 4,
        }
    }

    /// Band for a target level 0–4; out-of-range is a `ConfigError`.
    pub fn from_level(level: u8) -> SilResult<Self> {
        match level {
            0 => Ok(SilBand::Sil0),
            1 => Ok(SilBand::Sil1),
            2 => Ok(SilBand::Sil2),
            3 => Ok(SilBand::Sil3),
            4 => Ok(SilBand::Sil4),
            other => Err(SilError::Config {
                reason: ConfigReason::TargetOutOfRange(other),
            }),
        }
    }
}

impl std::fmt::Display for SilBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SIL {}", self.level())
    }
}

/// Band for a low-demand PFDavg value.
///
/// [1e-5, 1e-4) → 4, [1e-4, 1e-3) → 3, [1e-3, 1e-2) → 2, [1e-2, 1e-1) → 1,
/// ≥ 1e-1 → 0; below 1e-5 clamps to 4.
pub fn sil_from_pfdavg(pfdavg: f64) -> SilBand {
    if pfdavg < 1e-4 {
        SilBand::Sil4
    } else if pfdavg < 1e-3 {
        SilBand::Sil3
    } else if pfdavg < 1e-2 {
        SilBand::Sil2
    } else if pfdavg < 1e-1 {
        SilBand::Sil1
    } else {
        SilBand::Sil0
    }
}

/// Band for a high-demand PFH value (1/hour).
///
/// [1e-9, 1e-8) → 4, [1e-8, 1e-7) → 3, [1e-7, 1e-6) → 2, [1e-6, 1e-5) → 1,
/// ≥ 1e-5 → 0; below 1e-9 clamps to 4.
pub fn sil_from_pfh(pfh: f64) -> SilBand {
    if pfh < 1e-8 {
        SilBand::Sil4
    } else if pfh < 1e-7 {
        SilBand::Sil3
    } else if pfh < 1e-6 {
        SilBand::Sil2
    } else if pfh < 1e-5 {
        SilBand::Sil1
    } else {
        SilBand::Sil0
    }
}

/// Band for an aggregated value under the given demand mode.
pub fn sil_for(value: f64, mode: DemandMode) -> SilBand {
    match mode {
        DemandMode::Low => sil_from_pfdavg(value),
        DemandMode::High => sil_from_pfh(value),
    }
}
