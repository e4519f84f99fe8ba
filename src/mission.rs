//! # Mission Time & Validity
//!
//! Weakest-link mission time: a loop's integrity claim is never valid beyond
//! the shortest-lived analyzed component. The validity check gates the
//! achieved band against the target and the query time against that horizon;
//! both gates are hard, and each failure carries a structured reason code.

use serde::{Deserialize, Serialize};

use crate::band::SilBand;
use crate::component::Component;

/// Loop mission time: minimum over member component mission times (hours).
pub fn loop_mission_time(components: &[Component]) -> f64 {
    components
        .iter()
        .map(|c| c.mission_time)
        .fold(f64::INFINITY, f64::min)
}

/// Why a SIL(t) claim failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "code")]
pub enum ReasonCode {
    /// Achieved band is below the configured target.
    TargetNotMet { achieved: SilBand, target: SilBand },
    /// Query time lies beyond the loop's mission time.
    BeyondMissionTime { t: f64, mission_time: f64 },
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonCode::TargetNotMet { achieved, target } => {
                write!(f, "achieved {} below target {}", achieved, target)
            }
            ReasonCode::BeyondMissionTime { t, mission_time } => {
                write!(
                    f,
                    "query time {} h beyond loop mission time {} h",
                    t, mission_time
                )
            }
        }
    }
}

/// Outcome of the validity check: a boolean plus structured reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityResult {
    pub valid: bool,
    pub reasons: Vec<ReasonCode>,
}

/// Valid iff achieved ≥ target AND t ≤ mission time. No partial credit:
/// every failed gate contributes its reason.
pub fn check_validity(
    achieved: SilBand,
    target: SilBand,
    t: f64,
    mission_time: f64,
) -> ValidityResult {
    let mut reasons = Vec::new();
    if achieved < target {
        reasons.push(ReasonCode::TargetNotMet { achieved, target });
    }
    if t > mission_time {
        reasons.push(ReasonCode::BeyondMissionTime { t, mission_time });
    }
    ValidityResult {
        valid: reasons.is_empty(),
        reasons,
    }
}
