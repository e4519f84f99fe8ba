//! # Component Configuration
//!
//! Per-component configuration of an instrumented protective loop: baseline
//! hazard rate, proof-test interval, demand mode, mission time, and the
//! bundle of degradation-signal accessors. All rate-shaping constants live
//! here, never in ambient shared state.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigReason, SilError, SilResult};
use crate::signals::DegradationSignals;

/// How often the protective function is demanded (IEC 61508).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandMode {
    /// Demanded occasionally; integrity measured as PFDavg over the
    /// proof-test interval.
    Low,
    /// Continuously exercised; integrity measured as PFH.
    High,
}

impl std::fmt::Display for DemandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemandMode::Low => write!(f, "low"),
            DemandMode::High => write!(f, "high"),
        }
    }
}

/// One analyzed component of a protective loop.
///
/// Immutable during a computation pass; new degradation samples arrive by
/// replacing signal series between queries.
#[derive(Debug)]
pub struct Component {
    /// Tag identity, e.g. "PT-101".
    pub id: String,
    /// Baseline (as-new) hazard rate λ₀ (1/hour).
    pub baseline_hazard: f64,
    /// Proof-test interval T (hours).
    pub proof_test_interval: f64,
    /// Demand mode of the protective function this component serves.
    pub demand_mode: DemandMode,
    /// Horizon over which this component's analysis is valid (hours).
    pub mission_time: f64,
    /// Time-indexed degradation signals from the external provider.
    pub signals: DegradationSignals,
}

impl Component {
    /// Create and validate a component configuration.
    pub fn new(
        id: impl Into<String>,
        baseline_hazard: f64,
        proof_test_interval: f64,
        demand_mode: DemandMode,
        mission_time: f64,
        signals: DegradationSignals,
    ) -> SilResult<Self> {
        let component = Self {
            id: id.into(),
            baseline_hazard,
            proof_test_interval,
            demand_mode,
            mission_time,
            signals,
        };
        component.validate()?;
        Ok(component)
    }

    /// Check the static configuration invariants.
    pub fn validate(&self) -> SilResult<()> {
        if self.proof_test_interval <= 0.0 {
            return Err(SilError::Config {
                reason: ConfigReason::NonPositiveProofInterval {
                    component: self.id.clone(),
                    value: self.proof_test_interval,
                },
            });
        }
        if self.mission_time <= 0.0 {
            return Err(SilError::Config {
                reason: ConfigReason::NonPositiveMissionTime {
                    component: self.id.clone(),
                    value: self.mission_time,
                },
            });
        }
        if self.baseline_hazard < 0.0 {
            return Err(SilError::Config {
                reason: ConfigReason::NegativeBaselineHazard {
                    component: self.id.clone(),
                    value: self.baseline_hazard,
                },
            });
        }
        Ok(())
    }
}
