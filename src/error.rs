//! # Error Taxonomy
//!
//! Every failure surfaces the offending component identity and error kind.
//! Guard triggers (a floored divisor) are non-fatal and travel as
//! [`GuardEvent`] flags on results, never as errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the engine.
pub type SilResult<T> = Result<T, SilError>;

/// Named degradation signals required on every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Accumulated operating age (hours).
    Age,
    /// Accumulated demand/operation cycles.
    CycleCount,
    /// Environmental severity multiplier (1 = nominal).
    EnvironmentFactor,
    /// Mechanical/electrical stress multiplier (1 = nominal).
    StressFactor,
    /// Maintenance quality in (0, 1] (1 = perfect).
    MaintenanceQuality,
    /// Fraction of failures detectable online, in [0, 1].
    DiagnosticCoverage,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignalKind::Age => "age",
            SignalKind::CycleCount => "cycle_count",
            SignalKind::EnvironmentFactor => "environment_factor",
            SignalKind::StressFactor => "stress_factor",
            SignalKind::MaintenanceQuality => "maintenance_quality",
            SignalKind::DiagnosticCoverage => "diagnostic_coverage",
        };
        write!(f, "{}", name)
    }
}

/// Why a numerical computation failed.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum NumericalReason {
    /// Adaptive quadrature exhausted its refinement depth.
    #[error("tolerance {tolerance:e} not met within depth {max_depth}")]
    ToleranceNotMet { tolerance: f64, max_depth: u32 },
    /// Evaluation budget exhausted before convergence.
    #[error("evaluation budget {budget} exhausted")]
    BudgetExhausted { budget: usize },
    /// Deadline or cooperative cancellation hit mid-integration.
    #[error("cancelled or deadline exceeded during integration")]
    Cancelled,
    /// The λ·T/2 approximation was requested while λ varies too much
    /// over the proof-test window.
    #[error(
        "PFDavg approximation invalid: relative λ variation {variation:.3} exceeds {limit:.3}"
    )]
    ApproximationInvalid { variation: f64, limit: f64 },
}

/// Why a Component/Loop configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ConfigReason {
    #[error("unknown architecture tag '{0}'")]
    UnknownArchitecture(String),
    #[error("target integrity level {0} outside 0-4")]
    TargetOutOfRange(u8),
    #[error("component '{component}': proof-test interval {value} h must be positive")]
    NonPositiveProofInterval { component: String, value: f64 },
    #[error("component '{component}': mission time {value} h must be positive")]
    NonPositiveMissionTime { component: String, value: f64 },
    #[error("component '{component}': baseline hazard {value} 1/h must be nonnegative")]
    NegativeBaselineHazard { component: String, value: f64 },
    #[error("loop '{0}' has no components")]
    EmptyLoop(String),
    #[error("loop '{0}' mixes low-demand and high-demand components")]
    MixedDemandModes(String),
    #[error("query time {0} h is negative")]
    NegativeQueryTime(f64),
}

/// Engine error taxonomy. `Input` and `Config` are fatal for the query;
/// `Numerical` is retried exactly once with relaxed tolerance before
/// becoming fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SilError {
    /// A required degradation signal is undefined at the requested time.
    #[error("component '{component}': signal '{signal}' undefined at t = {t} h")]
    Input {
        component: String,
        signal: SignalKind,
        t: f64,
    },
    /// Numerical integration failed to converge within budget.
    #[error("component '{component}': {reason}")]
    Numerical {
        component: String,
        reason: NumericalReason,
    },
    /// Invalid Component or Loop configuration.
    #[error("invalid configuration: {reason}")]
    Config { reason: ConfigReason },
}

impl SilError {
    /// Identity of the component that caused the failure, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            SilError::Input { component, .. } | SilError::Numerical { component, .. } => {
                Some(component)
            }
            SilError::Config { reason } => match reason {
                ConfigReason::NonPositiveProofInterval { component, .. }
                | ConfigReason::NonPositiveMissionTime { component, .. }
                | ConfigReason::NegativeBaselineHazard { component, .. } => Some(component),
                _ => None,
            },
        }
    }

    /// True for the one error kind that earns a relaxed-tolerance retry.
    pub fn is_numerical(&self) -> bool {
        matches!(self, SilError::Numerical { .. })
    }
}

/// A non-fatal guard trigger: a divisor (or bounded factor) was pushed back
/// into its safe range before use. Recorded on the result as a
/// degraded-confidence flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardEvent {
    /// Component whose signal was guarded.
    pub component: String,
    /// Which signal was guarded.
    pub signal: SignalKind,
    /// Raw value as sampled.
    pub raw: f64,
    /// Value actually used after the guard.
    pub used: f64,
}

impl std::fmt::Display for GuardEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: {} guarded to {}",
            self.component, self.signal, self.raw, self.used
        )
    }
}
