//! # Hazard Rate Models
//!
//! Strategy interface turning a component's degradation signals at time t
//! into an instantaneous hazard rate λ(t) (1/hour). The multiplicative model
//! shipped here is one strategy among possibly many; callers depend only on
//! the [`HazardModel`] trait.

use tracing::warn;

use crate::component::Component;
use crate::error::{GuardEvent, SignalKind, SilResult};
use crate::signals::SignalSnapshot;

/// Default floor applied to divisor signals (maintenance quality) so a
/// degenerate sample cannot produce an unbounded hazard rate.
pub const DIVISOR_FLOOR: f64 = 1e-3;

/// A hazard rate together with any guard triggers raised while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardValue {
    /// λ(t) ≥ 0, in 1/hour.
    pub rate: f64,
    /// Non-fatal degraded-confidence flags (floored divisors, clamped
    /// factors).
    pub guards: Vec<GuardEvent>,
}

/// Strategy interface: degradation signals at one instant in, nonnegative
/// rate out. Implementations must be pure and thread-safe; per-component
/// work runs in parallel.
pub trait HazardModel: Send + Sync {
    /// Evaluate λ at the snapshot's time for the given component.
    fn evaluate(&self, component: &Component, signals: &SignalSnapshot) -> HazardValue;

    /// Short strategy name for reports.
    fn name(&self) -> &'static str;
}

/// Multiplicative degradation model:
///
/// λ = λ₀ · env · stress · (1 + a·age) · (1 + c·cycles) · (1 − DC)
///       / max(maintenance_quality, floor)
///
/// Aging and cycling accelerants default to zero so an unconfigured model
/// reproduces the baseline rate under nominal signals.
#[derive(Debug, Clone, Copy)]
pub struct MultiplicativeHazard {
    /// Floor applied to the maintenance-quality divisor.
    pub divisor_floor: f64,
    /// Hazard growth per hour of accumulated age (1/hour).
    pub aging_scale: f64,
    /// Hazard growth per accumulated cycle.
    pub cycle_scale: f64,
}

impl Default for MultiplicativeHazard {
    fn default() -> Self {
        Self {
            divisor_floor: DIVISOR_FLOOR,
            aging_scale: 0.0,
            cycle_scale: 0.0,
        }
    }
}

impl MultiplicativeHazard {
    /// Model with explicit aging/cycling accelerants.
    pub fn with_aging(aging_scale: f64, cycle_scale: f64) -> Self {
        Self {
            aging_scale,
            cycle_scale,
            ..Self::default()
        }
    }
}

impl HazardModel for MultiplicativeHazard {
    fn evaluate(&self, component: &Component, signals: &SignalSnapshot) -> HazardValue {
        let mut guards = Vec::new();

        // Divisor guard: a maintenance-quality sample at or near zero must
        // not blow the rate up to infinity.
        let maintenance = if signals.maintenance_quality < self.divisor_floor {
            warn!(
                component = %component.id,
                raw = signals.maintenance_quality,
                floor = self.divisor_floor,
                "maintenance quality floored"
            );
            guards.push(GuardEvent {
                component: component.id.clone(),
                signal: SignalKind::MaintenanceQuality,
                raw: signals.maintenance_quality,
                used: self.divisor_floor,
            });
            self.divisor_floor
        } else {
            signals.maintenance_quality
        };

        // Diagnostic coverage is a fraction; out-of-range samples are
        // clamped and flagged.
        let coverage = if !(0.0..=1.0).contains(&signals.diagnostic_coverage) {
            let clamped = signals.diagnostic_coverage.clamp(0.0, 1.0);
            guards.push(GuardEvent {
                component: component.id.clone(),
                signal: SignalKind::DiagnosticCoverage,
                raw: signals.diagnostic_coverage,
                used: clamped,
            });
            clamped
        } else {
            signals.diagnostic_coverage
        };

        // Multiplier factors are nonnegative; a negative sample is clamped
        // to zero and flagged like the other out-of-range signals.
        let environment = if signals.environment_factor < 0.0 {
            guards.push(GuardEvent {
                component: component.id.clone(),
                signal: SignalKind::EnvironmentFactor,
                raw: signals.environment_factor,
                used: 0.0,
            });
            0.0
        } else {
            signals.environment_factor
        };
        let stress = if signals.stress_factor < 0.0 {
            guards.push(GuardEvent {
                component: component.id.clone(),
                signal: SignalKind::StressFactor,
                raw: signals.stress_factor,
                used: 0.0,
            });
            0.0
        } else {
            signals.stress_factor
        };

        let rate = component.baseline_hazard
            * environment
            * stress
            * (1.0 + self.aging_scale * signals.age.max(0.0))
            * (1.0 + self.cycle_scale * signals.cycle_count.max(0.0))
            * (1.0 - coverage)
            / maintenance;

        HazardValue { rate, guards }
    }

    fn name(&self) -> &'static str {
        "multiplicative"
    }
}

/// Sample the component's signals at t and evaluate the model there.
pub fn hazard_at(
    model: &dyn HazardModel,
    component: &Component,
    t: f64,
) -> SilResult<HazardValue> {
    let snapshot = component.signals.sample(&component.id, t)?;
    Ok(model.evaluate(component, &snapshot))
}
