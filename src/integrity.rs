//! # Component Integrity
//!
//! Per-component integrity measures derived from the reliability curve.
//!
//! Low demand uses PFDavg over the current proof-test window, with the exact
//! double-integral form:
//!
//! ```text
//! PFDavg = (1/T) ∫_{t₀}^{t₀+T} [1 − exp(−∫_{t₀}^{u} λ(τ)dτ)] du
//! ```
//!
//! where t₀ is the most recent proof test before the query (the test
//! restores the component to a known state). The familiar λ·T/2 shortcut is
//! also exposed, but only behind a checked precondition: it is valid when λ
//! varies by a small relative amount over one proof-test interval, and the
//! engine never falls back to it silently when λ is rapidly varying.
//!
//! High/continuous demand uses PFH(t) = λ(t) directly, no averaging window.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::component::{Component, DemandMode};
use crate::error::{GuardEvent, NumericalReason, SilError, SilResult};
use crate::hazard::{hazard_at, HazardModel};
use crate::integrate::{CancelToken, IntegratorConfig, ReliabilityIntegrator};

/// Largest relative λ variation over one proof-test window for which the
/// λ·T/2 approximation is accepted.
pub const APPROX_MAX_RELATIVE_DRIFT: f64 = 0.1;

/// Panels of the outer Simpson grid in the exact PFDavg form (even).
const PFD_OUTER_PANELS: usize = 64;

/// Which PFDavg form to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PfdMethod {
    /// Exact double-integral form, always applicable.
    Exact,
    /// λ(t)·T/2; rejected with a `NumericalError` when λ drifts more than
    /// [`APPROX_MAX_RELATIVE_DRIFT`] over the window.
    Approximate,
    /// Approximation when its precondition holds, exact form otherwise.
    #[default]
    Auto,
}

/// Which integrity measure a value carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityMeasure {
    /// Average probability of failure on demand (dimensionless).
    PfdAvg,
    /// Probability of failure per hour (1/hour).
    Pfh,
}

impl std::fmt::Display for IntegrityMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityMeasure::PfdAvg => write!(f, "PFDavg"),
            IntegrityMeasure::Pfh => write!(f, "PFH"),
        }
    }
}

/// Integrity of one component at the query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentIntegrity {
    /// Component identity.
    pub component: String,
    /// Instantaneous hazard rate λ(t) (1/hour).
    pub lambda: f64,
    /// Which measure `value` carries.
    pub measure: IntegrityMeasure,
    /// PFDavg or PFH value, nonnegative.
    pub value: f64,
    /// Degraded-confidence flags from the signal snapshot at t and from
    /// every λ evaluation inside the averaging window, one per
    /// component/signal pair.
    pub guards: Vec<GuardEvent>,
}

/// Append guard events not already present for the same component/signal
/// pair. A floored divisor hit at hundreds of quadrature points is one flag,
/// not hundreds.
fn merge_guards(into: &mut Vec<GuardEvent>, extra: Vec<GuardEvent>) {
    for g in extra {
        if !into
            .iter()
            .any(|e| e.component == g.component && e.signal == g.signal)
        {
            into.push(g);
        }
    }
}

/// Derives PFDavg / PFH per component from a hazard model and a quadrature
/// scheme.
pub struct IntegrityCalculator<'a> {
    model: &'a dyn HazardModel,
    integrator: ReliabilityIntegrator,
}

impl<'a> IntegrityCalculator<'a> {
    pub fn new(model: &'a dyn HazardModel, config: IntegratorConfig) -> Self {
        Self {
            model,
            integrator: ReliabilityIntegrator::new(config),
        }
    }

    /// λ as a fallible function of time, for the quadrature kernels. Guard
    /// events raised at each evaluation point are collected into `log` when
    /// one is supplied, so a flag firing anywhere in the window still
    /// surfaces on the result.
    fn lambda_fn<'b>(
        &'b self,
        component: &'b Component,
        log: Option<&'b RefCell<Vec<GuardEvent>>>,
    ) -> impl Fn(f64) -> SilResult<f64> + 'b {
        let model = self.model;
        move |tau| {
            let hv = hazard_at(model, component, tau)?;
            if let Some(log) = log {
                merge_guards(&mut log.borrow_mut(), hv.guards);
            }
            Ok(hv.rate)
        }
    }

    /// Integrity at time t, dispatching on the component's demand mode.
    pub fn evaluate(
        &self,
        component: &Component,
        t: f64,
        method: PfdMethod,
        cancel: &CancelToken,
    ) -> SilResult<ComponentIntegrity> {
        let hv = hazard_at(self.model, component, t)?;
        let window_log = RefCell::new(Vec::new());
        let (measure, value) = match component.demand_mode {
            DemandMode::High => (IntegrityMeasure::Pfh, hv.rate),
            DemandMode::Low => (
                IntegrityMeasure::PfdAvg,
                self.pfd_avg_logged(component, t, method, cancel, Some(&window_log))?,
            ),
        };
        let mut guards = hv.guards;
        merge_guards(&mut guards, window_log.into_inner());
        Ok(ComponentIntegrity {
            component: component.id.clone(),
            lambda: hv.rate,
            measure,
            value,
            guards,
        })
    }

    /// PFH(t) = λ(t) for high/continuous demand.
    pub fn pfh(&self, component: &Component, t: f64) -> SilResult<f64> {
        Ok(hazard_at(self.model, component, t)?.rate)
    }

    /// PFDavg at t using the requested form.
    pub fn pfd_avg(
        &self,
        component: &Component,
        t: f64,
        method: PfdMethod,
        cancel: &CancelToken,
    ) -> SilResult<f64> {
        self.pfd_avg_logged(component, t, method, cancel, None)
    }

    fn pfd_avg_logged(
        &self,
        component: &Component,
        t: f64,
        method: PfdMethod,
        cancel: &CancelToken,
        log: Option<&RefCell<Vec<GuardEvent>>>,
    ) -> SilResult<f64> {
        match method {
            PfdMethod::Exact => self.pfd_avg_exact_logged(component, t, cancel, log),
            PfdMethod::Approximate => {
                let drift = self.window_drift_logged(component, t, log)?;
                if drift > APPROX_MAX_RELATIVE_DRIFT {
                    return Err(SilError::Numerical {
                        component: component.id.clone(),
                        reason: NumericalReason::ApproximationInvalid {
                            variation: drift,
                            limit: APPROX_MAX_RELATIVE_DRIFT,
                        },
                    });
                }
                self.pfd_avg_approx(component, t)
            }
            PfdMethod::Auto => {
                let drift = self.window_drift_logged(component, t, log)?;
                if drift <= APPROX_MAX_RELATIVE_DRIFT {
                    self.pfd_avg_approx(component, t)
                } else {
                    self.pfd_avg_exact_logged(component, t, cancel, log)
                }
            }
        }
    }

    /// λ(t)·T/2. Valid only when λ is slowly varying over the proof-test
    /// window; callers go through [`Self::pfd_avg`] which checks that.
    pub fn pfd_avg_approx(&self, component: &Component, t: f64) -> SilResult<f64> {
        let lambda = self.pfh(component, t)?;
        Ok(lambda * component.proof_test_interval / 2.0)
    }

    /// Exact double-integral form over the proof-test window containing t.
    ///
    /// Outer integral: composite Simpson over an even grid; inner cumulative
    /// hazards accumulate panel by panel so each adaptive integration only
    /// covers one grid step.
    pub fn pfd_avg_exact(
        &self,
        component: &Component,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64> {
        self.pfd_avg_exact_logged(component, t, cancel, None)
    }

    fn pfd_avg_exact_logged(
        &self,
        component: &Component,
        t: f64,
        cancel: &CancelToken,
        log: Option<&RefCell<Vec<GuardEvent>>>,
    ) -> SilResult<f64> {
        let period = component.proof_test_interval;
        let window_start = period * (t / period).floor();
        let lambda = self.lambda_fn(component, log);

        let n = PFD_OUTER_PANELS;
        let h = period / n as f64;
        let mut cumulative = 0.0;
        // g(u) = 1 − exp(−∫_{t₀}^{u} λ); g(t₀) = 0
        let mut g = Vec::with_capacity(n + 1);
        g.push(0.0);
        for i in 1..=n {
            let a = window_start + (i - 1) as f64 * h;
            let b = window_start + i as f64 * h;
            cumulative += self
                .integrator
                .integrate(&component.id, &lambda, a, b, cancel)?;
            g.push(1.0 - (-cumulative).exp());
        }

        let mut sum = g[0] + g[n];
        for (i, gi) in g.iter().enumerate().take(n).skip(1) {
            sum += if i % 2 == 1 { 4.0 * gi } else { 2.0 * gi };
        }
        Ok((h / 3.0 * sum) / period)
    }

    /// Relative λ variation across the proof-test window containing t:
    /// (max − min) / max over five probe points, 0 for an identically zero
    /// rate.
    pub fn lambda_window_drift(&self, component: &Component, t: f64) -> SilResult<f64> {
        self.window_drift_logged(component, t, None)
    }

    fn window_drift_logged(
        &self,
        component: &Component,
        t: f64,
        log: Option<&RefCell<Vec<GuardEvent>>>,
    ) -> SilResult<f64> {
        let period = component.proof_test_interval;
        let window_start = period * (t / period).floor();
        let lambda = self.lambda_fn(component, log);
        let mut min = f64::INFINITY;
        let mut max = 0.0_f64;
        for i in 0..=4 {
            let u = window_start + period * i as f64 / 4.0;
            let rate = lambda(u)?;
            min = min.min(rate);
            max = max.max(rate);
        }
        if max <= 0.0 {
            Ok(0.0)
        } else {
            Ok((max - min) / max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::MultiplicativeHazard;
    use crate::signals::DegradationSignals;

    fn low_demand_component(baseline: f64) -> Component {
        Component::new(
            "PT-101",
            baseline,
            8760.0,
            DemandMode::Low,
            87_600.0,
            DegradationSignals::nominal(),
        )
        .unwrap()
    }

    fn calculator(model: &MultiplicativeHazard) -> IntegrityCalculator<'_> {
        IntegrityCalculator::new(model, IntegratorConfig::default())
    }

    #[test]
    fn test_pfdavg_approximation_reference_case() {
        // Baseline 1e-6/h, nominal signals, T = 8760 h → λT/2 = 4.38e-3
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let c = low_demand_component(1e-6);
        let pfd = calc.pfd_avg_approx(&c, 1000.0).unwrap();
        assert!((pfd - 4.38e-3).abs() < 1e-12);
    }

    #[test]
    fn test_exact_matches_approximation_for_constant_lambda() {
        // Constant λ: closed form PFDavg = 1 − (1 − e^{−λT})/(λT) ≈ λT/2
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let c = low_demand_component(1e-6);
        let cancel = CancelToken::none();
        let exact = calc.pfd_avg_exact(&c, 1000.0, &cancel).unwrap();
        let approx = calc.pfd_avg_approx(&c, 1000.0).unwrap();
        assert!((exact - approx).abs() / approx < 0.01);

        let lambda_t: f64 = 1e-6 * 8760.0;
        let closed_form = 1.0 - (1.0 - (-lambda_t).exp()) / lambda_t;
        assert!((exact - closed_form).abs() / closed_form < 1e-4);
    }

    #[test]
    fn test_auto_uses_approximation_when_flat() {
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let c = low_demand_component(1e-6);
        let cancel = CancelToken::none();
        let auto = calc.pfd_avg(&c, 1000.0, PfdMethod::Auto, &cancel).unwrap();
        let approx = calc.pfd_avg_approx(&c, 1000.0).unwrap();
        assert_eq!(auto, approx);
    }

    #[test]
    fn test_approximation_rejected_for_fast_varying_lambda() {
        // Aging term grows λ by ~60% per window: precondition violated
        let model = MultiplicativeHazard::with_aging(1e-4, 0.0);
        let calc = calculator(&model);
        let c = low_demand_component(1e-6);
        let cancel = CancelToken::none();

        let drift = calc.lambda_window_drift(&c, 1000.0).unwrap();
        assert!(drift > APPROX_MAX_RELATIVE_DRIFT);

        let err = calc
            .pfd_avg(&c, 1000.0, PfdMethod::Approximate, &cancel)
            .unwrap_err();
        assert!(matches!(
            err,
            SilError::Numerical {
                reason: NumericalReason::ApproximationInvalid { .. },
                ..
            }
        ));

        // Auto must fall back to the exact form, not fail
        let auto = calc.pfd_avg(&c, 1000.0, PfdMethod::Auto, &cancel).unwrap();
        let exact = calc.pfd_avg_exact(&c, 1000.0, &cancel).unwrap();
        assert_eq!(auto, exact);
    }

    #[test]
    fn test_window_anchoring_after_proof_test() {
        // With constant λ the window anchor does not change PFDavg; queries
        // in later windows must agree with the first
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let c = low_demand_component(1e-6);
        let cancel = CancelToken::none();
        let first = calc.pfd_avg_exact(&c, 100.0, &cancel).unwrap();
        let third = calc.pfd_avg_exact(&c, 2.5 * 8760.0, &cancel).unwrap();
        assert!((first - third).abs() / first < 1e-9);
    }

    #[test]
    fn test_high_demand_pfh_is_lambda() {
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let c = Component::new(
            "SV-1",
            2e-7,
            8760.0,
            DemandMode::High,
            87_600.0,
            DegradationSignals::nominal(),
        )
        .unwrap();
        let res = calc
            .evaluate(&c, 500.0, PfdMethod::Auto, &CancelToken::none())
            .unwrap();
        assert_eq!(res.measure, IntegrityMeasure::Pfh);
        assert!((res.value - 2e-7).abs() < 1e-18);
        assert_eq!(res.value, res.lambda);
    }

    #[test]
    fn test_guard_inside_window_surfaces_on_result() {
        use crate::error::SignalKind;
        use crate::signals::SampledSeries;
        // Maintenance quality degenerate at the start of the window but
        // healthy at the query time: the divisor floor fires only at earlier
        // λ evaluations, and the flag must still reach the result.
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let mut signals = DegradationSignals::nominal();
        signals.maintenance_quality =
            Box::new(SampledSeries::new(vec![(0.0, 0.0), (8760.0, 1.0)]).unwrap());
        let c = Component::new("PT-7", 1e-6, 8760.0, DemandMode::Low, 87_600.0, signals).unwrap();

        // The snapshot at t alone raises nothing.
        let hv = hazard_at(&model, &c, 8000.0).unwrap();
        assert!(hv.guards.is_empty());

        let res = calc
            .evaluate(&c, 8000.0, PfdMethod::Auto, &CancelToken::none())
            .unwrap();
        assert!(res.value.is_finite());
        let maint: Vec<_> = res
            .guards
            .iter()
            .filter(|g| g.signal == SignalKind::MaintenanceQuality)
            .collect();
        // One flag per component/signal pair, however many evaluation
        // points triggered it.
        assert_eq!(maint.len(), 1);
        assert_eq!(maint[0].component, "PT-7");
    }

    #[test]
    fn test_evaluate_low_demand_carries_measure_and_guards() {
        use crate::signals::ConstantSeries;
        let model = MultiplicativeHazard::default();
        let calc = calculator(&model);
        let mut signals = DegradationSignals::nominal();
        signals.maintenance_quality = Box::new(ConstantSeries(0.0));
        let c = Component::new("PT-9", 1e-6, 8760.0, DemandMode::Low, 87_600.0, signals).unwrap();
        let res = calc
            .evaluate(&c, 100.0, PfdMethod::Auto, &CancelToken::none())
            .unwrap();
        assert_eq!(res.measure, IntegrityMeasure::PfdAvg);
        assert!(res.value.is_finite());
        assert_eq!(res.guards.len(), 1);
    }
}
