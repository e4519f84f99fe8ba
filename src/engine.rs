//! # SIL Engine
//!
//! Orchestrates the full pipeline for a loop query at time t:
//!
//! ```text
//! signals ─► hazard ─► integrate ─► integrity ─► aggregate ─► band ─► validity
//!                                       (per component, in parallel)
//! ```
//!
//! Per-component work fans out with rayon and fans in at the aggregation
//! strategy, a read-only reduction over immutable per-component results. A
//! convergence failure earns exactly one retry with relaxed tolerance; any
//! component failure after that fails the whole loop query — partial
//! aggregation would silently understate risk.

use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{Architecture, SilLoop};
use crate::band::{sil_for, SilBand};
use crate::component::Component;
use crate::error::{ConfigReason, GuardEvent, NumericalReason, SilError, SilResult};
use crate::hazard::{hazard_at, HazardModel};
use crate::integrate::{CancelToken, HazardIntegralCache, IntegratorConfig, ReliabilityIntegrator};
use crate::integrity::{ComponentIntegrity, IntegrityCalculator, IntegrityMeasure, PfdMethod};
use crate::mission::{check_validity, loop_mission_time, ReasonCode};

/// Engine-wide configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Quadrature settings for the first attempt.
    pub integrator: IntegratorConfig,
    /// PFDavg form selection for low-demand components.
    pub pfd_method: PfdMethod,
    /// Tolerance multiplier for the single retry after a convergence
    /// failure.
    pub retry_relax_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::default(),
            pfd_method: PfdMethod::default(),
            retry_relax_factor: 100.0,
        }
    }
}

/// SIL(t) report for one loop query.
#[derive(Debug, Clone, Serialize)]
pub struct SilReport {
    /// Loop identity.
    pub loop_id: String,
    /// Query time (hours).
    pub t: f64,
    /// Loop architecture.
    pub architecture: Architecture,
    /// Which measure `value` carries (PFDavg or PFH).
    pub measure: IntegrityMeasure,
    /// Aggregated loop-level integrity value.
    pub value: f64,
    /// Aggregated loop-level hazard rate (1/hour).
    pub lambda: f64,
    /// Achieved integrity band.
    pub band: SilBand,
    /// Required integrity band.
    pub target: SilBand,
    /// Loop mission time (hours), min over members.
    pub mission_time: f64,
    /// Both validity gates passed.
    pub valid: bool,
    /// Structured reasons for an invalid claim.
    pub reasons: Vec<ReasonCode>,
    /// Degraded-confidence flags raised during the query.
    pub guards: Vec<GuardEvent>,
    /// Per-component breakdown.
    pub components: Vec<ComponentIntegrity>,
}

impl SilReport {
    /// True when any guard fired; the claim stands but its inputs were
    /// pushed back into range.
    pub fn degraded_confidence(&self) -> bool {
        !self.guards.is_empty()
    }

    /// Human-readable report.
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str("=== SIL(t) REPORT ===\n\n");
        out.push_str(&format!(
            "Loop: {} ({} architecture)\n",
            self.loop_id, self.architecture
        ));
        out.push_str(&format!(
            "Query time: {:.1} h (mission time {:.1} h)\n",
            self.t, self.mission_time
        ));
        out.push_str(&format!(
            "{} = {:.3e} (λ = {:.3e} /h) → {}  [target {}]\n",
            self.measure, self.value, self.lambda, self.band, self.target
        ));
        out.push_str(&format!(
            "Claim: {}\n",
            if self.valid { "VALID" } else { "NOT VALID" }
        ));
        for reason in &self.reasons {
            out.push_str(&format!("  - {}\n", reason));
        }
        if self.degraded_confidence() {
            out.push_str("Degraded confidence:\n");
            for guard in &self.guards {
                out.push_str(&format!("  - {}\n", guard));
            }
        }
        out.push_str("\nCOMPONENTS:\n");
        out.push_str("-----------\n");
        for c in &self.components {
            out.push_str(&format!(
                "{}: λ = {:.3e} /h, {} = {:.3e}\n",
                c.component, c.lambda, c.measure, c.value
            ));
        }
        out
    }
}

/// The time-dependent SIL computation engine.
///
/// Stateless per query: every report is recomputed from the loop
/// configuration and the current degradation samples. The optional
/// incremental cache only memoizes cumulative hazard integrals, keyed by
/// component id, under the monotonic-time rule.
pub struct SilEngine {
    model: Box<dyn HazardModel>,
    config: EngineConfig,
    hazard_cache: Option<DashMap<String, HazardIntegralCache>>,
}

impl SilEngine {
    /// Engine with default configuration.
    pub fn new(model: Box<dyn HazardModel>) -> Self {
        Self {
            model,
            config: EngineConfig::default(),
            hazard_cache: None,
        }
    }

    /// Engine with explicit configuration.
    pub fn with_config(model: Box<dyn HazardModel>, config: EngineConfig) -> Self {
        Self {
            model,
            config,
            hazard_cache: None,
        }
    }

    /// Enable incremental cumulative-hazard caching for reliability
    /// queries whose t advances monotonically per component.
    pub fn with_incremental_cache(mut self) -> Self {
        self.hazard_cache = Some(DashMap::new());
        self
    }

    /// SIL(t) for one loop.
    pub fn evaluate(&self, sil_loop: &SilLoop, t: f64) -> SilResult<SilReport> {
        self.evaluate_with_cancel(sil_loop, t, &CancelToken::none())
    }

    /// SIL(t) for one loop under a cancellation/deadline signal.
    pub fn evaluate_with_cancel(
        &self,
        sil_loop: &SilLoop,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<SilReport> {
        if t < 0.0 {
            return Err(SilError::Config {
                reason: ConfigReason::NegativeQueryTime(t),
            });
        }
        sil_loop.validate()?;
        debug!(loop_id = %sil_loop.id, t, "evaluating SIL(t)");

        let mission_time = loop_mission_time(&sil_loop.components);

        // Fan out per component; fan in below. Any failure aborts the
        // whole loop query carrying the offending component identity.
        let components: Vec<ComponentIntegrity> = sil_loop
            .components
            .par_iter()
            .map(|component| self.evaluate_component(component, t, cancel))
            .collect::<SilResult<Vec<_>>>()?;

        let strategy = sil_loop.architecture.strategy();
        let values: Vec<f64> = components.iter().map(|c| c.value).collect();
        let lambdas: Vec<f64> = components.iter().map(|c| c.lambda).collect();
        let value = strategy.combine(&values);
        let lambda = strategy.combine(&lambdas);

        let mode = sil_loop.demand_mode();
        let band = sil_for(value, mode);
        let validity = check_validity(band, sil_loop.target, t, mission_time);
        let guards: Vec<GuardEvent> = components
            .iter()
            .flat_map(|c| c.guards.iter().cloned())
            .collect();

        Ok(SilReport {
            loop_id: sil_loop.id.clone(),
            t,
            architecture: sil_loop.architecture,
            measure: components[0].measure,
            value,
            lambda,
            band,
            target: sil_loop.target,
            mission_time,
            valid: validity.valid,
            reasons: validity.reasons,
            guards,
            components,
        })
    }

    /// One component's integrity, with the single relaxed-tolerance retry
    /// on a convergence failure.
    fn evaluate_component(
        &self,
        component: &Component,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<ComponentIntegrity> {
        if cancel.expired() {
            return Err(SilError::Numerical {
                component: component.id.clone(),
                reason: NumericalReason::Cancelled,
            });
        }
        let calc = IntegrityCalculator::new(self.model.as_ref(), self.config.integrator);
        match calc.evaluate(component, t, self.config.pfd_method, cancel) {
            Err(SilError::Numerical { component: id, reason })
                if matches!(
                    reason,
                    NumericalReason::ToleranceNotMet { .. }
                        | NumericalReason::BudgetExhausted { .. }
                ) =>
            {
                warn!(
                    component = %id,
                    %reason,
                    relax = self.config.retry_relax_factor,
                    "integration failed, retrying once with relaxed tolerance"
                );
                let relaxed = IntegrityCalculator::new(
                    self.model.as_ref(),
                    self.config.integrator.relaxed(self.config.retry_relax_factor),
                );
                relaxed.evaluate(component, t, self.config.pfd_method, cancel)
            }
            other => other,
        }
    }

    /// SIL(t) for a batch of independent loops, in parallel, under one
    /// shared cancellation signal so the batch can be time-bounded.
    pub fn evaluate_batch(
        &self,
        loops: &[SilLoop],
        t: f64,
        cancel: &CancelToken,
    ) -> Vec<SilResult<SilReport>> {
        loops
            .par_iter()
            .map(|l| self.evaluate_with_cancel(l, t, cancel))
            .collect()
    }

    /// Reliability curve point (R(t), F(t)) for one component, using the
    /// incremental cache when enabled.
    pub fn component_reliability(
        &self,
        component: &Component,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<(f64, f64)> {
        let integrator = ReliabilityIntegrator::new(self.config.integrator);
        let model = self.model.as_ref();
        let lambda = |tau: f64| hazard_at(model, component, tau).map(|hv| hv.rate);
        let cumulative = match &self.hazard_cache {
            Some(cache) => {
                let mut entry = cache.entry(component.id.clone()).or_default();
                entry.cumulative(&integrator, &component.id, &lambda, t, cancel)?
            }
            None => integrator.cumulative_hazard(&component.id, &lambda, t, cancel)?,
        };
        let reliability = (-cumulative).exp();
        Ok((reliability, 1.0 - reliability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DemandMode;
    use crate::hazard::MultiplicativeHazard;
    use crate::signals::{ConstantSeries, DegradationSignals, SampledSeries};

    fn engine() -> SilEngine {
        SilEngine::new(Box::new(MultiplicativeHazard::default()))
    }

    fn low_component(id: &str, baseline: f64, mission: f64) -> Component {
        Component::new(
            id,
            baseline,
            8760.0,
            DemandMode::Low,
            mission,
            DegradationSignals::nominal(),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_loop_band_2() {
        // One component, baseline 1e-6/h, T = 8760 h: PFDavg ≈ 4.38e-3 → SIL 2
        let l = SilLoop::new(
            "SIF-1",
            Architecture::Series,
            2,
            vec![low_component("PT-101", 1e-6, 87_600.0)],
        )
        .unwrap();
        let report = engine().evaluate(&l, 1000.0).unwrap();
        assert_eq!(report.measure, IntegrityMeasure::PfdAvg);
        assert!((report.value - 4.38e-3).abs() / 4.38e-3 < 0.02);
        assert_eq!(report.band, SilBand::Sil2);
        assert!(report.valid);
    }

    #[test]
    fn test_three_identical_components_band_3() {
        // Three members each with PFDavg = 1e-4 → loop 3e-4 → SIL 3.
        // λ = 2·PFDavg/T = 2e-4/8760
        let baseline = 2.0 * 1e-4 / 8760.0;
        let members = vec![
            low_component("A", baseline, 87_600.0),
            low_component("B", baseline, 87_600.0),
            low_component("C", baseline, 87_600.0),
        ];
        let l = SilLoop::new("SIF-2", Architecture::Series, 3, members).unwrap();
        let report = engine().evaluate(&l, 1000.0).unwrap();
        assert!((report.value - 3e-4).abs() / 3e-4 < 0.01);
        assert_eq!(report.band, SilBand::Sil3);
    }

    #[test]
    fn test_component_order_does_not_change_total() {
        let baselines = [1e-6, 3e-7, 9e-6];
        let make = |order: &[usize]| {
            let members = order
                .iter()
                .map(|&i| low_component(&format!("C{}", i), baselines[i], 87_600.0))
                .collect();
            SilLoop::new("SIF-3", Architecture::Series, 1, members).unwrap()
        };
        let e = engine();
        let a = e.evaluate(&make(&[0, 1, 2]), 500.0).unwrap().value;
        let b = e.evaluate(&make(&[2, 0, 1]), 500.0).unwrap().value;
        assert!((a - b).abs() < 1e-12 * a.abs().max(1.0));
    }

    #[test]
    fn test_invalid_beyond_mission_time() {
        let members = vec![
            low_component("A", 1e-6, 87_600.0),
            low_component("B", 1e-6, 20_000.0),
        ];
        let l = SilLoop::new("SIF-4", Architecture::Series, 1, members).unwrap();
        let report = engine().evaluate(&l, 30_000.0).unwrap();
        assert!((report.mission_time - 20_000.0).abs() < 1e-9);
        assert!(!report.valid);
        assert!(report
            .reasons
            .iter()
            .any(|r| matches!(r, ReasonCode::BeyondMissionTime { .. })));
    }

    #[test]
    fn test_failing_component_fails_whole_loop() {
        // Component B's stress signal is only sampled up to 10 000 h; a
        // query beyond that must fail the entire loop, naming B
        let mut signals = DegradationSignals::nominal();
        signals.stress_factor =
            Box::new(SampledSeries::new(vec![(0.0, 1.0), (10_000.0, 1.1)]).unwrap());
        let b = Component::new("B", 1e-6, 8760.0, DemandMode::Low, 87_600.0, signals).unwrap();
        let members = vec![low_component("A", 1e-6, 87_600.0), b];
        let l = SilLoop::new("SIF-5", Architecture::Series, 1, members).unwrap();

        let err = engine().evaluate(&l, 50_000.0).unwrap_err();
        assert_eq!(err.component(), Some("B"));
        assert!(matches!(err, SilError::Input { .. }));
    }

    #[test]
    fn test_guard_degrades_confidence_but_not_validity() {
        let mut signals = DegradationSignals::nominal();
        signals.maintenance_quality = Box::new(ConstantSeries(0.0));
        let c = Component::new("PT-9", 1e-9, 8760.0, DemandMode::Low, 87_600.0, signals).unwrap();
        let l = SilLoop::new("SIF-6", Architecture::Series, 2, vec![c]).unwrap();
        let report = engine().evaluate(&l, 100.0).unwrap();
        assert!(report.degraded_confidence());
        assert!(report.value.is_finite());
        // λ floored to 1e-9/1e-3 = 1e-6 → PFDavg ≈ 4.38e-3 → SIL 2
        assert_eq!(report.band, SilBand::Sil2);
        assert!(report.valid);
    }

    #[test]
    fn test_high_demand_loop_pfh_banding() {
        let members = vec![
            Component::new(
                "SV-1",
                4e-8,
                8760.0,
                DemandMode::High,
                87_600.0,
                DegradationSignals::nominal(),
            )
            .unwrap(),
            Component::new(
                "SV-2",
                4e-8,
                8760.0,
                DemandMode::High,
                87_600.0,
                DegradationSignals::nominal(),
            )
            .unwrap(),
        ];
        let l = SilLoop::new("SIF-7", Architecture::Series, 3, members).unwrap();
        let report = engine().evaluate(&l, 100.0).unwrap();
        assert_eq!(report.measure, IntegrityMeasure::Pfh);
        assert!((report.value - 8e-8).abs() < 1e-20);
        assert_eq!(report.band, SilBand::Sil3);
        assert!(report.valid);
    }

    #[test]
    fn test_negative_query_time_rejected() {
        let l = SilLoop::new(
            "SIF-8",
            Architecture::Series,
            1,
            vec![low_component("A", 1e-6, 87_600.0)],
        )
        .unwrap();
        let err = engine().evaluate(&l, -1.0).unwrap_err();
        assert!(matches!(
            err,
            SilError::Config {
                reason: ConfigReason::NegativeQueryTime(_)
            }
        ));
    }

    #[test]
    fn test_cancelled_batch_reports_numerical_error() {
        let l = SilLoop::new(
            "SIF-9",
            Architecture::Series,
            1,
            vec![low_component("A", 1e-6, 87_600.0)],
        )
        .unwrap();
        let token = CancelToken::manual();
        token.cancel();
        let e = engine();
        let results = e.evaluate_batch(std::slice::from_ref(&l), 1000.0, &token);
        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            SilError::Numerical {
                reason: NumericalReason::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn test_component_reliability_with_cache() {
        let e = engine().with_incremental_cache();
        let c = low_component("A", 1e-5, 87_600.0);
        let cancel = CancelToken::none();
        let (r1, f1) = e.component_reliability(&c, 10_000.0, &cancel).unwrap();
        assert!((r1 - (-0.1_f64).exp()).abs() < 1e-9);
        assert_eq!(f1, 1.0 - r1);
        // Advance, then step back: both must match fresh computation
        let (r2, _) = e.component_reliability(&c, 20_000.0, &cancel).unwrap();
        assert!((r2 - (-0.2_f64).exp()).abs() < 1e-9);
        let (r3, _) = e.component_reliability(&c, 5_000.0, &cancel).unwrap();
        assert!((r3 - (-0.05_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_report_text_contains_key_facts() {
        let l = SilLoop::new(
            "SIF-204",
            Architecture::Series,
            2,
            vec![low_component("PT-101", 1e-6, 87_600.0)],
        )
        .unwrap();
        let report = engine().evaluate(&l, 1000.0).unwrap();
        let text = report.report();
        assert!(text.contains("SIF-204"));
        assert!(text.contains("SIL 2"));
        assert!(text.contains("PFDavg"));
        assert!(text.contains("VALID"));
        assert!(text.contains("PT-101"));
    }

    #[test]
    fn test_report_serializes() {
        let l = SilLoop::new(
            "SIF-204",
            Architecture::Series,
            2,
            vec![low_component("PT-101", 1e-6, 87_600.0)],
        )
        .unwrap();
        let report = engine().evaluate(&l, 1000.0).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"loop_id\":\"SIF-204\""));
        assert!(json.contains("\"valid\":true"));
    }
}
