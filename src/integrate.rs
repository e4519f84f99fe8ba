//! # Reliability Integration
//!
//! Numerical integration of hazard rates into reliability curves.
//!
//! λ(t) is generally not closed-form (it is driven by sampled degradation
//! signals), so the cumulative hazard ∫₀ᵗ λ(τ)dτ is computed with adaptive
//! Simpson quadrature under a configurable tolerance, recursion depth, and
//! evaluation budget. Exhausting any budget, or hitting a deadline, is a
//! `NumericalError` — never a silent partial value.
//!
//! Invariants delivered to callers: R(0) = 1, 0 < R(t) ≤ 1, R non-increasing
//! for λ ≥ 0, and F(t) = 1 − R(t) exactly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{NumericalReason, SilError, SilResult};

/// Quadrature configuration.
#[derive(Debug, Clone, Copy)]
pub struct IntegratorConfig {
    /// Absolute tolerance on the integral value.
    pub tolerance: f64,
    /// Maximum bisection depth of the adaptive scheme.
    pub max_depth: u32,
    /// Total integrand-evaluation budget per integral.
    pub max_evaluations: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_depth: 32,
            max_evaluations: 200_000,
        }
    }
}

impl IntegratorConfig {
    /// Relaxed copy used for the single retry after a convergence failure:
    /// tolerance multiplied by `factor`, evaluation budget doubled.
    pub fn relaxed(&self, factor: f64) -> Self {
        Self {
            tolerance: self.tolerance * factor,
            max_depth: self.max_depth,
            max_evaluations: self.max_evaluations.saturating_mul(2),
        }
    }
}

/// Cancellation signal for expensive integrations: an optional wall-clock
/// deadline plus a cooperative cancel flag shared across a batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    deadline: Option<Instant>,
    flag: Option<Arc<AtomicBool>>,
}

impl CancelToken {
    /// Token that never fires.
    pub fn none() -> Self {
        Self::default()
    }

    /// Token expiring `budget` from now.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + budget),
            flag: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Manually cancellable token (clone it into workers, cancel from
    /// anywhere).
    pub fn manual() -> Self {
        Self {
            deadline: None,
            flag: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Fire the cooperative cancel flag.
    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// True once the deadline passed or `cancel` was called.
    pub fn expired(&self) -> bool {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }
}

/// Adaptive Simpson integrator over a fallible integrand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReliabilityIntegrator {
    pub config: IntegratorConfig,
}

struct QuadState<'a> {
    component: &'a str,
    cancel: &'a CancelToken,
    budget: usize,
    evals: usize,
}

impl<'a> QuadState<'a> {
    fn eval<F>(&mut self, f: &F, x: f64) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        if self.evals >= self.budget {
            return Err(SilError::Numerical {
                component: self.component.to_string(),
                reason: NumericalReason::BudgetExhausted {
                    budget: self.budget,
                },
            });
        }
        self.evals += 1;
        f(x)
    }

    fn check_cancel(&self) -> SilResult<()> {
        if self.cancel.expired() {
            return Err(SilError::Numerical {
                component: self.component.to_string(),
                reason: NumericalReason::Cancelled,
            });
        }
        Ok(())
    }
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

impl ReliabilityIntegrator {
    pub fn new(config: IntegratorConfig) -> Self {
        Self { config }
    }

    /// Integrate `f` over [t0, t1]. `component` tags any error with the
    /// offending identity. Degenerate or reversed intervals integrate to 0.
    pub fn integrate<F>(
        &self,
        component: &str,
        f: &F,
        t0: f64,
        t1: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        if t1 <= t0 {
            return Ok(0.0);
        }
        let mut state = QuadState {
            component,
            cancel,
            budget: self.config.max_evaluations,
            evals: 0,
        };
        let m = 0.5 * (t0 + t1);
        let fa = state.eval(f, t0)?;
        let fm = state.eval(f, m)?;
        let fb = state.eval(f, t1)?;
        let whole = simpson(t0, t1, fa, fm, fb);
        self.adaptive(
            &mut state,
            f,
            t0,
            t1,
            fa,
            fm,
            fb,
            whole,
            self.config.tolerance,
            self.config.max_depth,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn adaptive<F>(
        &self,
        state: &mut QuadState<'_>,
        f: &F,
        a: f64,
        b: f64,
        fa: f64,
        fm: f64,
        fb: f64,
        whole: f64,
        tol: f64,
        depth: u32,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        state.check_cancel()?;
        let m = 0.5 * (a + b);
        let lm = 0.5 * (a + m);
        let rm = 0.5 * (m + b);
        let flm = state.eval(f, lm)?;
        let frm = state.eval(f, rm)?;
        let left = simpson(a, m, fa, flm, fm);
        let right = simpson(m, b, fm, frm, fb);
        let delta = left + right - whole;
        if delta.abs() <= 15.0 * tol {
            // Accept with Richardson extrapolation term.
            return Ok(left + right + delta / 15.0);
        }
        if depth == 0 {
            return Err(SilError::Numerical {
                component: state.component.to_string(),
                reason: NumericalReason::ToleranceNotMet {
                    tolerance: self.config.tolerance,
                    max_depth: self.config.max_depth,
                },
            });
        }
        let l = self.adaptive(state, f, a, m, fa, flm, fm, left, 0.5 * tol, depth - 1)?;
        let r = self.adaptive(state, f, m, b, fm, frm, fb, right, 0.5 * tol, depth - 1)?;
        Ok(l + r)
    }

    /// Cumulative hazard Λ(t) = ∫₀ᵗ λ(τ)dτ.
    pub fn cumulative_hazard<F>(
        &self,
        component: &str,
        lambda: &F,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        self.integrate(component, lambda, 0.0, t, cancel)
    }

    /// R(t) = exp(−Λ(t)).
    pub fn reliability<F>(
        &self,
        component: &str,
        lambda: &F,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        Ok((-self.cumulative_hazard(component, lambda, t, cancel)?).exp())
    }

    /// F(t) = 1 − R(t), exactly.
    pub fn unreliability<F>(
        &self,
        component: &str,
        lambda: &F,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        Ok(1.0 - self.reliability(component, lambda, t, cancel)?)
    }
}

/// Incremental cumulative-hazard cache.
///
/// Queries advancing monotonically in t reuse the cached partial integral
/// and only integrate the new tail. A query earlier than the last cached
/// point forces a fresh integral from 0 — the cache is never allowed to go
/// stale backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardIntegralCache {
    last_t: f64,
    last_integral: f64,
}

impl HazardIntegralCache {
    /// Cumulative hazard at t, reusing the cached prefix when t advances.
    pub fn cumulative<F>(
        &mut self,
        integrator: &ReliabilityIntegrator,
        component: &str,
        lambda: &F,
        t: f64,
        cancel: &CancelToken,
    ) -> SilResult<f64>
    where
        F: Fn(f64) -> SilResult<f64>,
    {
        if t >= self.last_t {
            let tail = integrator.integrate(component, lambda, self.last_t, t, cancel)?;
            self.last_integral += tail;
            self.last_t = t;
        } else {
            // Monotonic-time assumption violated: recompute from scratch.
            self.last_integral = integrator.integrate(component, lambda, 0.0, t, cancel)?;
            self.last_t = t;
        }
        Ok(self.last_integral)
    }
}
