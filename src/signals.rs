//! # Degradation Signals
//!
//! Time-indexed degradation signals supplied by an external provider
//! (historian, CMMS, condition monitoring). Each signal is a pure function
//! of time evaluable anywhere inside the component's analyzed horizon.
//!
//! Signals are typed, required fields: a missing signal at a requested t is
//! an [`SilError::Input`] naming the component and the signal, never an
//! undefined-key failure deep inside the hazard formula.

use crate::error::{SignalKind, SilError, SilResult};

/// A time series evaluable at arbitrary t (hours).
///
/// Returns `None` where the series is undefined (outside the sampled
/// horizon); the engine turns that into an `InputError` for the query.
pub trait TimeSeries: Send + Sync {
    /// Value at time t (hours), or `None` if undefined there.
    fn evaluate(&self, t: f64) -> Option<f64>;
}

/// Constant-valued series, defined for all t ≥ 0.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSeries(pub f64);

impl TimeSeries for ConstantSeries {
    fn evaluate(&self, t: f64) -> Option<f64> {
        if t >= 0.0 {
            Some(self.0)
        } else {
            None
        }
    }
}

/// Any closure of time works as a series (defined for all t ≥ 0).
impl<F> TimeSeries for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, t: f64) -> Option<f64> {
        if t >= 0.0 {
            Some(self(t))
        } else {
            None
        }
    }
}

/// Piecewise-linear series over externally supplied samples.
///
/// Defined only on [first_t, last_t]; queries outside return `None`.
#[derive(Debug, Clone)]
pub struct SampledSeries {
    samples: Vec<(f64, f64)>,
}

impl SampledSeries {
    /// Build from (t, value) samples. Samples are sorted by time;
    /// returns `None` if fewer than one sample is given.
    pub fn new(mut samples: Vec<(f64, f64)>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self { samples })
    }

    /// Time span covered by the samples.
    pub fn horizon(&self) -> (f64, f64) {
        (self.samples[0].0, self.samples[self.samples.len() - 1].0)
    }
}

impl TimeSeries for SampledSeries {
    fn evaluate(&self, t: f64) -> Option<f64> {
        let (t_first, t_last) = self.horizon();
        if t < t_first || t > t_last {
            return None;
        }
        // Binary search for the bracketing pair, then linear interpolation.
        let idx = self
            .samples
            .partition_point(|&(ts, _)| ts <= t)
            .saturating_sub(1);
        let (t0, v0) = self.samples[idx];
        if idx + 1 >= self.samples.len() || (t - t0).abs() < f64::EPSILON {
            return Some(v0);
        }
        let (t1, v1) = self.samples[idx + 1];
        let frac = (t - t0) / (t1 - t0);
        Some(v0 + frac * (v1 - v0))
    }
}

/// The six required degradation signals of a component.
///
/// Configuration is owned by the caller and immutable during a query; new
/// samples arrive by replacing a series between queries.
pub struct DegradationSignals {
    /// Accumulated operating age (hours).
    pub age: Box<dyn TimeSeries>,
    /// Accumulated demand/operation cycles.
    pub cycle_count: Box<dyn TimeSeries>,
    /// Environmental severity multiplier (1 = nominal).
    pub environment_factor: Box<dyn TimeSeries>,
    /// Stress multiplier (1 = nominal).
    pub stress_factor: Box<dyn TimeSeries>,
    /// Maintenance quality in (0, 1]; a divisor, guarded with a floor.
    pub maintenance_quality: Box<dyn TimeSeries>,
    /// Fraction of failures detectable online, in [0, 1].
    pub diagnostic_coverage: Box<dyn TimeSeries>,
}

impl std::fmt::Debug for DegradationSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DegradationSignals").finish_non_exhaustive()
    }
}

impl DegradationSignals {
    /// Nominal profile: age tracks calendar time, no cycling, unit
    /// environment/stress/maintenance, no diagnostic credit.
    pub fn nominal() -> Self {
        Self {
            age: Box::new(|t: f64| t),
            cycle_count: Box::new(ConstantSeries(0.0)),
            environment_factor: Box::new(ConstantSeries(1.0)),
            stress_factor: Box::new(ConstantSeries(1.0)),
            maintenance_quality: Box::new(ConstantSeries(1.0)),
            diagnostic_coverage: Box::new(ConstantSeries(0.0)),
        }
    }

    /// Sample all six signals at t, failing with `InputError` on the first
    /// signal undefined there.
    pub fn sample(&self, component: &str, t: f64) -> SilResult<SignalSnapshot> {
        let get = |series: &dyn TimeSeries, kind: SignalKind| -> SilResult<f64> {
            series.evaluate(t).ok_or_else(|| SilError::Input {
                component: component.to_string(),
                signal: kind,
                t,
            })
        };
        Ok(SignalSnapshot {
            t,
            age: get(self.age.as_ref(), SignalKind::Age)?,
            cycle_count: get(self.cycle_count.as_ref(), SignalKind::CycleCount)?,
            environment_factor: get(
                self.environment_factor.as_ref(),
                SignalKind::EnvironmentFactor,
            )?,
            stress_factor: get(self.stress_factor.as_ref(), SignalKind::StressFactor)?,
            maintenance_quality: get(
                self.maintenance_quality.as_ref(),
                SignalKind::MaintenanceQuality,
            )?,
            diagnostic_coverage: get(
                self.diagnostic_coverage.as_ref(),
                SignalKind::DiagnosticCoverage,
            )?,
        })
    }
}

/// All degradation signals of one component at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSnapshot {
    /// Query time (hours).
    pub t: f64,
    pub age: f64,
    pub cycle_count: f64,
    pub environment_factor: f64,
    pub stress_factor: f64,
    pub maintenance_quality: f64,
    pub diagnostic_coverage: f64,
}
