//! # SILTIME-RS
//!
//! Time-Dependent Safety Integrity Level Engine
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                             SILTIME-RS                                      │
//! │            SIL(t) Engine for Instrumented Protective Loops                  │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  signals    degradation time series (age, cycles, env, stress, maint, DC)  │
//! │  hazard     λ(t) strategy models (multiplicative degradation)              │
//! │  integrate  adaptive quadrature → R(t), F(t)                               │
//! │  integrity  PFDavg (exact / λ·T/2) and PFH per component                   │
//! │  aggregate  series combination per loop architecture                       │
//! │  band       IEC 61508 decade tables → SIL 0..4                             │
//! │  mission    weakest-link horizon + validity gates                          │
//! │  engine     parallel fan-out, retry, reporting                             │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine replaces a single static SIL classification with a continuously
//! recalculated integrity value: per-component degradation signals become
//! time-varying hazard rates, hazard rates integrate into reliability curves,
//! curves reduce to PFDavg/PFH, loop aggregation and decade banding yield
//! SIL(t), and a validity check gates the claim against the target level and
//! the loop's mission time.
//!
//! Signal ingestion, storage, and dashboards are external collaborators:
//! they supply [`signals::TimeSeries`] accessors and consume
//! [`engine::SilReport`]s.
//!
//! ## References
//!
//! [1] IEC 61508: Functional Safety
//! [2] IEC 61511: Safety Instrumented Systems for the Process Industry

pub mod aggregate;
pub mod band;
pub mod component;
pub mod engine;
pub mod error;
pub mod hazard;
pub mod integrate;
pub mod integrity;
pub mod mission;
pub mod signals;

// Re-exports
pub use aggregate::{AggregationStrategy, Architecture, SeriesAggregation, SilLoop};
pub use band::{sil_for, sil_from_pfdavg, sil_from_pfh, SilBand};
pub use component::{Component, DemandMode};
pub use engine::{EngineConfig, SilEngine, SilReport};
pub use error::{ConfigReason, GuardEvent, NumericalReason, SignalKind, SilError, SilResult};
pub use hazard::{hazard_at, HazardModel, HazardValue, MultiplicativeHazard, DIVISOR_FLOOR};
pub use integrate::{
    CancelToken, HazardIntegralCache, IntegratorConfig, ReliabilityIntegrator,
};
pub use integrity::{
    ComponentIntegrity, IntegrityCalculator, IntegrityMeasure, PfdMethod,
    APPROX_MAX_RELATIVE_DRIFT,
};
pub use mission::{check_validity, loop_mission_time, ReasonCode, ValidityResult};
pub use signals::{ConstantSeries, DegradationSignals, SampledSeries, SignalSnapshot, TimeSeries};

/// SILTIME version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
