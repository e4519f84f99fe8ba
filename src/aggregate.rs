//! # Loop Aggregation
//!
//! Combines component-level integrity values into a loop-level value per
//! architecture. Series combination is the only architecture shipped:
//! loop-level λ, PFDavg, and PFH are each the sum of the component values.
//! Voting architectures (1oo2, 2oo3, koon) slot in later as additional
//! [`AggregationStrategy`] implementations without touching the series path
//! or the band/validity contracts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::band::SilBand;
use crate::component::{Component, DemandMode};
use crate::error::{ConfigReason, SilError, SilResult};

/// Redundancy configuration of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// All components in series; any single dangerous failure defeats the
    /// function.
    Series,
}

impl Architecture {
    /// Strategy implementing this architecture's combination rule.
    pub fn strategy(&self) -> &'static dyn AggregationStrategy {
        match self {
            Architecture::Series => &SeriesAggregation,
        }
    }
}

impl FromStr for Architecture {
    type Err = SilError;

    fn from_str(tag: &str) -> SilResult<Self> {
        match tag {
            "series" => Ok(Architecture::Series),
            other => Err(SilError::Config {
                reason: ConfigReason::UnknownArchitecture(other.to_string()),
            }),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::Series => write!(f, "series"),
        }
    }
}

/// Read-only reduction of immutable per-component values into one
/// loop-level value.
pub trait AggregationStrategy: Send + Sync {
    /// Combine per-component integrity values (all the same measure).
    fn combine(&self, values: &[f64]) -> f64;

    /// Tag for reports.
    fn name(&self) -> &'static str;
}

/// Series combination: plain summation.
pub struct SeriesAggregation;

impl AggregationStrategy for SeriesAggregation {
    fn combine(&self, values: &[f64]) -> f64 {
        values.iter().sum()
    }

    fn name(&self) -> &'static str {
        "series"
    }
}

/// An instrumented protective loop under analysis.
#[derive(Debug)]
pub struct SilLoop {
    /// Loop identity, e.g. "SIF-204".
    pub id: String,
    /// Redundancy configuration.
    pub architecture: Architecture,
    /// Required integrity band.
    pub target: SilBand,
    /// Member components, analyzed together.
    pub components: Vec<Component>,
}

impl SilLoop {
    /// Create and validate a loop configuration.
    pub fn new(
        id: impl Into<String>,
        architecture: Architecture,
        target_level: u8,
        components: Vec<Component>,
    ) -> SilResult<Self> {
        let sil_loop = Self {
            id: id.into(),
            architecture,
            target: SilBand::from_level(target_level)?,
            components,
        };
        sil_loop.validate()?;
        Ok(sil_loop)
    }

    /// Check loop-level invariants (plus every member's).
    pub fn validate(&self) -> SilResult<()> {
        if self.components.is_empty() {
            return Err(SilError::Config {
                reason: ConfigReason::EmptyLoop(self.id.clone()),
            });
        }
        let mode = self.components[0].demand_mode;
        if self.components.iter().any(|c| c.demand_mode != mode) {
            // Summing PFDavg with PFH would silently understate risk.
            return Err(SilError::Config {
                reason: ConfigReason::MixedDemandModes(self.id.clone()),
            });
        }
        for component in &self.components {
            component.validate()?;
        }
        Ok(())
    }

    /// Demand mode shared by all members (validated).
    pub fn demand_mode(&self) -> DemandMode {
        self.components[0].demand_mode
    }
}
