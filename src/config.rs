use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Constants of the startup pipeline. None of these are user-tunable per
/// interaction; they are fixed when the [`Dashboard`](crate::state::Dashboard)
/// is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of rows kept by the loader.
    pub sample_size: usize,
    /// Seed shared by sampling and synthetic coordinate generation.
    pub seed: u64,
    /// Half-open latitude range `[lo, hi)` for synthetic coordinates.
    pub lat_range: (f64, f64),
    /// Half-open longitude range `[lo, hi)` for synthetic coordinates.
    pub lon_range: (f64, f64),
    /// Neighbourhood radius, in standardized units.
    pub eps: f64,
    /// Minimum neighbourhood size (self included) of a core point.
    pub min_samples: usize,
    /// Number of equal-width bins of the distance histogram.
    pub distance_bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_size: 50_000,
            seed: 42,
            lat_range: (40.55, 40.90),
            lon_range: (-74.15, -73.80),
            eps: 0.15,
            min_samples: 40,
            distance_bins: 30,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.eps > 0.0) || !self.eps.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "eps must be a positive finite number, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(PipelineError::InvalidConfig(
                "min_samples must be at least 1".into(),
            ));
        }
        if self.distance_bins == 0 {
            return Err(PipelineError::InvalidConfig(
                "distance_bins must be at least 1".into(),
            ));
        }
        for (name, (lo, hi)) in [("lat_range", self.lat_range), ("lon_range", self.lon_range)] {
            if !(lo.is_finite() && hi.is_finite() && (hi - lo).is_finite() && lo < hi) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be a finite range with lo < hi, got [{lo}, {hi})"
                )));
            }
        }
        Ok(())
    }
}
