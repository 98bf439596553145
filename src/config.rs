use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Analysis configuration
// ---------------------------------------------------------------------------

/// Tunables for profiling, charting and the regression demo.
///
/// Every field has a default, so a JSON document only needs the keys it
/// wants to override:
///
/// ```json
/// { "preview_rows": 10, "hist_bins": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rows shown in the profile preview.
    pub preview_rows: usize,
    /// Buckets per histogram.
    pub hist_bins: usize,
    /// Share of rows held out for scoring, in (0, 1).
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    /// Canvas size for single-panel charts, in pixels.
    pub chart_width: u32,
    pub chart_height: u32,
    /// Edge length of one histogram cell in the grid.
    pub subplot_size: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            hist_bins: 10,
            test_fraction: 0.2,
            split_seed: 42,
            chart_width: 1000,
            chart_height: 800,
            subplot_size: 320,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| AnalysisError::config(format!("parsing JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hist_bins == 0 {
            return Err(AnalysisError::config("hist_bins must be at least 1"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(AnalysisError::config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.chart_width < 100 || self.chart_height < 100 || self.subplot_size < 100 {
            return Err(AnalysisError::config(
                "chart dimensions must be at least 100 pixels",
            ));
        }
        Ok(())
    }
}
