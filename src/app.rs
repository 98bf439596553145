use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::chart::{self, ChartKind, ChartRequest};
use crate::config::AnalysisConfig;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};
use crate::regression::{self, RegressionResult};
use crate::state::DatasetStore;
use crate::stats::{self, ProfileReport};

// ---------------------------------------------------------------------------
// Workbench: the surface a transport layer calls
// ---------------------------------------------------------------------------

/// Owns the active-dataset slot and the configuration, and exposes the
/// four analysis operations.
///
/// All operations take `&self`; share one workbench behind an `Arc` to
/// serve concurrent requests.
#[derive(Debug, Default)]
pub struct Workbench {
    store: DatasetStore,
    config: AnalysisConfig,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: DatasetStore::new(),
            config,
        })
    }

    /// Parse CSV bytes and make them the active dataset.
    pub fn ingest(&self, bytes: &[u8]) -> Result<Arc<Dataset>> {
        loader::ingest(&self.store, bytes)
    }

    /// Profile the active dataset.
    pub fn profile(&self, include_all: bool) -> Result<ProfileReport> {
        let dataset = self.store.get()?;
        Ok(stats::profile(&dataset, include_all, self.config.preview_rows))
    }

    /// Render a chart as PNG bytes. Regression fits carry their own data and
    /// do not need an active dataset.
    pub fn render(&self, request: &ChartRequest) -> Result<Vec<u8>> {
        debug!("Rendering '{}' chart", request.kind());
        if let ChartRequest::RegressionFit(result) = request {
            return chart::render_regression_fit(result, &self.config);
        }
        let dataset = self.store.get()?;
        chart::render(&dataset, request, &self.config)
    }

    /// Render from transport-level strings.
    ///
    /// `scatter` reads the `xcol` and `ycol` parameters; `regression-fit`
    /// reads `target` and runs the regression demo first.
    pub fn render_kind(&self, kind: &str, params: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let param = |key: &str| {
            params
                .get(key)
                .cloned()
                .ok_or_else(|| AnalysisError::MissingParameter(key.to_string()))
        };

        let request = match kind.parse::<ChartKind>()? {
            ChartKind::Histogram => ChartRequest::Histogram,
            ChartKind::Correlation => ChartRequest::Correlation,
            ChartKind::Scatter => ChartRequest::scatter(param("xcol")?, param("ycol")?),
            ChartKind::RegressionFit => {
                ChartRequest::RegressionFit(self.run_regression(&param("target")?)?)
            }
        };
        self.render(&request)
    }

    /// Fit and score a linear model predicting `target` from the other
    /// numeric columns of the active dataset.
    pub fn run_regression(&self, target: &str) -> Result<RegressionResult> {
        let dataset = self.store.get()?;
        regression::run(&dataset, target, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_operations_need_a_dataset() {
        let bench = Workbench::new();
        assert!(matches!(bench.profile(true), Err(AnalysisError::NoActiveDataset)));
        for request in [
            ChartRequest::Histogram,
            ChartRequest::Correlation,
            ChartRequest::scatter("a", "b"),
        ] {
            assert!(matches!(
                bench.render(&request),
                Err(AnalysisError::NoActiveDataset)
            ));
        }
        for (kind, pairs) in [
            ("hist", &[][..]),
            ("corr", &[][..]),
            ("scatter", &[("xcol", "a"), ("ycol", "b")][..]),
            ("regression-fit", &[("target", "y")][..]),
        ] {
            assert!(matches!(
                bench.render_kind(kind, &params(pairs)),
                Err(AnalysisError::NoActiveDataset)
            ));
        }
        assert!(matches!(
            bench.run_regression("y"),
            Err(AnalysisError::NoActiveDataset)
        ));
    }

    #[test]
    fn test_render_kind_parameters() {
        let bench = Workbench::new();
        bench.ingest(b"a,b\n1,2\n2,3\n3,5\n4,4\n5,7\n").unwrap();

        assert!(bench.render_kind("scatter", &params(&[("xcol", "a"), ("ycol", "b")])).is_ok());
        assert!(matches!(
            bench.render_kind("scatter", &params(&[("xcol", "a")])),
            Err(AnalysisError::MissingParameter(p)) if p == "ycol"
        ));
        assert!(matches!(
            bench.render_kind("pie", &params(&[])),
            Err(AnalysisError::UnknownChartKind(_))
        ));
        assert!(bench.render_kind("regression-fit", &params(&[("target", "b")])).is_ok());
    }

    #[test]
    fn test_regression_fit_needs_no_store() {
        let source = Workbench::new();
        source.ingest(b"x,y\n1,2\n2,4\n3,6\n4,8\n5,10\n").unwrap();
        let result = source.run_regression("y").unwrap();

        let empty = Workbench::new();
        assert!(empty.render(&ChartRequest::RegressionFit(result)).is_ok());
    }

    #[test]
    fn test_with_config_validates() {
        let bad = AnalysisConfig {
            hist_bins: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(Workbench::with_config(bad), Err(AnalysisError::Config(_))));
    }
}
