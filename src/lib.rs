//! Analysis core for an exploratory data workbench.
//!
//! A transport layer (HTTP front end, notebook bridge, ...) holds one
//! [`Workbench`] and calls four operations on it:
//!
//! ```text
//!   ingest(bytes) ──► DatasetStore ──┬──► profile(include_all) ─► ProfileReport
//!                                    ├──► render(request)       ─► PNG bytes
//!                                    └──► run_regression(target)─► RegressionResult
//! ```
//!
//! ```no_run
//! use rusty_eda::{ChartRequest, Workbench};
//!
//! # fn main() -> rusty_eda::Result<()> {
//! let bench = Workbench::new();
//! bench.ingest(b"x,y\n1,2\n2,4\n3,6\n4,8\n5,10\n")?;
//! let report = bench.profile(true)?;
//! let heatmap = bench.render(&ChartRequest::Correlation)?;
//! let fit = bench.run_regression("y")?;
//! let fit_png = bench.render(&ChartRequest::RegressionFit(fit))?;
//! # let _ = (report, heatmap, fit_png);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod regression;
pub mod state;
pub mod stats;

pub use app::Workbench;
pub use chart::{ChartKind, ChartRequest};
pub use config::AnalysisConfig;
pub use data::model::{Column, DType, Dataset, Value};
pub use error::{AnalysisError, Result};
pub use regression::RegressionResult;
pub use state::DatasetStore;
pub use stats::ProfileReport;
