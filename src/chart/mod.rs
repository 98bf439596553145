//! PNG chart rendering.
//!
//! Every render allocates its own RGB pixel buffer, draws on it with
//! `plotters` and encodes it with `image`. Nothing is shared between calls
//! and nothing touches the file system.

mod heatmap;
mod hist;
mod scatter;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::debug;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::config::AnalysisConfig;
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};
use crate::regression::RegressionResult;

/// Font family used for titles and labels.
pub(crate) const FONT: &str = "sans-serif";

/// DejaVu Sans, compiled in so rendering does not depend on system fonts.
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register the bundled typeface under [`FONT`] once per process.
fn ensure_font() -> Result<()> {
    let registered = *FONT_REGISTERED.get_or_init(|| {
        let ok = register_font(FONT, FontStyle::Normal, FONT_BYTES).is_ok();
        debug!("Registered bundled font '{FONT}': {ok}");
        ok
    });
    if registered {
        Ok(())
    } else {
        Err(AnalysisError::Render("bundled font could not be parsed".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Chart selection
// ---------------------------------------------------------------------------

/// The chart kinds a caller can ask for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Histogram,
    Correlation,
    Scatter,
    RegressionFit,
}

impl FromStr for ChartKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hist" => Ok(ChartKind::Histogram),
            "corr" => Ok(ChartKind::Correlation),
            "scatter" => Ok(ChartKind::Scatter),
            "regression-fit" => Ok(ChartKind::RegressionFit),
            other => Err(AnalysisError::UnknownChartKind(other.to_string())),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Histogram => "hist",
            ChartKind::Correlation => "corr",
            ChartKind::Scatter => "scatter",
            ChartKind::RegressionFit => "regression-fit",
        };
        f.write_str(name)
    }
}

/// A chart kind together with the parameters it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartRequest {
    /// One histogram per numeric column, laid out as a grid.
    Histogram,
    /// Annotated Pearson heatmap over the numeric columns.
    Correlation,
    /// Paired values of two columns.
    Scatter { x: String, y: String },
    /// Actual vs. predicted values of a regression run.
    RegressionFit(RegressionResult),
}

impl ChartRequest {
    pub fn scatter(x: impl Into<String>, y: impl Into<String>) -> Self {
        ChartRequest::Scatter {
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::Histogram => ChartKind::Histogram,
            ChartRequest::Correlation => ChartKind::Correlation,
            ChartRequest::Scatter { .. } => ChartKind::Scatter,
            ChartRequest::RegressionFit(_) => ChartKind::RegressionFit,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a dataset chart. Requests that carry their own data (regression
/// fits) ignore `dataset`.
pub fn render(dataset: &Dataset, request: &ChartRequest, config: &AnalysisConfig) -> Result<Vec<u8>> {
    match request {
        ChartRequest::Histogram => hist::render(dataset, config),
        ChartRequest::Correlation => heatmap::render(dataset, config),
        ChartRequest::Scatter { x, y } => scatter::render_columns(dataset, x, y, config),
        ChartRequest::RegressionFit(result) => render_regression_fit(result, config),
    }
}

/// Render actual (x) against predicted (y) values with R² in the title.
pub fn render_regression_fit(result: &RegressionResult, config: &AnalysisConfig) -> Result<Vec<u8>> {
    scatter::render_fit(result, config)
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for AnalysisError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Render(err.to_string())
    }
}

/// Draw onto a fresh white canvas and return it PNG-encoded.
pub(crate) fn draw_png<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    ensure_font()?;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ExtendedColorType::Rgb8)?;
    debug!("Encoded {width}x{height} chart into {} bytes", png.len());
    Ok(png)
}

/// Pad a value range so points do not sit on the frame. A degenerate range
/// is widened to one unit.
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Decode a PNG and return its dimensions.
    pub(crate) fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).unwrap();
        (img.width(), img.height())
    }

    /// Whether any pixel in the box has a channel darker than mid grey.
    pub(crate) fn has_ink(bytes: &[u8], xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .unwrap()
            .to_rgb8();
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .any(|(x, y)| img.get_pixel(x, y).0.iter().any(|&c| c < 128))
    }

    #[test]
    fn test_kind_round_trips_transport_names() {
        for name in ["hist", "corr", "scatter", "regression-fit"] {
            let kind: ChartKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert!(matches!(
            "pie".parse::<ChartKind>(),
            Err(AnalysisError::UnknownChartKind(k)) if k == "pie"
        ));
    }

    #[test]
    fn test_request_kind() {
        assert_eq!(ChartRequest::scatter("a", "b").kind(), ChartKind::Scatter);
        assert_eq!(ChartRequest::Histogram.kind(), ChartKind::Histogram);
    }

    #[test]
    fn test_blank_canvas_encodes() {
        let png = draw_png(120, 100, |_| Ok(())).unwrap();
        assert_eq!(png_dimensions(&png), (120, 100));
        assert!(!has_ink(&png, 0..120, 0..100));
    }

    #[test]
    fn test_text_is_rasterized() {
        let png = draw_png(200, 60, |root| {
            root.draw(&Text::new("R² = 0.5", (10, 20), (FONT, 20).into_font()))?;
            Ok(())
        })
        .unwrap();
        assert!(has_ink(&png, 0..200, 0..60));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([2.0, 2.0]), 1.5..2.5);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        let r = padded_range([0.0, 10.0]);
        assert!(r.start < 0.0 && r.end > 10.0);
    }
}
