use std::collections::BTreeMap;

use log::info;
use plotters::prelude::*;

use super::{draw_png, padded_range, FONT};
use crate::config::AnalysisConfig;
use crate::data::model::{Column, Dataset, Value};
use crate::error::Result;
use crate::regression::RegressionResult;

/// Plot positions for one column: numeric values as-is, anything else at
/// the index of its value among the column's sorted distinct values.
struct Axis {
    positions: Vec<Option<f64>>,
    /// Category names by position, empty for numeric columns.
    categories: Vec<String>,
}

impl Axis {
    fn from_column(col: &Column) -> Self {
        if col.is_numeric() {
            return Axis {
                positions: col.numeric_values(),
                categories: Vec::new(),
            };
        }

        let index: BTreeMap<&Value, usize> = col
            .values
            .iter()
            .filter(|v| !v.is_missing())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();
        let positions = col
            .values
            .iter()
            .map(|v| index.get(v).map(|&i| i as f64))
            .collect();
        let categories = index.keys().map(|v| v.to_string()).collect();
        Axis {
            positions,
            categories,
        }
    }

    fn label(&self, position: f64) -> String {
        if self.categories.is_empty() {
            return format_tick(position);
        }
        let nearest = position.round();
        if (position - nearest).abs() > 1e-6 || nearest < 0.0 {
            return String::new();
        }
        self.categories
            .get(nearest as usize)
            .cloned()
            .unwrap_or_default()
    }
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 1e4 || (v != 0.0 && v.abs() < 1e-2) {
        format!("{v:.2e}")
    } else {
        format!("{}", (v * 100.0).round() / 100.0)
    }
}

/// Scatter of two dataset columns. Rows missing either value are skipped.
pub(super) fn render_columns(
    dataset: &Dataset,
    x_name: &str,
    y_name: &str,
    config: &AnalysisConfig,
) -> Result<Vec<u8>> {
    let x_axis = Axis::from_column(dataset.require_column(x_name)?);
    let y_axis = Axis::from_column(dataset.require_column(y_name)?);

    let points: Vec<(f64, f64)> = x_axis
        .positions
        .iter()
        .zip(&y_axis.positions)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));
    let title = format!("{y_name} vs {x_name}");

    let png = draw_png(config.chart_width, config.chart_height, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 24))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(72)
            .build_cartesian_2d(x_range, y_range)?;

        let x_fmt = |v: &f64| x_axis.label(*v);
        let y_fmt = |v: &f64| y_axis.label(*v);
        chart
            .configure_mesh()
            .x_desc(x_name)
            .y_desc(y_name)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style((FONT, 13))
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, BLUE.mix(0.6).filled())),
        )?;
        Ok(())
    })?;

    info!(
        "Rendered scatter of '{y_name}' vs '{x_name}' with {} point(s) ({} bytes)",
        points.len(),
        png.len()
    );
    Ok(png)
}

/// Actual (x) against predicted (y) with a y = x reference line.
pub(super) fn render_fit(result: &RegressionResult, config: &AnalysisConfig) -> Result<Vec<u8>> {
    let points: Vec<(f64, f64)> = result
        .actuals
        .iter()
        .copied()
        .zip(result.predictions.iter().copied())
        .collect();
    let range = padded_range(points.iter().flat_map(|&(a, p)| [a, p]));
    let title = format!(
        "Actual vs predicted '{}' (R² = {:.3})",
        result.target, result.r2
    );

    let png = draw_png(config.chart_width, config.chart_height, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&title, (FONT, 24))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(72)
            .build_cartesian_2d(range.clone(), range.clone())?;

        chart
            .configure_mesh()
            .x_desc("Actual")
            .y_desc("Predicted")
            .label_style((FONT, 13))
            .draw()?;

        chart.draw_series(LineSeries::new(
            [(range.start, range.start), (range.end, range.end)],
            RED.stroke_width(2),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, BLUE.mix(0.7).filled())),
        )?;
        Ok(())
    })?;

    info!(
        "Rendered regression fit for '{}' ({} bytes)",
        result.target,
        png.len()
    );
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::{has_ink, png_dimensions};
    use crate::data::loader::parse_csv;
    use crate::error::AnalysisError;
    use crate::regression;

    #[test]
    fn test_unknown_column_is_rejected() {
        let ds = parse_csv(b"a,b\n1,2\n").unwrap();
        assert!(matches!(
            render_columns(&ds, "a", "zzz", &AnalysisConfig::default()),
            Err(AnalysisError::UnknownColumn(name)) if name == "zzz"
        ));
        assert!(matches!(
            render_columns(&ds, "nope", "b", &AnalysisConfig::default()),
            Err(AnalysisError::UnknownColumn(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_numeric_scatter_renders() {
        let ds = parse_csv(b"a,b\n1,2\n2,\n3,5\n").unwrap();
        let config = AnalysisConfig::default();
        let png = render_columns(&ds, "a", "b", &config).unwrap();
        assert_eq!(
            png_dimensions(&png),
            (config.chart_width, config.chart_height)
        );
    }

    #[test]
    fn test_categorical_axis_positions() {
        let ds = parse_csv(b"group,v\nb,1\na,2\n,3\nb,4\n").unwrap();
        let axis = Axis::from_column(ds.column("group").unwrap());
        assert_eq!(axis.positions, vec![Some(1.0), Some(0.0), None, Some(1.0)]);
        assert_eq!(axis.label(0.0), "a");
        assert_eq!(axis.label(1.0), "b");
        assert_eq!(axis.label(0.5), "");
        assert!(render_columns(&ds, "group", "v", &AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn test_regression_fit_renders() {
        let ds = parse_csv(b"x,y\n1,2\n2,4\n3,6\n4,8\n5,10\n6,12\n").unwrap();
        let config = AnalysisConfig::default();
        let result = regression::run(&ds, "y", &config).unwrap();
        let png = render_fit(&result, &config).unwrap();
        assert_eq!(
            png_dimensions(&png),
            (config.chart_width, config.chart_height)
        );
        // The R² title sits in the band above the plot area.
        assert!(has_ink(&png, 0..config.chart_width, 0..40));
    }

    #[test]
    fn test_tick_format() {
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(0.125), "0.13");
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(12345.0), "1.23e4");
    }
}
