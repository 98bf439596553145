use log::info;
use plotters::prelude::*;

use super::{draw_png, FONT};
use crate::color::generate_palette;
use crate::config::AnalysisConfig;
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};
use crate::stats::describe::Histogram;

/// Near-square grid for `n` panels: (rows, cols).
fn grid_shape(n: usize) -> (usize, usize) {
    let cols = (n as f64).sqrt().ceil().max(1.0) as usize;
    let rows = n.div_ceil(cols).max(1);
    (rows, cols)
}

/// Histogram grid, one panel per numeric column. Other columns are skipped.
pub(super) fn render(dataset: &Dataset, config: &AnalysisConfig) -> Result<Vec<u8>> {
    let numeric = dataset.numeric_columns();
    if numeric.is_empty() {
        return Err(AnalysisError::InsufficientNumericColumns {
            required: 1,
            found: 0,
        });
    }

    let (rows, cols) = grid_shape(numeric.len());
    let width = config.subplot_size * cols as u32;
    let height = config.subplot_size * rows as u32;
    let colors = generate_palette(numeric.len());

    let png = draw_png(width, height, |root| {
        let panels = root.split_evenly((rows, cols));
        for ((col, area), color) in numeric.iter().zip(panels.iter()).zip(&colors) {
            let hist = Histogram::build(&col.present_f64(), config.hist_bins);
            let x_range = hist.edges[0]..hist.edges[hist.edges.len() - 1];
            let y_max = (hist.max_count().max(1) as f64) * 1.1;

            let mut chart = ChartBuilder::on(area)
                .caption(&col.name, (FONT, 16))
                .margin(8)
                .x_label_area_size(24)
                .y_label_area_size(36)
                .build_cartesian_2d(x_range, 0f64..y_max)?;

            chart
                .configure_mesh()
                .x_labels(5)
                .y_labels(5)
                .label_style((FONT, 11))
                .draw()?;

            chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                    color.filled(),
                )
            }))?;
        }
        Ok(())
    })?;

    info!(
        "Rendered histogram grid for {} numeric column(s) ({} bytes)",
        numeric.len(),
        png.len()
    );
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::png_dimensions;
    use crate::data::loader::parse_csv;

    #[test]
    fn test_grid_shape() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (1, 2));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (2, 3));
        assert_eq!(grid_shape(10), (3, 4));
    }

    #[test]
    fn test_skips_non_numeric_columns() {
        let ds = parse_csv(b"a,label,b,c\n1,x,2.5,3\n2,y,3.5,\n4,z,1.0,7\n").unwrap();
        let config = AnalysisConfig::default();
        let png = render(&ds, &config).unwrap();
        // Three numeric columns fit a 2 x 2 grid.
        assert_eq!(
            png_dimensions(&png),
            (config.subplot_size * 2, config.subplot_size * 2)
        );
    }

    #[test]
    fn test_requires_a_numeric_column() {
        let ds = parse_csv(b"label\nx\ny\n").unwrap();
        assert!(matches!(
            render(&ds, &AnalysisConfig::default()),
            Err(AnalysisError::InsufficientNumericColumns { required: 1, found: 0 })
        ));
    }

    #[test]
    fn test_all_missing_column_still_renders() {
        let ds = parse_csv(b"a,b\n1,\n2,\n").unwrap();
        assert!(render(&ds, &AnalysisConfig::default()).is_ok());
    }
}
