use log::info;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{draw_png, FONT};
use crate::color::{diverging, text_on};
use crate::config::AnalysisConfig;
use crate::data::model::Dataset;
use crate::error::Result;
use crate::stats::CorrelationMatrix;

fn annotation(value: Option<f64>) -> String {
    match value {
        Some(r) => format!("{r:.2}"),
        None => "nan".to_string(),
    }
}

/// Annotated correlation heatmap over the numeric columns.
pub(super) fn render(dataset: &Dataset, config: &AnalysisConfig) -> Result<Vec<u8>> {
    let matrix = CorrelationMatrix::from_dataset(dataset)?;
    let n = matrix.len() as i32;

    let png = draw_png(config.chart_width, config.chart_height, |root| {
        // Row 0 sits at the top.
        let mut chart = ChartBuilder::on(root)
            .caption("Correlation heatmap", (FONT, 24))
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(0..n, n..0)?;

        chart.draw_series((0..n).flat_map(|row| {
            let matrix = &matrix;
            (0..n).map(move |col| {
                let fill = diverging(matrix.get(row as usize, col as usize));
                Rectangle::new([(col, row), (col + 1, row + 1)], fill.filled())
            })
        }))?;

        // Cell annotations and axis labels are placed in pixel space.
        let corner_a = chart.backend_coord(&(0, 0));
        let corner_b = chart.backend_coord(&(n, n));
        let cell_w = (corner_b.0 - corner_a.0).abs() / n.max(1);
        let cell_h = (corner_b.1 - corner_a.1).abs() / n.max(1);
        let font_size = (cell_w.min(cell_h) / 4).clamp(8, 18);
        let left = corner_a.0.min(corner_b.0);
        let bottom = corner_a.1.max(corner_b.1);

        let mut labels = Vec::new();
        for row in 0..n {
            for col in 0..n {
                let a = chart.backend_coord(&(col, row));
                let b = chart.backend_coord(&(col + 1, row + 1));
                let value = matrix.get(row as usize, col as usize);
                labels.push((
                    annotation(value),
                    ((a.0 + b.0) / 2, (a.1 + b.1) / 2),
                    text_on(diverging(value)),
                    HPos::Center,
                ));
            }
            let a = chart.backend_coord(&(0, row));
            let b = chart.backend_coord(&(0, row + 1));
            labels.push((
                matrix.names[row as usize].clone(),
                (left - 6, (a.1 + b.1) / 2),
                BLACK,
                HPos::Right,
            ));
        }
        for col in 0..n {
            let a = chart.backend_coord(&(col, 0));
            let b = chart.backend_coord(&(col + 1, 0));
            labels.push((
                matrix.names[col as usize].clone(),
                ((a.0 + b.0) / 2, bottom + 14),
                BLACK,
                HPos::Center,
            ));
        }

        for (text, pos, color, h_pos) in labels {
            let style = (FONT, font_size)
                .into_font()
                .color(&color)
                .pos(Pos::new(h_pos, VPos::Center));
            root.draw(&Text::new(text, pos, style))?;
        }
        Ok(())
    })?;

    info!(
        "Rendered {n}x{n} correlation heatmap ({} bytes)",
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

    #[test]
    fn test_renders_with_two_numeric_columns() {
        let ds = parse_csv(b"a,b,label\n1,2,x\n2,5,y\n3,4,z\n").unwrap();
        let config = AnalysisConfig::default();
        let png = render(&ds, &config).unwrap();
        assert_eq!(
            png_dimensions(&png),
            (config.chart_width, config.chart_height)
        );
    }

    #[test]
    fn test_fails_below_two_numeric_columns() {
        for csv in [&b"label\nx\n"[..], &b"a,label\n1,x\n"[..]] {
            let ds = parse_csv(csv).unwrap();
            assert!(matches!(
                render(&ds, &AnalysisConfig::default()),
                Err(AnalysisError::InsufficientNumericColumns { required: 2, .. })
            ));
        }
    }

    #[test]
    fn test_undefined_coefficients_still_render() {
        let ds = parse_csv(b"a,b\n1,7\n2,7\n").unwrap();
        let config = AnalysisConfig::default();
        let png = render(&ds, &config).unwrap();

        assert!(has_ink(&png, 0..config.chart_width, 0..40), "title");
        // Row labels sit left of the cells.
        assert!(has_ink(&png, 0..130, 60..720), "row labels");
        // Bottom-right cell is undefined: grey fill with a dark "nan".
        assert!(has_ink(&png, 740..800, 520..590), "annotation");
    }

    #[test]
    fn test_annotation_format() {
        assert_eq!(annotation(Some(0.12345)), "0.12");
        assert_eq!(annotation(Some(-1.0)), "-1.00");
        assert_eq!(annotation(None), "nan");
    }
}
