use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use super::describe::{mean, quantile_sorted, sample_std};
use crate::data::model::{Column, DType, Dataset, Value};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Descriptive statistics, dtype and missing-value inventory for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub n_rows: usize,
    pub n_columns: usize,
    pub columns: Vec<ColumnProfile>,
    pub preview: Preview,
}

/// Per-column entry of a [`ProfileReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: DType,
    pub missing: usize,
    /// Absent for categorical columns unless the profile includes all columns.
    pub summary: Option<ColumnSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

/// Statistics over the non-missing values of a numeric column.
/// Undefined entries (e.g. `std` of a single value) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// The first rows of the dataset rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Profiling
// ---------------------------------------------------------------------------

/// Profile `dataset`. Pure: the same dataset always yields the same report.
///
/// With `include_all` false only numeric columns get a summary; the others
/// still report dtype and missing count.
pub fn profile(dataset: &Dataset, include_all: bool, preview_rows: usize) -> ProfileReport {
    let columns = dataset
        .columns()
        .iter()
        .map(|col| ColumnProfile {
            name: col.name.clone(),
            dtype: col.dtype,
            missing: col.missing_count(),
            summary: summarize(col, include_all),
        })
        .collect();

    let report = ProfileReport {
        n_rows: dataset.len(),
        n_columns: dataset.n_columns(),
        columns,
        preview: preview(dataset, preview_rows),
    };
    debug!(
        "Profiled {} columns (include_all = {include_all})",
        report.n_columns
    );
    report
}

fn summarize(col: &Column, include_all: bool) -> Option<ColumnSummary> {
    if col.is_numeric() {
        Some(ColumnSummary::Numeric(numeric_summary(col)))
    } else if include_all {
        Some(ColumnSummary::Categorical(categorical_summary(col)))
    } else {
        None
    }
}

pub fn numeric_summary(col: &Column) -> NumericSummary {
    let mut values = col.present_f64();
    values.sort_by(f64::total_cmp);

    NumericSummary {
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q25: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Count, distinct count and the most frequent value. Ties go to the value
/// seen first.
pub fn categorical_summary(col: &Column) -> CategoricalSummary {
    // value -> (frequency, first row index)
    let mut counts: HashMap<&Value, (usize, usize)> = HashMap::new();
    for (idx, value) in col.values.iter().enumerate() {
        if value.is_missing() {
            continue;
        }
        counts.entry(value).or_insert((0, idx)).0 += 1;
    }

    let top = counts
        .iter()
        .max_by(|(_, (fa, ia)), (_, (fb, ib))| fa.cmp(fb).then(ib.cmp(ia)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    CategoricalSummary {
        count: counts.values().map(|(f, _)| f).sum(),
        unique: counts.len(),
        freq: top.as_ref().map(|(_, f)| *f).unwrap_or(0),
        top: top.map(|(v, _)| v),
    }
}

fn preview(dataset: &Dataset, n: usize) -> Preview {
    let headers = dataset
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let rows = (0..dataset.len().min(n))
        .filter_map(|idx| dataset.row(idx))
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    Preview { headers, rows }
}
