//! One-shot linear regression: split, fit, score.

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of a regression run: held-out predictions against actuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub target: String,
    pub features: Vec<String>,
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
    pub r2: f64,
    #[serde(skip)]
    model: LinearModel,
}

impl RegressionResult {
    /// Predict the target for one row of feature values, given in the order
    /// of [`RegressionResult::features`].
    pub fn predict(&self, features: &[f64]) -> Option<f64> {
        (features.len() == self.features.len()).then(|| self.model.predict(features))
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Fit `target` on every other numeric column and score on a held-out split.
///
/// Rows with a missing target or feature are left out. The split is a
/// seeded shuffle, so identical inputs give identical results.
pub fn run(dataset: &Dataset, target: &str, config: &AnalysisConfig) -> Result<RegressionResult> {
    let target_col = dataset.require_column(target)?;
    if !target_col.is_numeric() {
        return Err(AnalysisError::TargetNotNumeric(target.to_string()));
    }

    let feature_cols: Vec<_> = dataset
        .numeric_columns()
        .into_iter()
        .filter(|c| c.name != target)
        .collect();
    if feature_cols.is_empty() {
        return Err(AnalysisError::InsufficientNumericColumns {
            required: 2,
            found: 1,
        });
    }

    let y_all = target_col.numeric_values();
    let x_all: Vec<Vec<Option<f64>>> = feature_cols.iter().map(|c| c.numeric_values()).collect();

    let mut rows: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dataset.len());
    for (idx, y) in y_all.iter().enumerate() {
        let Some(y) = *y else { continue };
        let x: Option<Vec<f64>> = x_all.iter().map(|col| col[idx]).collect();
        if let Some(x) = x {
            rows.push((x, y));
        }
    }

    let (train, test) = train_test_split(rows.len(), config.test_fraction, config.split_seed);
    if test.is_empty() || train.is_empty() {
        return Err(AnalysisError::insufficient_rows(format!(
            "{} complete rows give {} train / {} test rows",
            rows.len(),
            train.len(),
            test.len()
        )));
    }

    let train_x: Vec<&[f64]> = train.iter().map(|&i| rows[i].0.as_slice()).collect();
    let train_y: Vec<f64> = train.iter().map(|&i| rows[i].1).collect();
    let model = LinearModel::fit(&train_x, &train_y)?;

    let predictions: Vec<f64> = test.iter().map(|&i| model.predict(&rows[i].0)).collect();
    let actuals: Vec<f64> = test.iter().map(|&i| rows[i].1).collect();
    let r2 = r2_score(&actuals, &predictions);

    info!(
        "Regression on '{target}' with {} feature(s): {} train / {} test rows, R² = {r2:.4}",
        feature_cols.len(),
        train.len(),
        test.len()
    );

    Ok(RegressionResult {
        target: target.to_string(),
        features: feature_cols.iter().map(|c| c.name.clone()).collect(),
        predictions,
        actuals,
        r2,
        model,
    })
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
/// Returns `(train, test)` index lists.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

/// Coefficient of determination. A constant target scores 1.0 when it is
/// predicted exactly and 0.0 otherwise.
///
/// "Constant" and "exactly" are judged relative to the magnitude of the
/// target, so small-scale targets score like their rescaled versions.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let tolerance = f64::EPSILON * actual.iter().map(|a| a * a).sum::<f64>();

    if ss_tot <= tolerance {
        return if ss_res <= tolerance { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

// ---------------------------------------------------------------------------
// Ordinary least squares
// ---------------------------------------------------------------------------

/// Intercept followed by one weight per feature.
#[derive(Debug, Clone, PartialEq)]
struct LinearModel {
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Solve the normal equations (XᵀX) β = Xᵀy with an intercept column.
    ///
    /// Features are centred and scaled to unit variance first, so the pivot
    /// tolerance does not depend on their units. Coefficients are mapped
    /// back to the original scale.
    fn fit(x: &[&[f64]], y: &[f64]) -> Result<Self> {
        let m = x.len() as f64;
        let k = x.first().map(|row| row.len()).unwrap_or(0);

        let means: Vec<f64> = (0..k)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / m)
            .collect();
        let scales: Vec<f64> = (0..k)
            .map(|j| {
                let var = x.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / m;
                var.sqrt()
            })
            .collect();
        // A constant feature duplicates the intercept.
        if means
            .iter()
            .zip(&scales)
            .any(|(mean, scale)| *scale <= 1e-12 * mean.abs().max(f64::MIN_POSITIVE))
        {
            return Err(AnalysisError::SingularMatrix);
        }

        let p = k + 1;
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &target) in x.iter().zip(y) {
            let design: Vec<f64> = std::iter::once(1.0)
                .chain((0..k).map(|j| (row[j] - means[j]) / scales[j]))
                .collect();
            for i in 0..p {
                xty[i] += design[i] * target;
                for j in 0..p {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }

        let standardized = solve_linear_system(xtx, xty)?;
        let weights: Vec<f64> = standardized[1..]
            .iter()
            .zip(&scales)
            .map(|(w, scale)| w / scale)
            .collect();
        let intercept = standardized[0]
            - weights
                .iter()
                .zip(&means)
                .map(|(w, mean)| w * mean)
                .sum::<f64>();

        let mut coefficients = Vec::with_capacity(p);
        coefficients.push(intercept);
        coefficients.extend(weights);
        Ok(LinearModel { coefficients })
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Gaussian elimination with partial pivoting. Each pivot is compared
/// against the largest entry of its own row before elimination.
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = a.len();
    let mut row_scale: Vec<f64> = a
        .iter()
        .map(|row| row.iter().fold(0.0f64, |m, v| m.max(v.abs())))
        .collect();

    for i in 0..n {
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > a[max_row][i].abs() {
                max_row = k;
            }
        }
        a.swap(i, max_row);
        b.swap(i, max_row);
        row_scale.swap(i, max_row);

        if row_scale[i] == 0.0 || a[i][i].abs() <= 1e-10 * row_scale[i] {
            return Err(AnalysisError::SingularMatrix);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
            b[k] -= factor * b[i];
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    Ok(x)
}
