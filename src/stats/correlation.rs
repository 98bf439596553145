use serde::Serialize;

use super::describe::pearson;
use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};

/// Pairwise Pearson coefficients between the numeric columns of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Row-major, `names.len()` square. `None` where a coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlate every pair of numeric columns over their complete rows.
    /// Needs at least two numeric columns.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let numeric = dataset.numeric_columns();
        if numeric.len() < 2 {
            return Err(AnalysisError::InsufficientNumericColumns {
                required: 2,
                found: numeric.len(),
            });
        }

        let series: Vec<Vec<Option<f64>>> =
            numeric.iter().map(|c| c.numeric_values()).collect();
        let n = series.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&series[i], &series[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            names: numeric.iter().map(|c| c.name.clone()).collect(),
            values,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;

    #[test]
    fn test_matrix_over_numeric_columns_only() {
        let ds = parse_csv(b"a,label,b,c\n1,x,2,5\n2,y,4,3\n3,z,6,4\n").unwrap();
        let m = CorrelationMatrix::from_dataset(&ds).unwrap();
        assert_eq!(m.names, vec!["a", "b", "c"]);
        assert!((m.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get(1, 1).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.get(0, 2), m.get(2, 0));
    }

    #[test]
    fn test_needs_two_numeric_columns() {
        let ds = parse_csv(b"a,label\n1,x\n2,y\n").unwrap();
        assert!(matches!(
            CorrelationMatrix::from_dataset(&ds),
            Err(AnalysisError::InsufficientNumericColumns { required: 2, found: 1 })
        ));
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let ds = parse_csv(b"a,b\n1,7\n2,7\n3,7\n").unwrap();
        let m = CorrelationMatrix::from_dataset(&ds).unwrap();
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(1, 1), None);
    }
}
