use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};

use super::model::{Column, DType, Dataset, Value};
use crate::error::{AnalysisError, Result};
use crate::state::DatasetStore;

/// Tokens read as a missing value regardless of column type.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse CSV bytes and make the result the active dataset.
///
/// The store is only written once parsing has fully succeeded; on error the
/// previously active dataset stays in place.
pub fn ingest(store: &DatasetStore, bytes: &[u8]) -> Result<Arc<Dataset>> {
    let dataset = parse_csv(bytes)?;
    info!(
        "Ingested dataset: {} rows x {} columns",
        dataset.len(),
        dataset.n_columns()
    );
    Ok(store.set(dataset))
}

/// CSV layout: comma separated, first record is the header row.
/// Every data row must carry exactly as many fields as the header.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalysisError::ingestion("input is empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = read_headers(&mut reader)?;

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AnalysisError::ingestion(format!("CSV row {}: {e}", row_no + 1)))?;

        if record.len() != headers.len() {
            return Err(AnalysisError::ingestion(format!(
                "CSV row {} has {} fields, header has {}",
                row_no + 1,
                record.len(),
                headers.len()
            )));
        }

        for (col_idx, field) in record.iter().enumerate() {
            cells[col_idx].push(field.trim().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| build_column(name, &raw))
        .collect();

    Dataset::new(columns)
}

fn read_headers(reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>> {
    let record = reader
        .headers()
        .map_err(|e| AnalysisError::ingestion(format!("reading CSV header: {e}")))?;

    if record.is_empty() {
        return Err(AnalysisError::ingestion("missing header row"));
    }

    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(record.len());
    for (idx, raw) in record.iter().enumerate() {
        let name = match raw.trim() {
            "" => format!("Unnamed: {idx}"),
            trimmed => trimmed.to_string(),
        };
        if !seen.insert(name.clone()) {
            return Err(AnalysisError::ingestion(format!(
                "duplicate column name '{name}'"
            )));
        }
        headers.push(name);
    }
    Ok(headers)
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

fn is_missing(s: &str) -> bool {
    MISSING_TOKENS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn is_datetime(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
}

/// Pick the narrowest dtype every non-missing field satisfies.
fn infer_dtype(raw: &[String]) -> DType {
    let present: Vec<&str> = raw
        .iter()
        .map(String::as_str)
        .filter(|s| !is_missing(s))
        .collect();

    // An all-missing column stays numeric so it still shows up in statistics.
    if present.is_empty() {
        return DType::Float;
    }
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        DType::Integer
    } else if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        DType::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        DType::Boolean
    } else if present.iter().all(|s| is_datetime(s)) {
        DType::Datetime
    } else {
        DType::Text
    }
}

fn convert(s: &str, dtype: DType) -> Value {
    if is_missing(s) {
        return Value::Missing;
    }
    // Inference guarantees every present field parses under its dtype.
    match dtype {
        DType::Integer => s.parse().map(Value::Integer).unwrap_or(Value::Missing),
        DType::Float => s.parse().map(Value::Float).unwrap_or(Value::Missing),
        DType::Boolean => parse_bool(s).map(Value::Bool).unwrap_or(Value::Missing),
        DType::Datetime => Value::Datetime(s.to_string()),
        DType::Text => Value::Text(s.to_string()),
    }
}

fn build_column(name: String, raw: &[String]) -> Column {
    let dtype = infer_dtype(raw);
    debug!("Column '{name}' inferred as {dtype}");
    let values = raw.iter().map(|s| convert(s, dtype)).collect();
    Column::new(name, dtype, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infers_column_types() {
        let csv = b"id,price,label,flag,when\n\
                    1,2.5,foo,true,2024-01-02\n\
                    2,3,bar,False,2024-01-03 10:00:00\n";
        let ds = parse_csv(csv).unwrap();
        let dtypes: Vec<DType> = ds.columns().iter().map(|c| c.dtype).collect();
        assert_eq!(
            dtypes,
            vec![
                DType::Integer,
                DType::Float,
                DType::Text,
                DType::Boolean,
                DType::Datetime
            ]
        );
        assert_eq!(ds.column("price").unwrap().values[1], Value::Float(3.0));
    }

    #[test]
    fn test_missing_tokens_do_not_break_numeric_inference() {
        let ds = parse_csv(b"a,b\n1,x\n,NA\nNaN,y\n4,\n").unwrap();
        let a = ds.column("a").unwrap();
        assert_eq!(a.dtype, DType::Integer);
        assert_eq!(a.missing_count(), 2);
        let b = ds.column("b").unwrap();
        assert_eq!(b.dtype, DType::Text);
        assert_eq!(b.missing_count(), 2);
    }

    #[test]
    fn test_one_bad_field_makes_column_text() {
        let ds = parse_csv(b"a\n1\n2\nthree\n").unwrap();
        assert_eq!(ds.column("a").unwrap().dtype, DType::Text);
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(parse_csv(b""), Err(AnalysisError::Ingestion(_))));
        assert!(matches!(parse_csv(b"  \n\n"), Err(AnalysisError::Ingestion(_))));
    }

    #[test]
    fn test_rejects_inconsistent_row_width() {
        let err = parse_csv(b"a,b,c\n1,2\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Ingestion(msg) if msg.contains("row 1")));
        assert!(parse_csv(b"a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn test_rejects_duplicate_header() {
        assert!(matches!(
            parse_csv(b"a,a\n1,2\n"),
            Err(AnalysisError::Ingestion(_))
        ));
    }

    #[test]
    fn test_blank_header_is_named_by_position() {
        let ds = parse_csv(b",value\n0,10\n1,20\n").unwrap();
        assert_eq!(ds.column_names(), vec!["Unnamed: 0", "value"]);
    }

    #[test]
    fn test_header_only_is_an_empty_dataset() {
        let ds = parse_csv(b"a,b\n").unwrap();
        assert_eq!(ds.n_columns(), 2);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_failed_ingest_leaves_store_untouched() {
        let store = DatasetStore::new();
        ingest(&store, b"x,y\n1,2\n").unwrap();
        assert!(ingest(&store, b"a,b,c\n1,2\n").is_err());
        let active = store.get().unwrap();
        assert_eq!(active.column_names(), vec!["x", "y"]);
    }
}
