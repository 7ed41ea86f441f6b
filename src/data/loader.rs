//! Dataset loader.
//! Reads the outcomes CSV with Polars, normalizes headers, coerces cells into
//! the typed record model, and memoizes the result per (path, mtime).

use crate::data::record::{Dataset, OutcomeRecord, StatewideComparison, YearSpan};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("data file not found: {0}")]
    DataNotFound(PathBuf),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("missing required column: {0}")]
    MissingColumn(String),
}

// Normalized column names. The raw headers use spaces; see `normalize_header`.
const FACILITY_ID: &str = "Facility_ID";
const HOSPITAL_NAME: &str = "Hospital_Name";
const REGION: &str = "Region";
const PROCEDURE: &str = "Procedure";
const DISCHARGE_YEAR: &str = "Year_of_Hospital_Discharge";
const CASES: &str = "Number_of_Cases";
const DEATHS: &str = "Number_of_Deaths";
const OBSERVED_RATE: &str = "Observed_Mortality_Rate";
const EXPECTED_RATE: &str = "Expected_Mortality_Rate";
const RISK_ADJUSTED_RATE: &str = "Risk_Adjusted_Mortality_Rate";
const CI_LOWER: &str = "Lower_Limit_of_Confidence_Interval";
const CI_UPPER: &str = "Upper_Limit_of_Confidence_Interval";
const COMPARISON: &str = "Comparison_Results";

/// Trim a header and map each space, slash, and hyphen to an underscore.
/// Idempotent: normalizing an already-normalized name is a no-op.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, ' ' | '/' | '-') { '_' } else { c })
        .collect()
}

#[derive(PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
}

fn cache() -> &'static Mutex<HashMap<CacheKey, Dataset>> {
    static CACHE: OnceLock<Mutex<HashMap<CacheKey, Dataset>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load the dataset at `path`, served from the process-wide cache when the
/// file is unchanged. A missing or unreadable path is terminal.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoaderError> {
    let metadata =
        fs::metadata(path).map_err(|_| LoaderError::DataNotFound(path.to_path_buf()))?;
    let key = CacheKey {
        path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
        modified: metadata.modified().ok(),
    };

    if let Ok(entries) = cache().lock() {
        if let Some(dataset) = entries.get(&key) {
            debug!(path = %path.display(), rows = dataset.len(), "dataset served from cache");
            return Ok(dataset.clone());
        }
    }

    let dataset = read_dataset(path)?;
    info!(path = %path.display(), rows = dataset.len(), "loaded dataset");
    if let Ok(mut entries) = cache().lock() {
        entries.insert(key, dataset.clone());
    }
    Ok(dataset)
}

/// Drop every cached dataset. The next load re-reads from disk.
pub fn clear_cache() {
    if let Ok(mut entries) = cache().lock() {
        entries.clear();
    }
}

fn read_dataset(path: &Path) -> Result<Dataset, LoaderError> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;
    let records = extract_records(&df)?;
    Ok(Dataset::new(records))
}

fn extract_records(df: &DataFrame) -> Result<Vec<OutcomeRecord>, LoaderError> {
    // Normalization happens only here, at the ingestion boundary; everything
    // downstream sees typed fields.
    let by_normalized: HashMap<String, String> = df
        .get_column_names()
        .iter()
        .map(|name| (normalize_header(name.as_str()), name.to_string()))
        .collect();

    let facility_id = required_column(df, &by_normalized, FACILITY_ID)?;
    let hospital_name = required_column(df, &by_normalized, HOSPITAL_NAME)?;
    let region = required_column(df, &by_normalized, REGION)?;
    let procedure = required_column(df, &by_normalized, PROCEDURE)?;
    let discharge_year = required_column(df, &by_normalized, DISCHARGE_YEAR)?;
    let cases = required_column(df, &by_normalized, CASES)?;
    let deaths = required_column(df, &by_normalized, DEATHS)?;
    let observed = required_column(df, &by_normalized, OBSERVED_RATE)?;
    let expected = required_column(df, &by_normalized, EXPECTED_RATE)?;
    let risk_adjusted = required_column(df, &by_normalized, RISK_ADJUSTED_RATE)?;
    let ci_lower_col = required_column(df, &by_normalized, CI_LOWER)?;
    let ci_upper_col = required_column(df, &by_normalized, CI_UPPER)?;
    let comparison_col = required_column(df, &by_normalized, COMPARISON)?;

    let mut records = Vec::with_capacity(df.height());
    let mut unknown_labels = 0usize;

    for i in 0..df.height() {
        let discharge_period = cell_string(discharge_year, i).unwrap_or_default();
        let period = YearSpan::parse(&discharge_period);

        let comparison = match cell_string(comparison_col, i).as_deref() {
            Some(label) => {
                let parsed = StatewideComparison::parse(label);
                if parsed.is_none() {
                    unknown_labels += 1;
                }
                parsed
            }
            None => None,
        };

        let observed_rate = cell_f64(observed, i);
        let expected_rate = cell_f64(expected, i);
        let risk_adjusted_rate = cell_f64(risk_adjusted, i);
        let ci_lower = cell_f64(ci_lower_col, i);
        let ci_upper = cell_f64(ci_upper_col, i);

        records.push(OutcomeRecord {
            facility_id: cell_i64(facility_id, i),
            hospital_name: cell_string(hospital_name, i).unwrap_or_default(),
            region: cell_string(region, i).unwrap_or_default(),
            procedure: cell_string(procedure, i).unwrap_or_default(),
            discharge_period,
            period,
            cases: cell_i64(cases, i),
            deaths: cell_i64(deaths, i),
            observed_rate,
            expected_rate,
            risk_adjusted_rate,
            ci_lower,
            ci_upper,
            comparison,
            obs_vs_expected: difference(observed_rate, expected_rate),
            obs_vs_risk_adjusted: difference(observed_rate, risk_adjusted_rate),
            ci_width: difference(ci_upper, ci_lower),
        });
    }

    if unknown_labels > 0 {
        warn!(
            count = unknown_labels,
            "unrecognized statewide comparison labels passed through ungrouped"
        );
    }

    Ok(records)
}

fn required_column<'a>(
    df: &'a DataFrame,
    by_normalized: &HashMap<String, String>,
    normalized: &str,
) -> Result<&'a Column, LoaderError> {
    let original = by_normalized
        .get(normalized)
        .ok_or_else(|| LoaderError::MissingColumn(normalized.to_string()))?;
    Ok(df.column(original)?)
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    }
}

fn cell_string(col: &Column, idx: usize) -> Option<String> {
    match col.get(idx).ok()? {
        AnyValue::Null => None,
        AnyValue::String(s) => non_empty(s),
        AnyValue::StringOwned(s) => non_empty(s.as_str()),
        other => non_empty(&other.to_string()),
    }
}

fn cell_f64(col: &Column, idx: usize) -> Option<f64> {
    let value = match col.get(idx).ok()? {
        AnyValue::Null => None,
        AnyValue::Float64(v) => Some(v),
        AnyValue::Float32(v) => Some(v as f64),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::Int32(v) => Some(v as f64),
        AnyValue::Int16(v) => Some(v as f64),
        AnyValue::Int8(v) => Some(v as f64),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::UInt32(v) => Some(v as f64),
        AnyValue::UInt16(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(v as f64),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.as_str().trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn cell_i64(col: &Column, idx: usize) -> Option<i64> {
    cell_f64(col, idx).map(|v| v.round() as i64)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FIXTURE: &str = "\
Facility ID,Hospital Name,Region,Procedure,Year of Hospital Discharge,Number of Cases,Number of Deaths,Observed Mortality Rate,Expected Mortality Rate,Risk Adjusted Mortality Rate,Lower Limit of Confidence Interval,Upper Limit of Confidence Interval,Comparison Results
101,St. Elsewhere,Capital District,All PCI,2015,120,3,2.50,2.00,2.25,1.25,3.75,Rate not different than Statewide Rate
102,Mercy General,Capital District,Valve or Valve/CABG,2015-2017,80,N/A,5.00,4.00,4.50,2.00,6.00,Rate higher than Statewide Rate
103,Harbor View,Hudson Valley,All PCI,bad-year,60,1,1.50,2.50,1.75,0.50,2.50,Rate lower than Statewide Rate
104,Lakeside,Hudson Valley,Non-Emergency PCI,2016,40,0,0.00,1.00,0.50,0.00,1.00,Rate wildly different
";

    fn fixture_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp csv");
        file.write_all(contents.as_bytes()).expect("write temp csv");
        file.flush().expect("flush temp csv");
        file
    }

    #[test]
    fn test_normalize_header_is_idempotent() {
        let names = [
            "Facility ID",
            " Year of Hospital Discharge ",
            "Risk-Adjusted/Rate",
            "Already_Normalized",
        ];
        for name in names {
            let once = normalize_header(name);
            assert_eq!(normalize_header(&once), once);
        }
        assert_eq!(
            normalize_header("Year of Hospital Discharge"),
            "Year_of_Hospital_Discharge"
        );
        assert_eq!(normalize_header("Risk-Adjusted/Rate"), "Risk_Adjusted_Rate");
    }

    #[test]
    fn test_missing_file_is_data_not_found() {
        let error = load_dataset(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(error, LoaderError::DataNotFound(_)));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let file =
            fixture_file("Facility ID,Hospital Name,Region\n101,St. Elsewhere,Capital District\n");
        let error = read_dataset(file.path()).unwrap_err();
        match error {
            LoaderError::MissingColumn(name) => assert_eq!(name, "Procedure"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_load_normalizes_and_derives() {
        let file = fixture_file(FIXTURE);
        let dataset = read_dataset(file.path()).expect("load fixture");
        let records = dataset.records();
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.facility_id, Some(101));
        assert_eq!(first.hospital_name, "St. Elsewhere");
        assert_eq!(first.region, "Capital District");
        assert_eq!(first.procedure, "All PCI");
        assert_eq!(
            first.period,
            Some(YearSpan {
                start: 2015,
                end: 2015
            })
        );
        assert_eq!(first.cases, Some(120));
        assert_eq!(first.obs_vs_expected, Some(0.5));
        assert_eq!(first.obs_vs_risk_adjusted, Some(0.25));
        assert_eq!(first.ci_width, Some(2.5));
        assert!(first.is_not_different_from_statewide());

        // Unparsable numeric cell becomes None; the row survives.
        let second = &records[1];
        assert_eq!(second.deaths, None);
        assert_eq!(second.cases, Some(80));
        assert_eq!(
            second.period,
            Some(YearSpan {
                start: 2015,
                end: 2017
            })
        );
        assert_eq!(second.period.map(|p| p.midpoint()), Some(2016));
        assert_eq!(second.obs_vs_expected, Some(1.0));
        assert_eq!(second.ci_width, Some(4.0));
        assert!(second.is_higher_than_statewide());

        // Unparsable year: period is None, the rest of the row is intact.
        let third = &records[2];
        assert_eq!(third.period, None);
        assert_eq!(third.discharge_period, "bad-year");
        assert_eq!(third.obs_vs_expected, Some(-1.0));
        assert!(third.is_lower_than_statewide());

        // Unknown comparison label passes through ungrouped.
        let fourth = &records[3];
        assert_eq!(fourth.comparison, None);
        assert!(!fourth.is_higher_than_statewide());
        assert!(!fourth.is_lower_than_statewide());
        assert!(!fourth.is_not_different_from_statewide());
    }

    #[test]
    fn test_cache_serves_unchanged_file_and_clears() {
        let file = fixture_file(FIXTURE);
        let first = load_dataset(file.path()).expect("first load");
        let second = load_dataset(file.path()).expect("second load");
        assert!(first.shares_storage_with(&second));

        clear_cache();
        let third = load_dataset(file.path()).expect("load after clear");
        assert!(!first.shares_storage_with(&third));
        assert_eq!(first.len(), third.len());
    }
}
