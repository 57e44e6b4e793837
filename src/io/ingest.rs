//! CSV ingest.
//!
//! Turns the anomaly CSV into a `TimeSeries`:
//!
//! - the first row is a header and is skipped
//! - column 1 is ignored (source label), column 2 is a `YYYY-MM-DD` date,
//!   column 3 is the anomaly; further columns are ignored
//! - rows keep their file order
//!
//! Unlike a lenient loader, any malformed row aborts the whole load: a partial
//! series would silently change every fit downstream.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Sample, TimeSeries};
use crate::error::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

/// Load the series from a CSV file.
pub fn load_series(path: &Path) -> Result<TimeSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let series = read_series(file).map_err(|e| AppError::input(format!("{}: {e}", path.display())))?;
    log::info!("loaded {} samples from {}", series.len(), path.display());
    Ok(series)
}

/// Parse the series from any reader (used by `load_series` and tests).
pub fn read_series<R: Read>(reader: R) -> Result<TimeSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let fallback_line = idx as u64 + 2;
        let record = result.map_err(|e| AppError::input(format!("line {fallback_line}: CSV parse error: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);

        let sample = parse_record(&record).map_err(|e| AppError::input(format!("line {line}: {e}")))?;
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(AppError::input("No data rows after the header."));
    }

    let series = TimeSeries::new(samples);
    if !series.is_chronological() {
        log::warn!("input rows are not in chronological order; time axis will not be monotonic");
    }
    Ok(series)
}

fn parse_record(record: &StringRecord) -> Result<Sample, String> {
    if record.len() <= VALUE_COLUMN {
        return Err(format!(
            "expected at least {} columns, found {}",
            VALUE_COLUMN + 1,
            record.len()
        ));
    }

    let date = parse_date(record.get(DATE_COLUMN).unwrap_or_default())?;
    let anomaly = parse_value(record.get(VALUE_COLUMN).unwrap_or_default())?;
    Ok(Sample { date, anomaly })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn parse_value(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|e| format!("invalid temperature value '{s}': {e}"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite temperature value '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_INPUT;

    const SAMPLE_CSV: &str = "\
Source,Date,Mean
GCAG,1880-01-06,-0.3
GCAG,1880-02-06,-0.21
GCAG,1880-03-06,-0.18
GCAG,1880-04-06,-0.27
";

    #[test]
    fn loads_rows_in_file_order() {
        let series = read_series(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.samples[0].date, NaiveDate::from_ymd_opt(1880, 1, 6).unwrap());
        assert_eq!(series.samples[3].anomaly, -0.27);
    }

    #[test]
    fn does_not_reorder_descending_input() {
        let csv = "Source,Date,Mean\nX,2016-12-06,0.79\nX,2016-11-06,0.93\nX,2016-10-06,0.89\n";
        let series = read_series(csv.as_bytes()).unwrap();
        let values: Vec<f64> = series.samples.iter().map(|s| s.anomaly).collect();
        assert_eq!(values, vec![0.79, 0.93, 0.89]);
        assert!(!series.is_chronological());
    }

    #[test]
    fn time_axis_starts_at_zero_and_counts_days() {
        let series = read_series(SAMPLE_CSV.as_bytes()).unwrap();
        let t = series.time_axis();
        assert_eq!(t, vec![0.0, 31.0, 60.0, 91.0]);
        assert!(t.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn malformed_date_fails_the_whole_load() {
        let csv = "Source,Date,Mean\nX,1880-01-06,0.1\nX,06/02/1880,0.2\nX,1880-03-06,0.3\n";
        let err = read_series(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.to_string().contains("line 3"), "{err}");
        assert!(err.to_string().contains("invalid date"), "{err}");
    }

    #[test]
    fn non_numeric_value_fails_the_whole_load() {
        let csv = "Source,Date,Mean\nX,1880-01-06,abc\n";
        let err = read_series(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid temperature value 'abc'"), "{err}");
    }

    #[test]
    fn short_rows_are_rejected() {
        let csv = "Source,Date,Mean\nX,1880-01-06\n";
        let err = read_series(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected at least 3 columns"), "{err}");
    }

    #[test]
    fn header_only_file_is_an_input_error() {
        let err = read_series("Source,Date,Mean\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }
}
