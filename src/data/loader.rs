use crate::data::bar::Bar;
use csv::ReaderBuilder;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Missing required column '{0}' in CSV header")]
    Schema(String),
    #[error("CSV input has no header row")]
    MissingHeader,
    #[error("Non-numeric value '{value}' in column '{column}' at line {line}")]
    NumericParse {
        column: String,
        value: String,
        line: usize,
    },
    #[error("Invalid millisecond timestamp {0} at line {1}")]
    Timestamp(i64, usize),
    #[error("Row at line {line} has {got} fields, expected at least {expected}")]
    ShortRow {
        line: usize,
        got: usize,
        expected: usize,
    },
    #[error("Insufficient data: {have} bars parsed, need at least {need}")]
    InsufficientData { have: usize, need: usize },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

//resolved positions of the required columns within the header row
struct ColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl ColumnMap {
    //header matching is case-insensitive and order-independent
    //unknown columns are ignored, volume is optional
    fn resolve(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let required = |name: &str| find(name).ok_or_else(|| DataError::Schema(name.to_string()));

        Ok(ColumnMap {
            timestamp: required("timestamp")?,
            open: required("open")?,
            high: required("high")?,
            low: required("low")?,
            close: required("close")?,
            volume: find("volume"),
        })
    }

    //widest required index, used to reject short rows up front
    fn max_required_index(&self) -> usize {
        [self.timestamp, self.open, self.high, self.low, self.close]
            .into_iter()
            .max()
            .unwrap_or(0)
    }
}

//parses a numeric cell, failing hard on malformed input
//nan bars are never allowed to reach the indicator math
fn parse_cell(record: &csv::StringRecord, index: usize, column: &str, line: usize) -> Result<f64, DataError> {
    let raw = record.get(index).unwrap_or("").trim();
    let value: f64 = raw.parse().map_err(|_| DataError::NumericParse {
        column: column.to_string(),
        value: raw.to_string(),
        line,
    })?;

    if value.is_nan() {
        return Err(DataError::NumericParse {
            column: column.to_string(),
            value: raw.to_string(),
            line,
        });
    }

    Ok(value)
}

//parses comma-delimited historical data into bars
//header row required: timestamp,open,high,low,close with optional volume
//timestamps are unix milliseconds
pub fn parse_csv_str(raw: &str) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(DataError::MissingHeader);
    }

    let columns = ColumnMap::resolve(&headers)?;
    let min_fields = columns.max_required_index() + 1;

    let mut bars = Vec::new();

    for (index, result) in reader.records().enumerate() {
        //line numbers are 1-based and include the header row
        let line = index + 2;
        let record = result?;

        if record.len() < min_fields {
            return Err(DataError::ShortRow {
                line,
                got: record.len(),
                expected: min_fields,
            });
        }

        let timestamp_raw = record.get(columns.timestamp).unwrap_or("").trim();
        let timestamp_ms: i64 = timestamp_raw.parse().map_err(|_| DataError::NumericParse {
            column: "timestamp".to_string(),
            value: timestamp_raw.to_string(),
            line,
        })?;

        let open = parse_cell(&record, columns.open, "open", line)?;
        let high = parse_cell(&record, columns.high, "high", line)?;
        let low = parse_cell(&record, columns.low, "low", line)?;
        let close = parse_cell(&record, columns.close, "close", line)?;

        let volume = match columns.volume {
            Some(i) => record.get(i).and_then(|v| v.trim().parse().ok()),
            None => None,
        };

        let bar = Bar::from_millis(timestamp_ms, open, high, low, close, volume)
            .ok_or(DataError::Timestamp(timestamp_ms, line))?;

        bars.push(bar);
    }

    //sort by timestamp to ensure chronological order
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    Ok(bars)
}

//loads bars from a csv file on disk
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>, DataError> {
    let contents = std::fs::read_to_string(path)?;
    parse_csv_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "timestamp,open,high,low,close,volume\n\
        1700000000000,100.0,101.0,99.0,100.5,12.0\n\
        1700000060000,100.5,102.0,100.0,101.5,8.5\n";

    #[test]
    fn parses_well_formed_rows() {
        let bars = parse_csv_str(SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].volume, Some(8.5));
        assert_eq!(bars[0].timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn header_is_case_insensitive_and_order_independent() {
        let raw = "Close,LOW,High,Open,Timestamp\n101.0,99.0,102.0,100.0,1700000000000\n";
        let bars = parse_csv_str(raw).unwrap();
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn missing_required_column_is_schema_error() {
        let raw = "timestamp,open,high,low\n1700000000000,1,2,0.5\n";
        let err = parse_csv_str(raw).unwrap_err();
        assert!(matches!(err, DataError::Schema(ref c) if c == "close"));
    }

    #[test]
    fn non_numeric_cell_fails_hard() {
        let raw = "timestamp,open,high,low,close\n1700000000000,abc,2,0.5,1\n";
        let err = parse_csv_str(raw).unwrap_err();
        match err {
            DataError::NumericParse { column, line, .. } => {
                assert_eq!(column, "open");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nan_cell_is_rejected() {
        let raw = "timestamp,open,high,low,close\n1700000000000,NaN,2,0.5,1\n";
        assert!(matches!(
            parse_csv_str(raw),
            Err(DataError::NumericParse { .. })
        ));
    }

    #[test]
    fn out_of_range_timestamp_is_reported_with_line() {
        let raw = format!(
            "timestamp,open,high,low,close\n{},1,2,0.5,1\n",
            i64::MAX
        );
        let err = parse_csv_str(&raw).unwrap_err();
        match err {
            DataError::Timestamp(ms, line) => {
                assert_eq!(ms, i64::MAX);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let raw = "timestamp,open,high,low,close,quote_volume,trades\n\
            1700000000000,1,2,0.5,1.5,100,7\n";
        let bars = parse_csv_str(raw).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.5);
    }

    #[test]
    fn rows_are_sorted_chronologically() {
        let raw = "timestamp,open,high,low,close\n\
            1700000060000,2,3,1,2\n\
            1700000000000,1,2,0.5,1\n";
        let bars = parse_csv_str(raw).unwrap();
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn load_csv_reads_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let bars = load_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
    }
}
