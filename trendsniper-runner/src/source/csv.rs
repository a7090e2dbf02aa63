//! CSV candle files: `{dir}/{instrument}_{timeframe}.csv`.
//!
//! Columns: `time,open,high,low,close[,volume]`. `time` may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS` (UTC), `YYYY-MM-DD`, or a Unix timestamp in seconds
//! or milliseconds.

use super::{tail, CandleSource, DataError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use trendsniper_core::domain::{Candle, InstrumentId, Timeframe};

/// Unix timestamps above this are taken as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    let epoch: i64 = raw.parse().ok()?;
    if epoch.abs() >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

/// Parse candles from any CSV reader, sorted ascending by timestamp.
///
/// Rows with an unreadable time or an inconsistent OHLC range are rejected
/// with `DataError::Parse`, naming the 1-based data row.
pub fn read_csv_candles<R: Read>(reader: R, origin: &str) -> Result<Vec<Candle>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();

    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row_no = i + 1;
        let row = row.map_err(|e| DataError::Parse {
            origin: origin.to_string(),
            message: format!("row {row_no}: {e}"),
        })?;
        let timestamp = parse_timestamp(&row.time).ok_or_else(|| DataError::Parse {
            origin: origin.to_string(),
            message: format!("row {row_no}: unreadable time '{}'", row.time),
        })?;
        let candle = Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        };
        if !candle.is_sane() {
            return Err(DataError::Parse {
                origin: origin.to_string(),
                message: format!("row {row_no}: high/low do not bound open/close"),
            });
        }
        candles.push(candle);
    }

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

/// Read a whole CSV file of candles.
pub fn load_csv_candles(path: &Path) -> Result<Vec<Candle>, DataError> {
    let file = std::fs::File::open(path)?;
    read_csv_candles(file, &path.display().to_string())
}

/// Serves candles from per-series CSV files under one directory.
///
/// Files are re-read on every fetch, so an external writer appending rows
/// is picked up on the next tick.
#[derive(Debug, Clone)]
pub struct CsvCandleSource {
    dir: PathBuf,
}

impl CsvCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, instrument: &InstrumentId, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", instrument, timeframe))
    }
}

#[async_trait]
impl CandleSource for CsvCandleSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_candles(
        &self,
        instrument: &InstrumentId,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let path = self.path_for(instrument, timeframe);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::InstrumentNotFound {
                    instrument: instrument.clone(),
                    timeframe,
                })
            }
            Err(e) => return Err(DataError::Io(e)),
        };
        let candles = read_csv_candles(bytes.as_slice(), &path.display().to_string())?;
        Ok(tail(candles, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("1704187800"), Some(expected));
        assert_eq!(parse_timestamp("1704187800000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn reads_rows_with_optional_volume() {
        let data = "time,open,high,low,close,volume\n\
                    2024-01-02T00:01:00Z,2,3,1,2.5,10\n\
                    2024-01-02T00:00:00Z,1,2,0.5,1.5,\n";
        let candles = read_csv_candles(data.as_bytes(), "inline").unwrap();
        assert_eq!(candles.len(), 2);
        // sorted ascending
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[0].volume, 0.0);
        assert_eq!(candles[1].volume, 10.0);
    }

    #[test]
    fn reads_rows_without_volume_column() {
        let data = "time,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n";
        let candles = read_csv_candles(data.as_bytes(), "inline").unwrap();
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn rejects_inconsistent_range() {
        let data = "time,open,high,low,close\n2024-01-02,1,0.8,0.5,1.5\n";
        let err = read_csv_candles(data.as_bytes(), "inline").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn rejects_bad_number() {
        let data = "time,open,high,low,close\n2024-01-02,one,2,0.5,1.5\n";
        assert!(matches!(
            read_csv_candles(data.as_bytes(), "inline"),
            Err(DataError::Parse { .. })
        ));
    }
}
