//! CSV file data adapter.
//!
//! One file per security code, `<dir>/<CODE>.csv`, with a
//! `date,open,high,low,close,volume` header.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn load(&self, code: &str) -> Result<Vec<OhlcvBar>, SignalError> {
        let path = self.csv_path(code);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bars = read_bars(&path)?;
        debug!(code, path = %path.display(), bars = bars.len(), "loaded csv");
        Ok(bars)
    }
}

fn supply_error(path: &Path, line: usize, reason: impl std::fmt::Display) -> SignalError {
    SignalError::DataSupply {
        reason: format!("{}:{}: {}", path.display(), line, reason),
    }
}

fn column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
    line: usize,
) -> Result<f64, SignalError> {
    let raw = record
        .get(index)
        .ok_or_else(|| supply_error(path, line, format!("missing {} column", name)))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| supply_error(path, line, format!("invalid {} value '{}': {}", name, raw, e)))
}

/// Reads every row of a bar file, sorted by date.
pub fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, SignalError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| SignalError::DataSupply {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;

    let mut bars = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result.map_err(|e| supply_error(path, line, e))?;

        let date_str = record
            .get(0)
            .ok_or_else(|| supply_error(path, line, "missing date column"))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|e| supply_error(path, line, format!("invalid date '{}': {}", date_str, e)))?;

        bars.push(OhlcvBar {
            date,
            open: column(&record, 1, "open", path, line)?,
            high: column(&record, 2, "high", path, line)?,
            low: column(&record, 3, "low", path, line)?,
            close: column(&record, 4, "close", path, line)?,
            volume: column(&record, 5, "volume", path, line)?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for CsvAdapter {
    /// Bars within `[start_date, end_date]`; an unknown code yields no bars.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        let mut bars = self.load(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignalError::DataSupply {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(&self, code: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalError> {
        let bars = self.load(code)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
