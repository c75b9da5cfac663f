#![allow(dead_code)]

use chrono::NaiveDate;
use sigfusion::domain::error::SignalError;
pub use sigfusion::domain::ohlcv::OhlcvBar;
use sigfusion::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SignalError::DataSupply {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    fn get_data_range(&self, code: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalError> {
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 10_000.0,
    }
}

/// Consecutive daily bars from 2024-01-01, one per close.
pub fn generate_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Writes `bars` as `<dir>/<code>.csv`.
pub fn write_csv(dir: &std::path::Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", code)), content).unwrap();
}
