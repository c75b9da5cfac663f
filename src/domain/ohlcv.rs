//! OHLCV bar representation.

use crate::domain::error::SignalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Source column of a windowed indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "OPEN",
            PriceField::High => "HIGH",
            PriceField::Low => "LOW",
            PriceField::Close => "CLOSE",
            PriceField::Volume => "VOLUME",
        };
        f.write_str(name)
    }
}

/// Checks that dates are strictly increasing (no duplicates, no reordering).
pub fn validate_bars(bars: &[OhlcvBar]) -> Result<(), SignalError> {
    for pair in bars.windows(2) {
        if pair[1].date == pair[0].date {
            return Err(SignalError::InvalidBars {
                date: pair[1].date,
                reason: "duplicate date".into(),
            });
        }
        if pair[1].date < pair[0].date {
            return Err(SignalError::InvalidBars {
                date: pair[1].date,
                reason: format!("date precedes previous bar {}", pair[0].date),
            });
        }
    }
    Ok(())
}
