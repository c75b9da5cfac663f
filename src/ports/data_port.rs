//! Data access port trait.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Supplies daily bars per security code. Bars must come back ordered by date.
pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignalError>;

    /// First date, last date and bar count, or `None` if the code is unknown.
    fn get_data_range(&self, code: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalError>;
}
