//! Simple Moving Average over any bar column.
//!
//! SMA[i] = mean(field[i-n+1..=i]). Warmup: first (n-1) bars are invalid.
//! Each mean is taken from its own window as an offset from the window's
//! first value, so a flat window averages to exactly that value whatever
//! the period.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};

pub fn calculate_sma(bars: &[OhlcvBar], field: PriceField, period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Sma { field, period };
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, IndicatorValue::Simple(0.0));
    }

    let mut series = IndicatorSeries::new(indicator_type);

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 >= period {
            let window = &bars[i + 1 - period..=i];
            let anchor = window[0].field(field);
            let drift: f64 = window.iter().map(|b| b.field(field) - anchor).sum();
            series.push(
                bar.date,
                true,
                IndicatorValue::Simple(anchor + drift / period as f64),
            );
        } else {
            series.push(bar.date, false, IndicatorValue::Simple(0.0));
        }
    }

    series
}
