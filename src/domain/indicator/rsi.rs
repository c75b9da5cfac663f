//! RSI (Relative Strength Index) with Wilder smoothing.
//!
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); avg_loss == 0 gives 100.
//! Warmup: first n bars are invalid (n changes are needed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, IndicatorValue::Simple(0.0));
    }

    let mut series = IndicatorSeries::new(indicator_type);
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let n = period as f64;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            series.push(bar.date, false, IndicatorValue::Simple(0.0));
            continue;
        }

        let change = bar.close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            series.push(bar.date, false, IndicatorValue::Simple(0.0));
            continue;
        }

        if i == period {
            avg_gain = (avg_gain + gain) / n;
            avg_loss = (avg_loss + loss) / n;
        } else {
            avg_gain = (avg_gain * (n - 1.0) + gain) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        }
        series.push(bar.date, true, IndicatorValue::Simple(rsi_value(avg_gain, avg_loss)));
    }

    series
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
