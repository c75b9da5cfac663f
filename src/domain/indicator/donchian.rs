//! Donchian channel bounds.
//!
//! DonchianHigh[i] = max(field[i-n..=i-1]); DonchianLow[i] = min(field[i-n..=i-1]).
//! The current bar never contributes to its own value, so a breakout
//! comparison against it carries no look-ahead. Warmup: first n bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{OhlcvBar, PriceField};

pub fn calculate_donchian_high(bars: &[OhlcvBar], field: PriceField, period: usize) -> IndicatorSeries {
    channel(
        bars,
        field,
        period,
        IndicatorType::DonchianHigh { field, period },
        f64::NEG_INFINITY,
        f64::max,
    )
}

pub fn calculate_donchian_low(bars: &[OhlcvBar], field: PriceField, period: usize) -> IndicatorSeries {
    channel(
        bars,
        field,
        period,
        IndicatorType::DonchianLow { field, period },
        f64::INFINITY,
        f64::min,
    )
}

fn channel(
    bars: &[OhlcvBar],
    field: PriceField,
    period: usize,
    indicator_type: IndicatorType,
    init: f64,
    pick: fn(f64, f64) -> f64,
) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, IndicatorValue::Simple(0.0));
    }

    let mut series = IndicatorSeries::new(indicator_type);
    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            series.push(bar.date, false, IndicatorValue::Simple(0.0));
            continue;
        }
        let bound = bars[i - period..i]
            .iter()
            .map(|b| b.field(field))
            .fold(init, pick);
        series.push(bar.date, true, IndicatorValue::Simple(bound));
    }
    series
}
