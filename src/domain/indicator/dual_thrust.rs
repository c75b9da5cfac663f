//! Dual Thrust range and breakout triggers.
//!
//! Over bars i-n..=i-1:
//! range = max(HH(high) - LC(close), HC(close) - LL(low))
//! buy_trigger = open[i] + k1 × range, sell_trigger = open[i] - k2 × range
//!
//! The range is computed for every bar once n prior bars exist. Warmup: first n bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, from_x100};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_dual_thrust(bars: &[OhlcvBar], period: usize, k1_x100: u32, k2_x100: u32) -> IndicatorSeries {
    let indicator_type = IndicatorType::DualThrust {
        period,
        k1_x100,
        k2_x100,
    };
    let placeholder = IndicatorValue::DualThrust {
        range: 0.0,
        buy_trigger: 0.0,
        sell_trigger: 0.0,
    };
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, placeholder);
    }

    let k1 = from_x100(k1_x100);
    let k2 = from_x100(k2_x100);
    let mut series = IndicatorSeries::new(indicator_type);

    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            series.push(bar.date, false, placeholder.clone());
            continue;
        }

        let window = &bars[i - period..i];
        let hh = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let ll = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let hc = window.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max);
        let lc = window.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
        let range = (hh - lc).max(hc - ll);

        series.push(
            bar.date,
            true,
            IndicatorValue::DualThrust {
                range,
                buy_trigger: bar.open + k1 * range,
                sell_trigger: bar.open - k2 * range,
            },
        );
    }
    series
}
