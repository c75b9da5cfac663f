//! Bollinger Bands.
//!
//! - Middle: SMA of the close over n periods
//! - Upper: Middle + (devfactor × StdDev)
//! - Lower: Middle - (devfactor × StdDev)
//!
//! StdDev is the population standard deviation (divides by N).
//! Default parameters: period=20, devfactor=2.0. Warmup: first (period-1) bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, from_x100};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, devfactor_x100: u32) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        devfactor_x100,
    };
    let placeholder = IndicatorValue::Bollinger {
        upper: 0.0,
        middle: 0.0,
        lower: 0.0,
    };
    if period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, placeholder);
    }

    let mult = from_x100(devfactor_x100);
    let mut series = IndicatorSeries::new(indicator_type);

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            series.push(bar.date, false, placeholder.clone());
            continue;
        }

        let window = &bars[i + 1 - period..=i];
        let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|b| (b.close - middle).powi(2))
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        series.push(
            bar.date,
            true,
            IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            },
        );
    }

    series
}
