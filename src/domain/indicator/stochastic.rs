//! Slow stochastic oscillator (KDJ).
//!
//! raw = 100 × (close - LL) / (HH - LL) over the window ending at bar i,
//! with HH/LL taken from high/low. A window with HH == LL yields raw = 50.
//! K = SMA(raw, dfast), D = SMA(K, dslow), J = 3K - 2D (not clamped).
//!
//! Warmup: (period-1) + (dfast-1) + (dslow-1) bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(
    bars: &[OhlcvBar],
    period: usize,
    dfast: usize,
    dslow: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Stochastic {
        period,
        dfast,
        dslow,
    };
    let placeholder = IndicatorValue::Stochastic {
        k: 0.0,
        d: 0.0,
        j: 0.0,
    };
    if period == 0 || dfast == 0 || dslow == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, placeholder);
    }

    let raw: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &bars[i + 1 - period..=i];
            let hh = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let ll = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            if hh == ll {
                Some(50.0)
            } else {
                Some(100.0 * (bars[i].close - ll) / (hh - ll))
            }
        })
        .collect();

    let k = rolling_mean(&raw, dfast);
    let d = rolling_mean(&k, dslow);

    let mut series = IndicatorSeries::new(indicator_type);
    for (i, bar) in bars.iter().enumerate() {
        match (k[i], d[i]) {
            (Some(k), Some(d)) => series.push(
                bar.date,
                true,
                IndicatorValue::Stochastic {
                    k,
                    d,
                    j: 3.0 * k - 2.0 * d,
                },
            ),
            _ => series.push(bar.date, false, placeholder.clone()),
        }
    }
    series
}

/// Trailing mean that is defined only when the whole window is defined.
fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let mut sum = 0.0;
            for v in &values[i + 1 - period..=i] {
                sum += (*v)?;
            }
            Some(sum / period as f64)
        })
        .collect()
}
