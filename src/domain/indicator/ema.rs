//! Exponential Moving Average of the close.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = x[i]*k + EMA[i-1]*(1-k). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let smoothed = ema_of(&closes, period);

    let mut series = IndicatorSeries::new(IndicatorType::Ema(period));
    for (bar, value) in bars.iter().zip(smoothed) {
        match value {
            Some(v) => series.push(bar.date, true, IndicatorValue::Simple(v)),
            None => series.push(bar.date, false, IndicatorValue::Simple(0.0)),
        }
    }
    series
}

/// SMA-seeded EMA over a raw slice; `None` until `period` values have been seen.
pub(crate) fn ema_of(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &x) in values.iter().enumerate() {
        if i + 1 < period {
            sum += x;
            out.push(None);
        } else if i + 1 == period {
            sum += x;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = x * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2..].iter().all(|p| p.valid));
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);
        assert_relative_eq!(series.simple(0).unwrap(), 10.0);
        assert_relative_eq!(series.simple(2).unwrap(), 30.0);
    }

    #[test]
    fn ema_seed_and_recursion() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let seed = 20.0;
        assert_relative_eq!(series.simple(2).unwrap(), seed);

        let ema_3 = 40.0 * k + seed * (1.0 - k);
        assert_relative_eq!(series.simple(3).unwrap(), ema_3);

        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        assert_relative_eq!(series.simple(4).unwrap(), ema_4);
    }

    #[test]
    fn ema_flat_prices() {
        let bars = make_bars(&[100.0; 6]);
        let series = calculate_ema(&bars, 3);
        for i in 2..6 {
            assert_relative_eq!(series.simple(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_of_zero_period() {
        let out = ema_of(&[1.0, 2.0], 0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn ema_empty_bars() {
        let series = calculate_ema(&[], 3);
        assert!(series.is_empty());
        assert_eq!(series.indicator_type, IndicatorType::Ema(3));
    }
}
