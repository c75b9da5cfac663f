//! MACD (Moving Average Convergence Divergence).
//!
//! Line (DIF) = EMA(fast) - EMA(slow)
//! Signal (DEA) = EMA(signal) of the line, seeded once the line is defined
//! Histogram = Line - Signal
//!
//! Warmup: max(fast, slow) - 1 + signal - 1 bars.

use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let placeholder = IndicatorValue::Macd {
        line: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::undefined(indicator_type, bars, placeholder);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_of(&closes, fast);
    let ema_slow = ema_of(&closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // The signal EMA runs only over the defined part of the line.
    let line_start = line.iter().position(Option::is_some).unwrap_or(line.len());
    let defined: Vec<f64> = line[line_start..].iter().flatten().copied().collect();
    let mut signal = vec![None; line_start];
    signal.extend(ema_of(&defined, signal_period));

    let mut series = IndicatorSeries::new(indicator_type);
    for (i, bar) in bars.iter().enumerate() {
        match (line[i], signal[i]) {
            (Some(l), Some(s)) => series.push(
                bar.date,
                true,
                IndicatorValue::Macd {
                    line: l,
                    signal: s,
                    histogram: l - s,
                },
            ),
            _ => series.push(bar.date, false, placeholder.clone()),
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_ema;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect()
    }

    fn parts(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => (line, signal, histogram),
            _ => panic!("expected Macd value"),
        }
    }

    #[test]
    fn macd_warmup_standard_periods() {
        let bars = make_bars(&wavy(50));
        let series = calculate_macd(&bars, 12, 26, 9);
        assert_eq!(series.len(), 50);
        assert_eq!(series.first_valid(), Some(33));
        assert!(series.values[33..].iter().all(|p| p.valid));
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let bars = make_bars(&wavy(60));
        let series = calculate_macd(&bars, 3, 6, 4);
        for i in series.first_valid().unwrap()..60 {
            let (line, signal, histogram) = parts(&series, i);
            assert_relative_eq!(histogram, line - signal);
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let bars = make_bars(&wavy(40));
        let series = calculate_macd(&bars, 3, 6, 4);
        let fast = calculate_ema(&bars, 3);
        let slow = calculate_ema(&bars, 6);
        for i in series.first_valid().unwrap()..40 {
            let (line, _, _) = parts(&series, i);
            assert_relative_eq!(line, fast.simple(i).unwrap() - slow.simple(i).unwrap());
        }
    }

    #[test]
    fn macd_signal_seed_is_mean_of_first_lines() {
        let bars = make_bars(&wavy(30));
        let series = calculate_macd(&bars, 2, 4, 3);
        let fast = calculate_ema(&bars, 2);
        let slow = calculate_ema(&bars, 4);
        let line = |i: usize| fast.simple(i).unwrap() - slow.simple(i).unwrap();
        let seed = (line(3) + line(4) + line(5)) / 3.0;
        let (_, signal, _) = parts(&series, 5);
        assert_relative_eq!(signal, seed, epsilon = 1e-12);
    }

    #[test]
    fn macd_custom_parameters_warmup() {
        let bars = make_bars(&wavy(30));
        let series = calculate_macd(&bars, 5, 10, 3);
        let warmup = 9 + 2;
        assert!(!series.values[warmup - 1].valid);
        assert!(series.values[warmup].valid);
    }

    #[test]
    fn macd_zero_period_all_invalid() {
        let bars = make_bars(&wavy(10));
        let series = calculate_macd(&bars, 0, 26, 9);
        assert_eq!(series.len(), 10);
        assert_eq!(series.first_valid(), None);
    }

    #[test]
    fn macd_short_series_never_valid() {
        let bars = make_bars(&wavy(20));
        let series = calculate_macd(&bars, 12, 26, 9);
        assert_eq!(series.first_valid(), None);
    }
}
