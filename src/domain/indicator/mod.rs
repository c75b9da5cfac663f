//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, aligned with the bars
//!
//! A point with `valid == false` is undefined (the lookback window is not yet
//! filled). Every series has exactly one point per input bar.

pub mod bollinger;
pub mod donchian;
pub mod dual_thrust;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use bollinger::calculate_bollinger;
pub use donchian::{calculate_donchian_high, calculate_donchian_low};
pub use dual_thrust::calculate_dual_thrust;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;

use crate::domain::ohlcv::{OhlcvBar, PriceField};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
        j: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    DualThrust {
        range: f64,
        buy_trigger: f64,
        sell_trigger: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma {
        field: PriceField,
        period: usize,
    },
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        devfactor_x100: u32,
    },
    Rsi(usize),
    Stochastic {
        period: usize,
        dfast: usize,
        dslow: usize,
    },
    DonchianHigh {
        field: PriceField,
        period: usize,
    },
    DonchianLow {
        field: PriceField,
        period: usize,
    },
    DualThrust {
        period: usize,
        k1_x100: u32,
        k2_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

/// Converts a fractional parameter into the ×100 fixed-point form used in keys.
pub fn to_x100(value: f64) -> u32 {
    (value * 100.0).round().max(0.0) as u32
}

pub fn from_x100(value: u32) -> f64 {
    value as f64 / 100.0
}

impl IndicatorType {
    pub fn close_sma(period: usize) -> Self {
        IndicatorType::Sma {
            field: PriceField::Close,
            period,
        }
    }

    pub fn volume_sma(period: usize) -> Self {
        IndicatorType::Sma {
            field: PriceField::Volume,
            period,
        }
    }

    /// Index of the first valid point.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma { period, .. }
            | IndicatorType::Ema(period)
            | IndicatorType::Bollinger { period, .. } => period.saturating_sub(1),
            IndicatorType::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorType::Rsi(period) => period,
            IndicatorType::Stochastic {
                period,
                dfast,
                dslow,
            } => period.saturating_sub(1) + dfast.saturating_sub(1) + dslow.saturating_sub(1),
            IndicatorType::DonchianHigh { period, .. }
            | IndicatorType::DonchianLow { period, .. }
            | IndicatorType::DualThrust { period, .. } => period,
        }
    }

    /// Number of bars needed before the first valid point.
    pub fn lookback(&self) -> usize {
        self.warmup() + 1
    }
}

impl IndicatorSeries {
    pub(crate) fn new(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// A series with one undefined point per bar.
    pub(crate) fn undefined(indicator_type: IndicatorType, bars: &[OhlcvBar], value: IndicatorValue) -> Self {
        Self {
            indicator_type,
            values: bars
                .iter()
                .map(|b| IndicatorPoint {
                    date: b.date,
                    valid: false,
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub(crate) fn push(&mut self, date: NaiveDate, valid: bool, value: IndicatorValue) {
        self.values.push(IndicatorPoint { date, valid, value });
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Simple value at `index`, or `None` while undefined.
    pub fn simple(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

/// Computes one indicator over the full bar sequence.
pub fn compute(indicator_type: &IndicatorType, bars: &[OhlcvBar]) -> IndicatorSeries {
    match *indicator_type {
        IndicatorType::Sma { field, period } => calculate_sma(bars, field, period),
        IndicatorType::Ema(period) => calculate_ema(bars, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        IndicatorType::Bollinger {
            period,
            devfactor_x100,
        } => calculate_bollinger(bars, period, devfactor_x100),
        IndicatorType::Rsi(period) => calculate_rsi(bars, period),
        IndicatorType::Stochastic {
            period,
            dfast,
            dslow,
        } => calculate_stochastic(bars, period, dfast, dslow),
        IndicatorType::DonchianHigh { field, period } => calculate_donchian_high(bars, field, period),
        IndicatorType::DonchianLow { field, period } => calculate_donchian_low(bars, field, period),
        IndicatorType::DualThrust {
            period,
            k1_x100,
            k2_x100,
        } => calculate_dual_thrust(bars, period, k1_x100, k2_x100),
    }
}

/// Computes every requested indicator once; duplicates are computed a single time.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut map = HashMap::with_capacity(types.len());
    for t in types {
        if !map.contains_key(t) {
            map.insert(t.clone(), compute(t, bars));
        }
    }
    map
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma {
                field: PriceField::Close,
                period,
            } => write!(f, "SMA({})", period),
            IndicatorType::Sma { field, period } => write!(f, "SMA({},{})", field, period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                devfactor_x100,
            } => write!(f, "BOLLINGER({},{})", period, from_x100(*devfactor_x100)),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stochastic {
                period,
                dfast,
                dslow,
            } => write!(f, "KDJ({},{},{})", period, dfast, dslow),
            IndicatorType::DonchianHigh { field, period } => {
                write!(f, "DONCHIAN_HIGH({},{})", field, period)
            }
            IndicatorType::DonchianLow { field, period } => {
                write!(f, "DONCHIAN_LOW({},{})", field, period)
            }
            IndicatorType::DualThrust {
                period,
                k1_x100,
                k2_x100,
            } => write!(
                f,
                "DUAL_THRUST({},{},{})",
                period,
                from_x100(*k1_x100),
                from_x100(*k2_x100)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::close_sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::volume_sma(20).to_string(), "SMA(VOLUME,20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            devfactor_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn indicator_type_display_dual_thrust() {
        let dt = IndicatorType::DualThrust {
            period: 5,
            k1_x100: 50,
            k2_x100: 70,
        };
        assert_eq!(dt.to_string(), "DUAL_THRUST(5,0.5,0.7)");
    }

    #[test]
    fn x100_round_trip() {
        assert_eq!(to_x100(2.0), 200);
        assert_eq!(to_x100(0.5), 50);
        assert_eq!(to_x100(0.555), 56);
        assert_eq!(to_x100(-1.0), 0);
        assert!((from_x100(250) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn warmup_matches_first_valid_index() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let bars = make_bars(&prices);
        let types = vec![
            IndicatorType::close_sma(5),
            IndicatorType::volume_sma(20),
            IndicatorType::Ema(10),
            IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            IndicatorType::Bollinger {
                period: 20,
                devfactor_x100: 200,
            },
            IndicatorType::Rsi(14),
            IndicatorType::Stochastic {
                period: 9,
                dfast: 3,
                dslow: 3,
            },
            IndicatorType::DonchianHigh {
                field: PriceField::High,
                period: 20,
            },
            IndicatorType::DonchianLow {
                field: PriceField::Low,
                period: 10,
            },
            IndicatorType::DualThrust {
                period: 5,
                k1_x100: 50,
                k2_x100: 50,
            },
        ];

        for t in &types {
            let series = compute(t, &bars);
            assert_eq!(series.len(), bars.len(), "{} length", t);
            assert_eq!(series.first_valid(), Some(t.warmup()), "{} warmup", t);
            assert_eq!(&series.indicator_type, t);
        }
    }

    #[test]
    fn compute_indicators_deduplicates() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let types = vec![
            IndicatorType::close_sma(2),
            IndicatorType::close_sma(2),
            IndicatorType::Rsi(2),
        ];
        let map = compute_indicators(&bars, &types);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&IndicatorType::close_sma(2)));
    }

    #[test]
    fn simple_accessor_respects_validity() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_sma(&bars, PriceField::Close, 2);
        assert_eq!(series.simple(0), None);
        assert_eq!(series.simple(1), Some(15.0));
        assert_eq!(series.simple(5), None);
    }

    #[test]
    fn indicator_type_hash_eq() {
        let mut map = HashMap::new();
        map.insert(IndicatorType::close_sma(20), "sma20");
        map.insert(IndicatorType::volume_sma(20), "vol20");
        assert_eq!(map.get(&IndicatorType::close_sma(20)), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorType::volume_sma(20)), Some(&"vol20"));
        assert_eq!(map.len(), 2);
    }
}
