//! Configuration validation.
//!
//! Typed strategy parameters are checked before a strategy is built, and raw
//! INI values are checked as they are read, so every configuration problem is
//! reported before any bar is processed.

use crate::domain::error::SignalError;
use crate::domain::indicator::{from_x100, to_x100};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{
    BollingerParams, CompositeConfig, DualThrustParams, KdjParams, MaParams, MacdParams,
    RsiParams, StrategyConfig, TurtleParams,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_strategy(config: &StrategyConfig) -> Result<(), SignalError> {
    match config {
        StrategyConfig::Ma(p) => validate_ma(p),
        StrategyConfig::Macd(p) => validate_macd(p),
        StrategyConfig::Bollinger(p) => validate_bollinger(p),
        StrategyConfig::Rsi(p) => validate_rsi(p),
        StrategyConfig::Turtle(p) => validate_turtle(p),
        StrategyConfig::Kdj(p) => validate_kdj(p),
        StrategyConfig::DualThrust(p) => validate_dual_thrust(p),
        StrategyConfig::Composite(c) => validate_composite(c),
    }
}

/// Checks the `[data]` section: a directory and an ordered date range.
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), SignalError> {
    match config.get_string("data", "dir") {
        Some(dir) if !dir.trim().is_empty() => {}
        _ => {
            return Err(SignalError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            });
        }
    }

    let start = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    if start >= end {
        return Err(SignalError::invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok((start, end))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SignalError> {
    match value {
        None => Err(SignalError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SignalError::invalid(
                "data",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

/// Reads a non-negative integer, rejecting values that are present but malformed.
pub fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<i64>().is_err() {
            return Err(SignalError::invalid(section, key, format!("'{}' is not an integer", raw)));
        }
    }
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| SignalError::invalid(section, key, format!("{} must not be negative", key)))
}

/// Reads a float, rejecting values that are present but malformed.
pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<f64>().is_err() {
            return Err(SignalError::invalid(section, key, format!("'{}' is not a number", raw)));
        }
    }
    Ok(config.get_double(section, key, default))
}

/// Reads a boolean, rejecting values that are present but not a recognised flag.
pub fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, SignalError> {
    if let Some(raw) = config.get_string(section, key) {
        let recognised =
            config.get_bool(section, key, true) == config.get_bool(section, key, false);
        if !raw.trim().is_empty() && !recognised {
            return Err(SignalError::invalid(section, key, format!("'{}' is not a boolean", raw)));
        }
    }
    Ok(config.get_bool(section, key, default))
}

/// Splits a comma list, dropping blanks.
pub fn read_list(config: &dyn ConfigPort, section: &str, key: &str) -> Vec<String> {
    config
        .get_string(section, key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn validate_period(section: &str, key: &str, value: usize) -> Result<(), SignalError> {
    if value < 1 {
        return Err(SignalError::invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_fraction(section: &str, key: &str, value: f64) -> Result<(), SignalError> {
    if !(0.0..1.0).contains(&value) {
        return Err(SignalError::invalid(section, key, format!("{} must be in [0, 1)", key)));
    }
    Ok(())
}

fn validate_positive(section: &str, key: &str, value: f64) -> Result<(), SignalError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(SignalError::invalid(section, key, format!("{} must be positive", key)));
    }
    Ok(())
}

/// Fractional parameters are keyed at a resolution of 0.01.
fn validate_hundredths(section: &str, key: &str, value: f64) -> Result<(), SignalError> {
    let stored = to_x100(value);
    if stored == 0 || (from_x100(stored) - value).abs() > 1e-9 {
        return Err(SignalError::invalid(
            section,
            key,
            format!("{} must be a multiple of 0.01, got {}", key, value),
        ));
    }
    Ok(())
}

fn validate_threshold(section: &str, key: &str, value: f64) -> Result<(), SignalError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(SignalError::invalid(section, key, format!("{} must be within [0, 100]", key)));
    }
    Ok(())
}

fn validate_ma(p: &MaParams) -> Result<(), SignalError> {
    validate_period("ma", "fast", p.fast)?;
    validate_period("ma", "slow", p.slow)?;
    validate_period("ma", "volume_period", p.volume_period)?;
    if p.fast >= p.slow {
        return Err(SignalError::invalid("ma", "fast", "fast must be shorter than slow"));
    }
    validate_fraction("ma", "stop_loss", p.stop_loss)?;
    validate_fraction("ma", "take_profit", p.take_profit)?;
    if p.use_rsi {
        validate_period("ma", "rsi_period", p.rsi_period)?;
        validate_threshold("ma", "rsi_low", p.rsi_low)?;
    }
    Ok(())
}

fn validate_macd(p: &MacdParams) -> Result<(), SignalError> {
    validate_period("macd", "fast", p.fast)?;
    validate_period("macd", "slow", p.slow)?;
    validate_period("macd", "signal", p.signal)?;
    if p.fast >= p.slow {
        return Err(SignalError::invalid("macd", "fast", "fast must be shorter than slow"));
    }
    Ok(())
}

fn validate_bollinger(p: &BollingerParams) -> Result<(), SignalError> {
    validate_period("bollinger", "period", p.period)?;
    validate_positive("bollinger", "devfactor", p.devfactor)?;
    validate_hundredths("bollinger", "devfactor", p.devfactor)
}

fn validate_rsi(p: &RsiParams) -> Result<(), SignalError> {
    validate_period("rsi", "period", p.period)?;
    validate_threshold("rsi", "low", p.low)?;
    validate_threshold("rsi", "high", p.high)?;
    if p.low >= p.high {
        return Err(SignalError::invalid("rsi", "low", "low must be below high"));
    }
    Ok(())
}

fn validate_turtle(p: &TurtleParams) -> Result<(), SignalError> {
    validate_period("turtle", "entry_period", p.entry_period)?;
    validate_period("turtle", "exit_period", p.exit_period)?;
    validate_fraction("turtle", "trailing_stop_pct", p.trailing_stop_pct)
}

fn validate_kdj(p: &KdjParams) -> Result<(), SignalError> {
    validate_period("kdj", "period", p.period)?;
    validate_period("kdj", "dfast", p.dfast)?;
    validate_period("kdj", "dslow", p.dslow)
}

fn validate_dual_thrust(p: &DualThrustParams) -> Result<(), SignalError> {
    validate_period("dual_thrust", "period", p.period)?;
    validate_positive("dual_thrust", "k1", p.k1)?;
    validate_positive("dual_thrust", "k2", p.k2)?;
    validate_hundredths("dual_thrust", "k1", p.k1)?;
    validate_hundredths("dual_thrust", "k2", p.k2)
}

fn validate_composite(c: &CompositeConfig) -> Result<(), SignalError> {
    if c.enabled.is_empty() {
        return Err(SignalError::EmptySignalSet);
    }
    if c.use_trend_filter {
        validate_period("composite", "trend_period", c.trend_period)?;
    }
    if c.use_volume_filter {
        validate_period("composite", "volume_period", c.volume_period)?;
    }
    for &id in &c.enabled {
        let member = c.members.config_for(id).ok_or_else(|| {
            SignalError::invalid("composite", "signals", format!("{} cannot be a member", id))
        })?;
        validate_strategy(&member)?;
    }
    Ok(())
}

/// Parses `[composite] signals`, rejecting unknown names.
pub fn parse_signal_set(names: &[String]) -> Result<Vec<StrategyId>, SignalError> {
    names
        .iter()
        .map(|n| {
            n.parse::<StrategyId>()
                .map_err(|_| SignalError::invalid("composite", "signals", format!("unknown signal '{}'", n)))
        })
        .collect()
}
