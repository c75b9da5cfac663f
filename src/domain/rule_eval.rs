//! Rule evaluation engine.
//!
//! Evaluates rules against OHLCV data and pre-computed indicator values.
//!
//! # Evaluation Semantics
//!
//! - Comparison rules: Evaluate at the given bar index
//! - Undefined operands resolve to `NaN`, so every comparison on them is `false`
//! - `CROSS_ABOVE`/`CROSS_BELOW`: Require `index >= 1`, return `false` at index 0
//! - `AND`: Short-circuits on first `false`
//! - `OR`: Short-circuits on first `true`

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule::{IndicatorField, IndicatorRef, Operand, Rule};
use std::collections::HashMap;

pub fn evaluate(
    rule: &Rule,
    ohlcv: &[OhlcvBar],
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
    bar_index: usize,
) -> bool {
    let value = |operand: &Operand, index: usize| resolve_operand(operand, ohlcv, indicators, index);

    match rule {
        Rule::CrossAbove { left, right } => {
            if bar_index == 0 {
                return false;
            }
            let (l, r) = (value(left, bar_index), value(right, bar_index));
            let (lp, rp) = (value(left, bar_index - 1), value(right, bar_index - 1));
            l > r && lp <= rp
        }
        Rule::CrossBelow { left, right } => {
            if bar_index == 0 {
                return false;
            }
            let (l, r) = (value(left, bar_index), value(right, bar_index));
            let (lp, rp) = (value(left, bar_index - 1), value(right, bar_index - 1));
            l < r && lp >= rp
        }
        Rule::Above { left, right } => value(left, bar_index) > value(right, bar_index),
        Rule::Below { left, right } => value(left, bar_index) < value(right, bar_index),
        Rule::AtLeast { left, right } => value(left, bar_index) >= value(right, bar_index),
        Rule::And(rules) => rules
            .iter()
            .all(|r| evaluate(r, ohlcv, indicators, bar_index)),
        Rule::Or(rules) => rules
            .iter()
            .any(|r| evaluate(r, ohlcv, indicators, bar_index)),
    }
}

/// Evaluates `rule` and, when it holds, renders the part that fired.
///
/// `OR` nodes are replaced by the first branch that holds, so the text names
/// the specific condition responsible for the signal.
pub fn explain(
    rule: &Rule,
    ohlcv: &[OhlcvBar],
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
    bar_index: usize,
) -> Option<String> {
    match rule {
        Rule::Or(rules) => rules
            .iter()
            .find_map(|r| explain(r, ohlcv, indicators, bar_index)),
        Rule::And(rules) => {
            let parts = rules
                .iter()
                .map(|r| explain(r, ohlcv, indicators, bar_index))
                .collect::<Option<Vec<String>>>()?;
            match parts.len() {
                1 => parts.into_iter().next(),
                _ => Some(format!("AND({})", parts.join(", "))),
            }
        }
        leaf => evaluate(leaf, ohlcv, indicators, bar_index).then(|| leaf.to_string()),
    }
}

pub fn resolve_operand(
    operand: &Operand,
    ohlcv: &[OhlcvBar],
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
    bar_index: usize,
) -> f64 {
    let bar = match ohlcv.get(bar_index) {
        Some(b) => b,
        None => return f64::NAN,
    };
    match operand {
        Operand::Open => bar.open,
        Operand::High => bar.high,
        Operand::Low => bar.low,
        Operand::Close => bar.close,
        Operand::Volume => bar.volume,
        Operand::Constant(v) => *v,
        Operand::Indicator(ind_ref) => resolve_indicator(ind_ref, indicators, bar_index),
    }
}

/// Indicator field at `bar_index`; `NaN` when missing or undefined.
pub fn resolve_indicator(
    ind_ref: &IndicatorRef,
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
    bar_index: usize,
) -> f64 {
    let point = match indicators
        .get(&ind_ref.indicator_type)
        .and_then(|s| s.values.get(bar_index))
    {
        Some(p) if p.valid => p,
        _ => return f64::NAN,
    };
    extract_field(&point.value, ind_ref.field)
}

fn extract_field(value: &IndicatorValue, field: IndicatorField) -> f64 {
    match (value, field) {
        (IndicatorValue::Simple(v), IndicatorField::Value) => *v,
        (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine) => *line,
        (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => *signal,
        (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => *histogram,
        (IndicatorValue::Stochastic { k, .. }, IndicatorField::StochasticK) => *k,
        (IndicatorValue::Stochastic { d, .. }, IndicatorField::StochasticD) => *d,
        (IndicatorValue::Stochastic { j, .. }, IndicatorField::StochasticJ) => *j,
        (IndicatorValue::Bollinger { upper, .. }, IndicatorField::BollingerUpper) => *upper,
        (IndicatorValue::Bollinger { middle, .. }, IndicatorField::BollingerMiddle) => *middle,
        (IndicatorValue::Bollinger { lower, .. }, IndicatorField::BollingerLower) => *lower,
        (IndicatorValue::DualThrust { range, .. }, IndicatorField::DualThrustRange) => *range,
        (IndicatorValue::DualThrust { buy_trigger, .. }, IndicatorField::DualThrustBuy) => {
            *buy_trigger
        }
        (IndicatorValue::DualThrust { sell_trigger, .. }, IndicatorField::DualThrustSell) => {
            *sell_trigger
        }
        _ => f64::NAN,
    }
}
