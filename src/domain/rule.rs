//! Rule AST data structures.
//!
//! Strategy predicates are expressed as rule trees so that the reason attached
//! to a signal can be rendered from the rule that fired:
//! - `Operand`: What can be compared (price fields, constants, indicators)
//! - `IndicatorRef`: Reference to an indicator with a specific field
//! - `IndicatorField`: Which field of a multi-value indicator to use
//! - `Rule`: Comparison, crossing and boolean composition

use crate::domain::indicator::IndicatorType;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Open,
    High,
    Low,
    Close,
    Volume,
    Constant(f64),
    Indicator(IndicatorRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorRef {
    pub indicator_type: IndicatorType,
    pub field: IndicatorField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    StochasticK,
    StochasticD,
    StochasticJ,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    DualThrustRange,
    DualThrustBuy,
    DualThrustSell,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    CrossAbove { left: Operand, right: Operand },
    CrossBelow { left: Operand, right: Operand },
    Above { left: Operand, right: Operand },
    Below { left: Operand, right: Operand },
    AtLeast { left: Operand, right: Operand },
    And(Vec<Rule>),
    Or(Vec<Rule>),
}

impl IndicatorRef {
    pub fn new(indicator_type: IndicatorType, field: IndicatorField) -> Self {
        Self {
            indicator_type,
            field,
        }
    }

    pub fn value(indicator_type: IndicatorType) -> Self {
        Self::new(indicator_type, IndicatorField::Value)
    }
}

impl Operand {
    pub fn indicator(indicator_type: IndicatorType, field: IndicatorField) -> Self {
        Operand::Indicator(IndicatorRef::new(indicator_type, field))
    }

    pub fn value_of(indicator_type: IndicatorType) -> Self {
        Operand::Indicator(IndicatorRef::value(indicator_type))
    }
}

/// Collects every indicator referenced anywhere in the rule, without duplicates.
pub fn extract_indicators(rule: &Rule) -> Vec<IndicatorType> {
    let mut out = Vec::new();
    collect(rule, &mut out);
    out
}

fn collect(rule: &Rule, out: &mut Vec<IndicatorType>) {
    match rule {
        Rule::CrossAbove { left, right }
        | Rule::CrossBelow { left, right }
        | Rule::Above { left, right }
        | Rule::Below { left, right }
        | Rule::AtLeast { left, right } => {
            for operand in [left, right] {
                if let Operand::Indicator(r) = operand {
                    if !out.contains(&r.indicator_type) {
                        out.push(r.indicator_type.clone());
                    }
                }
            }
        }
        Rule::And(rules) | Rule::Or(rules) => {
            for r in rules {
                collect(r, out);
            }
        }
    }
}

impl fmt::Display for IndicatorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorField::Value => "VALUE",
            IndicatorField::MacdLine => "LINE",
            IndicatorField::MacdSignal => "SIGNAL",
            IndicatorField::MacdHistogram => "HIST",
            IndicatorField::StochasticK => "K",
            IndicatorField::StochasticD => "D",
            IndicatorField::StochasticJ => "J",
            IndicatorField::BollingerUpper => "UPPER",
            IndicatorField::BollingerMiddle => "MIDDLE",
            IndicatorField::BollingerLower => "LOWER",
            IndicatorField::DualThrustRange => "RANGE",
            IndicatorField::DualThrustBuy => "BUY_TRIGGER",
            IndicatorField::DualThrustSell => "SELL_TRIGGER",
        };
        f.write_str(name)
    }
}

impl fmt::Display for IndicatorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            IndicatorField::Value => write!(f, "{}", self.indicator_type),
            field => write!(f, "{}.{}", self.indicator_type, field),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Open => f.write_str("OPEN"),
            Operand::High => f.write_str("HIGH"),
            Operand::Low => f.write_str("LOW"),
            Operand::Close => f.write_str("CLOSE"),
            Operand::Volume => f.write_str("VOLUME"),
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Indicator(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::CrossAbove { left, right } => write!(f, "CROSS_ABOVE({}, {})", left, right),
            Rule::CrossBelow { left, right } => write!(f, "CROSS_BELOW({}, {})", left, right),
            Rule::Above { left, right } => write!(f, "ABOVE({}, {})", left, right),
            Rule::Below { left, right } => write!(f, "BELOW({}, {})", left, right),
            Rule::AtLeast { left, right } => write!(f, "AT_LEAST({}, {})", left, right),
            Rule::And(rules) => write_list(f, "AND", rules),
            Rule::Or(rules) => write_list(f, "OR", rules),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, rules: &[Rule]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, r) in rules.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", r)?;
    }
    f.write_str(")")
}
