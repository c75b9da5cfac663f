//! Dual Thrust range breakout.
//!
//! Enters when the close clears `open + k1 × range` and exits when it falls
//! through `open - k2 × range`, with the range taken from the prior `period` bars.

use crate::domain::indicator::{IndicatorType, to_x100};
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorField, IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualThrustParams {
    pub period: usize,
    pub k1: f64,
    pub k2: f64,
}

impl Default for DualThrustParams {
    fn default() -> Self {
        Self {
            period: 5,
            k1: 0.5,
            k2: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DualThrust {
    indicator: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl DualThrust {
    pub fn new(params: DualThrustParams) -> Self {
        let indicator = IndicatorType::DualThrust {
            period: params.period,
            k1_x100: to_x100(params.k1),
            k2_x100: to_x100(params.k2),
        };
        Self {
            entry_rule: Rule::Above {
                left: Operand::Close,
                right: Operand::indicator(indicator.clone(), IndicatorField::DualThrustBuy),
            },
            exit_rule: Rule::Below {
                left: Operand::Close,
                right: Operand::indicator(indicator.clone(), IndicatorField::DualThrustSell),
            },
            indicator,
        }
    }
}

impl SignalStrategy for DualThrust {
    fn id(&self) -> StrategyId {
        StrategyId::DualThrust
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![self.indicator.clone()]
    }

    fn required_bars(&self) -> usize {
        self.indicator.lookback()
    }

    fn entry(&self, ctx: &BarContext<'_>) -> Option<String> {
        ctx.explain(&self.entry_rule)
    }

    fn exit(&self, ctx: &BarContext<'_>, _state: &StrategyState) -> Option<String> {
        ctx.explain(&self.exit_rule)
    }

    fn plot_series(&self) -> Vec<PlotSeries> {
        let trigger = |f| IndicatorRef::new(self.indicator.clone(), f);
        vec![
            PlotSeries::new("buy_trigger", trigger(IndicatorField::DualThrustBuy)),
            PlotSeries::new("sell_trigger", trigger(IndicatorField::DualThrustSell)),
        ]
    }

    fn describe(&self) -> Vec<String> {
        vec![
            format!("entry: {}", self.entry_rule),
            format!("exit: {}", self.exit_rule),
        ]
    }
}
