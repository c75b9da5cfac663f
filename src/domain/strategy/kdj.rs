//! KDJ stochastic strategy.
//!
//! Entry: J below 0, or K crossing above D while K is under 20.
//! Exit: J above 100, or K crossing below D while K is over 80.

use crate::domain::indicator::IndicatorType;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorField, IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy};
use serde::{Deserialize, Serialize};

const OVERSOLD: f64 = 20.0;
const OVERBOUGHT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdjParams {
    pub period: usize,
    pub dfast: usize,
    pub dslow: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            period: 9,
            dfast: 3,
            dslow: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Kdj {
    indicator: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl Kdj {
    pub fn new(params: KdjParams) -> Self {
        let indicator = IndicatorType::Stochastic {
            period: params.period,
            dfast: params.dfast,
            dslow: params.dslow,
        };
        let k = Operand::indicator(indicator.clone(), IndicatorField::StochasticK);
        let d = Operand::indicator(indicator.clone(), IndicatorField::StochasticD);
        let j = Operand::indicator(indicator.clone(), IndicatorField::StochasticJ);

        let entry_rule = Rule::Or(vec![
            Rule::Below {
                left: j.clone(),
                right: Operand::Constant(0.0),
            },
            Rule::And(vec![
                Rule::CrossAbove {
                    left: k.clone(),
                    right: d.clone(),
                },
                Rule::Below {
                    left: k.clone(),
                    right: Operand::Constant(OVERSOLD),
                },
            ]),
        ]);
        let exit_rule = Rule::Or(vec![
            Rule::Above {
                left: j,
                right: Operand::Constant(100.0),
            },
            Rule::And(vec![
                Rule::CrossBelow {
                    left: k.clone(),
                    right: d,
                },
                Rule::Above {
                    left: k,
                    right: Operand::Constant(OVERBOUGHT),
                },
            ]),
        ]);

        Self {
            indicator,
            entry_rule,
            exit_rule,
        }
    }
}

impl SignalStrategy for Kdj {
    fn id(&self) -> StrategyId {
        StrategyId::Kdj
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
        let line = |f| IndicatorRef::new(self.indicator.clone(), f);
        vec![
            PlotSeries::new("k", line(IndicatorField::StochasticK)),
            PlotSeries::new("d", line(IndicatorField::StochasticD)),
            PlotSeries::new("j", line(IndicatorField::StochasticJ)),
        ]
    }

    fn describe(&self) -> Vec<String> {
        vec![
            format!("entry: {}", self.entry_rule),
            format!("exit: {}", self.exit_rule),
        ]
    }
}
