//! Bollinger band mean reversion: buy below the lower band, sell above the upper.

use crate::domain::indicator::{IndicatorType, to_x100};
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorField, IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    pub period: usize,
    pub devfactor: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            devfactor: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    indicator: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl BollingerReversion {
    pub fn new(params: BollingerParams) -> Self {
        let indicator = IndicatorType::Bollinger {
            period: params.period,
            devfactor_x100: to_x100(params.devfactor),
        };
        Self {
            entry_rule: Rule::Below {
                left: Operand::Close,
                right: Operand::indicator(indicator.clone(), IndicatorField::BollingerLower),
            },
            exit_rule: Rule::Above {
                left: Operand::Close,
                right: Operand::indicator(indicator.clone(), IndicatorField::BollingerUpper),
            },
            indicator,
        }
    }
}

impl SignalStrategy for BollingerReversion {
    fn id(&self) -> StrategyId {
        StrategyId::Bollinger
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
        let band = |f| IndicatorRef::new(self.indicator.clone(), f);
        vec![
            PlotSeries::new("upper", band(IndicatorField::BollingerUpper)),
            PlotSeries::new("middle", band(IndicatorField::BollingerMiddle)),
            PlotSeries::new("lower", band(IndicatorField::BollingerLower)),
        ]
    }

    fn describe(&self) -> Vec<String> {
        vec![
            format!("entry: {}", self.entry_rule),
            format!("exit: {}", self.exit_rule),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use crate::domain::strategy::test_support::{bars_from_closes, replay};

    #[test]
    fn buys_below_lower_and_sells_above_upper() {
        let bars = bars_from_closes(&[100.0, 101.0, 99.0, 100.0, 80.0, 100.0, 101.0, 130.0]);
        let strategy = BollingerReversion::new(BollingerParams {
            period: 4,
            devfactor: 1.0,
        });
        let fired = replay(&strategy, &bars);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].action, Action::EnterLong);
        assert_eq!(fired[0].bar_index, 4);
        assert_eq!(fired[0].reason, "BELOW(CLOSE, BOLLINGER(4,1).LOWER)");
        assert_eq!(fired[1].action, Action::Exit);
        assert_eq!(fired[1].bar_index, 7);
    }

    #[test]
    fn devfactor_is_keyed_x100() {
        let strategy = BollingerReversion::new(BollingerParams {
            period: 20,
            devfactor: 2.5,
        });
        assert_eq!(
            strategy.indicators(),
            vec![IndicatorType::Bollinger {
                period: 20,
                devfactor_x100: 250,
            }]
        );
        assert_eq!(strategy.required_bars(), 20);
    }
}
