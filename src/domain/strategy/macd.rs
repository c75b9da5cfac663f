//! MACD signal-line crossover, long only above the zero line.

use crate::domain::indicator::IndicatorType;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorField, IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacdCross {
    indicator: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl MacdCross {
    pub fn new(params: MacdParams) -> Self {
        let indicator = IndicatorType::Macd {
            fast: params.fast,
            slow: params.slow,
            signal: params.signal,
        };
        let line = Operand::indicator(indicator.clone(), IndicatorField::MacdLine);
        let signal = Operand::indicator(indicator.clone(), IndicatorField::MacdSignal);

        Self {
            entry_rule: Rule::And(vec![
                Rule::CrossAbove {
                    left: line.clone(),
                    right: signal.clone(),
                },
                Rule::Above {
                    left: line.clone(),
                    right: Operand::Constant(0.0),
                },
            ]),
            exit_rule: Rule::CrossBelow {
                left: line,
                right: signal,
            },
            indicator,
        }
    }
}

impl SignalStrategy for MacdCross {
    fn id(&self) -> StrategyId {
        StrategyId::Macd
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
        let field = |f| IndicatorRef::new(self.indicator.clone(), f);
        vec![
            PlotSeries::new("dif", field(IndicatorField::MacdLine)),
            PlotSeries::new("dea", field(IndicatorField::MacdSignal)),
            PlotSeries::new("histogram", field(IndicatorField::MacdHistogram)),
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
    fn required_bars_default() {
        let strategy = MacdCross::new(MacdParams::default());
        assert_eq!(strategy.required_bars(), 34);
        assert_eq!(strategy.indicators().len(), 1);
    }

    fn small() -> MacdCross {
        MacdCross::new(MacdParams {
            fast: 3,
            slow: 6,
            signal: 3,
        })
    }

    #[test]
    fn enters_on_cross_above_zero_line() {
        // steady rally, short pause, rally resumes
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        closes.extend([119.0, 119.0, 118.0, 118.0]);
        closes.extend((0..10).map(|i| 120.0 + 2.0 * i as f64));
        let bars = bars_from_closes(&closes);

        let fired = replay(&small(), &bars);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, Action::EnterLong);
        assert_eq!(fired[0].bar_index, 24);
        assert_eq!(
            fired[0].reason,
            "AND(CROSS_ABOVE(MACD(3,6,3).LINE, MACD(3,6,3).SIGNAL), ABOVE(MACD(3,6,3).LINE, 0))"
        );
    }

    #[test]
    fn ignores_cross_below_zero_line() {
        let mut closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        closes.extend([181.0, 181.0, 182.0, 182.0]);
        closes.extend((0..4).map(|i| 180.0 - 2.0 * i as f64));
        let bars = bars_from_closes(&closes);
        assert!(replay(&small(), &bars).is_empty());
    }

    #[test]
    fn plot_series_names() {
        let names: Vec<String> = MacdCross::new(MacdParams::default())
            .plot_series()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["dif", "dea", "histogram"]);
    }
}
