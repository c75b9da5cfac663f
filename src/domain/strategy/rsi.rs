//! RSI reversion: buy when oversold, sell when overbought.

use crate::domain::indicator::IndicatorType;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
    pub low: f64,
    pub high: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            low: 30.0,
            high: 70.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RsiReversion {
    indicator: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl RsiReversion {
    pub fn new(params: RsiParams) -> Self {
        let indicator = IndicatorType::Rsi(params.period);
        let rsi = Operand::value_of(indicator.clone());
        Self {
            entry_rule: Rule::Below {
                left: rsi.clone(),
                right: Operand::Constant(params.low),
            },
            exit_rule: Rule::Above {
                left: rsi,
                right: Operand::Constant(params.high),
            },
            indicator,
        }
    }
}

impl SignalStrategy for RsiReversion {
    fn id(&self) -> StrategyId {
        StrategyId::Rsi
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
        vec![PlotSeries::new("rsi", IndicatorRef::value(self.indicator.clone()))]
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
    fn oversold_then_overbought() {
        let bars = bars_from_closes(&[50.0, 48.0, 46.0, 44.0, 46.0, 49.0, 53.0]);
        let strategy = RsiReversion::new(RsiParams {
            period: 3,
            ..RsiParams::default()
        });
        let fired = replay(&strategy, &bars);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].action, Action::EnterLong);
        assert_eq!(fired[0].bar_index, 3);
        assert_eq!(fired[0].reason, "BELOW(RSI(3), 30)");
        assert_eq!(fired[1].action, Action::Exit);
        assert_eq!(fired[1].reason, "ABOVE(RSI(3), 70)");
    }

    #[test]
    fn rising_series_never_enters() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);
        assert!(replay(&RsiReversion::new(RsiParams::default()), &bars).is_empty());
    }

    #[test]
    fn required_bars_is_period_plus_one() {
        assert_eq!(RsiReversion::new(RsiParams::default()).required_bars(), 15);
    }
}
