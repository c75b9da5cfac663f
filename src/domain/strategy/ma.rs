//! Moving-average crossover with volume confirmation.
//!
//! Entry: SMA(fast) crosses above SMA(slow) with volume above its own SMA,
//! optionally requiring RSI above `rsi_low`. Exit: SMA(fast) crosses below
//! SMA(slow), or the close breaches the stop-loss / take-profit band around
//! the entry price. A band fraction of 0 disables that side.

use crate::domain::indicator::IndicatorType;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorRef, Operand, Rule, extract_indicators};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy, max_lookback};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaParams {
    pub fast: usize,
    pub slow: usize,
    pub volume_period: usize,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub use_rsi: bool,
    pub rsi_period: usize,
    pub rsi_low: f64,
}

impl Default for MaParams {
    fn default() -> Self {
        Self {
            fast: 5,
            slow: 20,
            volume_period: 20,
            stop_loss: 0.05,
            take_profit: 0.15,
            use_rsi: false,
            rsi_period: 14,
            rsi_low: 30.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaCrossover {
    params: MaParams,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl MaCrossover {
    pub fn new(params: MaParams) -> Self {
        let fast = Operand::value_of(IndicatorType::close_sma(params.fast));
        let slow = Operand::value_of(IndicatorType::close_sma(params.slow));

        let mut entry = vec![
            Rule::CrossAbove {
                left: fast.clone(),
                right: slow.clone(),
            },
            Rule::Above {
                left: Operand::Volume,
                right: Operand::value_of(IndicatorType::volume_sma(params.volume_period)),
            },
        ];
        if params.use_rsi {
            entry.push(Rule::Above {
                left: Operand::value_of(IndicatorType::Rsi(params.rsi_period)),
                right: Operand::Constant(params.rsi_low),
            });
        }

        Self {
            entry_rule: Rule::And(entry),
            exit_rule: Rule::CrossBelow {
                left: fast,
                right: slow,
            },
            params,
        }
    }

    pub fn params(&self) -> &MaParams {
        &self.params
    }
}

impl SignalStrategy for MaCrossover {
    fn id(&self) -> StrategyId {
        StrategyId::Ma
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        extract_indicators(&self.entry_rule)
    }

    fn required_bars(&self) -> usize {
        max_lookback(&self.indicators())
    }

    fn entry(&self, ctx: &BarContext<'_>) -> Option<String> {
        ctx.explain(&self.entry_rule)
    }

    fn exit(&self, ctx: &BarContext<'_>, state: &StrategyState) -> Option<String> {
        if let Some(reason) = ctx.explain(&self.exit_rule) {
            return Some(reason);
        }

        let entry = state.entry_price?;
        let close = ctx.close();
        if self.params.stop_loss > 0.0 {
            let stop = entry * (1.0 - self.params.stop_loss);
            if close < stop {
                return Some(format!("STOP_LOSS(CLOSE {:.4} < {:.4})", close, stop));
            }
        }
        if self.params.take_profit > 0.0 {
            let target = entry * (1.0 + self.params.take_profit);
            if close > target {
                return Some(format!("TAKE_PROFIT(CLOSE {:.4} > {:.4})", close, target));
            }
        }
        None
    }

    fn plot_series(&self) -> Vec<PlotSeries> {
        vec![
            PlotSeries::new(
                "sma_fast",
                IndicatorRef::value(IndicatorType::close_sma(self.params.fast)),
            ),
            PlotSeries::new(
                "sma_slow",
                IndicatorRef::value(IndicatorType::close_sma(self.params.slow)),
            ),
        ]
    }

    fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            format!("entry: {}", self.entry_rule),
            format!("exit: {}", self.exit_rule),
        ];
        if self.params.stop_loss > 0.0 {
            lines.push(format!("exit: STOP_LOSS({})", self.params.stop_loss));
        }
        if self.params.take_profit > 0.0 {
            lines.push(format!("exit: TAKE_PROFIT({})", self.params.take_profit));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::compute_indicators;
    use crate::domain::signal::Action;
    use crate::domain::strategy::test_support::{bars_from_closes, replay};

    fn small() -> MaParams {
        MaParams {
            fast: 2,
            slow: 4,
            volume_period: 2,
            stop_loss: 0.0,
            take_profit: 0.0,
            ..MaParams::default()
        }
    }

    #[test]
    fn defaults() {
        let p = MaParams::default();
        assert_eq!((p.fast, p.slow, p.volume_period), (5, 20, 20));
        assert_eq!(p.stop_loss, 0.05);
        assert_eq!(p.take_profit, 0.15);
        assert!(!p.use_rsi);
    }

    #[test]
    fn indicators_and_required_bars() {
        let strategy = MaCrossover::new(MaParams::default());
        assert_eq!(
            strategy.indicators(),
            vec![
                IndicatorType::close_sma(5),
                IndicatorType::close_sma(20),
                IndicatorType::volume_sma(20),
            ]
        );
        assert_eq!(strategy.required_bars(), 20);

        let with_rsi = MaCrossover::new(MaParams {
            use_rsi: true,
            rsi_period: 30,
            ..MaParams::default()
        });
        assert!(with_rsi.indicators().contains(&IndicatorType::Rsi(30)));
        assert_eq!(with_rsi.required_bars(), 31);
    }

    #[test]
    fn golden_cross_needs_volume() {
        let mut bars = bars_from_closes(&[10.0, 10.0, 10.0, 10.0, 9.0, 14.0]);
        let fired = replay(&MaCrossover::new(small()), &bars);
        // flat volume: volume never exceeds its own average
        assert!(fired.is_empty());

        bars[5].volume = 5000.0;
        let fired = replay(&MaCrossover::new(small()), &bars);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, Action::EnterLong);
        assert_eq!(fired[0].bar_index, 5);
        assert!(fired[0].reason.starts_with("AND(CROSS_ABOVE(SMA(2), SMA(4))"));
    }

    #[test]
    fn death_cross_exits() {
        let mut bars = bars_from_closes(&[10.0, 10.0, 10.0, 10.0, 9.0, 14.0, 15.0, 8.0, 6.0]);
        bars[5].volume = 5000.0;
        let fired = replay(&MaCrossover::new(small()), &bars);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].action, Action::Exit);
        assert_eq!(fired[1].reason, "CROSS_BELOW(SMA(2), SMA(4))");
    }

    #[test]
    fn stop_loss_and_take_profit() {
        let bars = bars_from_closes(&[100.0, 94.0, 116.0, 100.0]);
        let indicators = compute_indicators(&bars, &[]);
        let strategy = MaCrossover::new(MaParams::default());
        let state = StrategyState::entered(100.0, 0);

        let stop = strategy.exit(&BarContext::new(&bars, &indicators, 1), &state);
        assert!(stop.unwrap().starts_with("STOP_LOSS"));

        let target = strategy.exit(&BarContext::new(&bars, &indicators, 2), &state);
        assert!(target.unwrap().starts_with("TAKE_PROFIT"));

        assert!(strategy.exit(&BarContext::new(&bars, &indicators, 3), &state).is_none());
    }

    #[test]
    fn zero_band_disables_stops() {
        let bars = bars_from_closes(&[100.0, 10.0, 1000.0]);
        let indicators = compute_indicators(&bars, &[]);
        let strategy = MaCrossover::new(small());
        let state = StrategyState::entered(100.0, 0);
        assert!(strategy.exit(&BarContext::new(&bars, &indicators, 1), &state).is_none());
        assert!(strategy.exit(&BarContext::new(&bars, &indicators, 2), &state).is_none());
    }

    #[test]
    fn rsi_gate_blocks_entry() {
        let mut bars = bars_from_closes(&[10.0, 10.0, 10.0, 10.0, 9.0, 14.0]);
        bars[5].volume = 5000.0;
        let gated = MaCrossover::new(MaParams {
            use_rsi: true,
            rsi_period: 2,
            rsi_low: 101.0,
            ..small()
        });
        assert!(replay(&gated, &bars).is_empty());
    }
}
