//! Strategy signal units.
//!
//! Each strategy is a stateless value implementing [`SignalStrategy`]. Position
//! state lives in [`StrategyState`] and is threaded through [`SignalStrategy::step`]
//! by the run driver, so a strategy instance can be shared across runs.

pub mod bollinger;
pub mod composite;
pub mod dual_thrust;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod turtle;

pub use bollinger::{BollingerParams, BollingerReversion};
pub use composite::{CompositeConfig, CompositeStrategy};
pub use dual_thrust::{DualThrust, DualThrustParams};
pub use kdj::{Kdj, KdjParams};
pub use ma::{MaCrossover, MaParams};
pub use macd::{MacdCross, MacdParams};
pub use rsi::{RsiParams, RsiReversion};
pub use turtle::{Turtle, TurtleParams};

use crate::domain::config_validation;
use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorRef, Rule};
use crate::domain::rule_eval;
use crate::domain::signal::{Action, Signal, StrategyId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only view of one bar and everything computed before the run.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bars: &'a [OhlcvBar],
    pub indicators: &'a HashMap<IndicatorType, IndicatorSeries>,
    pub index: usize,
}

impl<'a> BarContext<'a> {
    pub fn new(
        bars: &'a [OhlcvBar],
        indicators: &'a HashMap<IndicatorType, IndicatorSeries>,
        index: usize,
    ) -> Self {
        Self {
            bars,
            indicators,
            index,
        }
    }

    pub fn bar(&self) -> &'a OhlcvBar {
        &self.bars[self.index]
    }

    pub fn close(&self) -> f64 {
        self.bar().close
    }

    pub fn holds(&self, rule: &Rule) -> bool {
        rule_eval::evaluate(rule, self.bars, self.indicators, self.index)
    }

    pub fn explain(&self, rule: &Rule) -> Option<String> {
        rule_eval::explain(rule, self.bars, self.indicators, self.index)
    }

    /// Indicator field at the current bar; `NaN` while undefined.
    pub fn value(&self, source: &IndicatorRef) -> f64 {
        rule_eval::resolve_indicator(source, self.indicators, self.index)
    }
}

/// A named overlay line a strategy exposes for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub source: IndicatorRef,
}

impl PlotSeries {
    pub fn new(name: impl Into<String>, source: IndicatorRef) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

pub trait SignalStrategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Every indicator the strategy reads, including plot-only ones.
    fn indicators(&self) -> Vec<IndicatorType>;

    /// Bars needed before any decision can be made.
    fn required_bars(&self) -> usize;

    /// FLAT-state predicate. `Some(reason)` means enter long at this bar's close.
    fn entry(&self, ctx: &BarContext<'_>) -> Option<String>;

    /// LONG-state predicate. `state` already carries this bar's high-water mark.
    fn exit(&self, ctx: &BarContext<'_>, state: &StrategyState) -> Option<String>;

    fn plot_series(&self) -> Vec<PlotSeries>;

    /// Human-readable rules, one line per entry/exit condition.
    fn describe(&self) -> Vec<String>;

    /// Advances the position state by one bar.
    ///
    /// FLAT evaluates only the entry predicate; LONG first raises the
    /// high-water mark and then evaluates only the exit predicate.
    fn step(&self, state: &StrategyState, ctx: &BarContext<'_>) -> (StrategyState, Signal) {
        let bar = ctx.bar();
        let signal = |action, reason: String| Signal {
            strategy_id: self.id(),
            bar_index: ctx.index,
            date: bar.date,
            action,
            reason,
        };

        if !state.is_long() {
            return match self.entry(ctx) {
                Some(reason) => (
                    StrategyState::entered(bar.close, ctx.index),
                    signal(Action::EnterLong, reason),
                ),
                None => (state.clone(), signal(Action::Hold, "no entry".into())),
            };
        }

        let held = state.with_high_water(bar.close);
        match self.exit(ctx, &held) {
            Some(reason) => (StrategyState::flat(), signal(Action::Exit, reason)),
            None => (held, signal(Action::Hold, "holding".into())),
        }
    }
}

/// Longest lookback among `types`.
pub(crate) fn max_lookback<'a>(types: impl IntoIterator<Item = &'a IndicatorType>) -> usize {
    types.into_iter().map(IndicatorType::lookback).max().unwrap_or(0)
}

/// Parameter sets for all seven base strategies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberParams {
    pub ma: MaParams,
    pub macd: MacdParams,
    pub bollinger: BollingerParams,
    pub rsi: RsiParams,
    pub turtle: TurtleParams,
    pub kdj: KdjParams,
    pub dual_thrust: DualThrustParams,
}

impl MemberParams {
    /// Single-strategy config for a base strategy id.
    pub fn config_for(&self, id: StrategyId) -> Option<StrategyConfig> {
        let config = match id {
            StrategyId::Ma => StrategyConfig::Ma(self.ma.clone()),
            StrategyId::Macd => StrategyConfig::Macd(self.macd.clone()),
            StrategyId::Bollinger => StrategyConfig::Bollinger(self.bollinger.clone()),
            StrategyId::Rsi => StrategyConfig::Rsi(self.rsi.clone()),
            StrategyId::Turtle => StrategyConfig::Turtle(self.turtle.clone()),
            StrategyId::Kdj => StrategyConfig::Kdj(self.kdj.clone()),
            StrategyId::DualThrust => StrategyConfig::DualThrust(self.dual_thrust.clone()),
            StrategyId::Composite => return None,
        };
        Some(config)
    }

    pub(crate) fn build_member(&self, id: StrategyId) -> Option<Box<dyn SignalStrategy>> {
        let member: Box<dyn SignalStrategy> = match id {
            StrategyId::Ma => Box::new(MaCrossover::new(self.ma.clone())),
            StrategyId::Macd => Box::new(MacdCross::new(self.macd.clone())),
            StrategyId::Bollinger => Box::new(BollingerReversion::new(self.bollinger.clone())),
            StrategyId::Rsi => Box::new(RsiReversion::new(self.rsi.clone())),
            StrategyId::Turtle => Box::new(Turtle::new(self.turtle.clone())),
            StrategyId::Kdj => Box::new(Kdj::new(self.kdj.clone())),
            StrategyId::DualThrust => Box::new(DualThrust::new(self.dual_thrust.clone())),
            StrategyId::Composite => return None,
        };
        Some(member)
    }
}

/// Selects and parameterises one strategy for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Ma(MaParams),
    Macd(MacdParams),
    Bollinger(BollingerParams),
    Rsi(RsiParams),
    Turtle(TurtleParams),
    Kdj(KdjParams),
    DualThrust(DualThrustParams),
    Composite(CompositeConfig),
}

impl StrategyConfig {
    pub fn id(&self) -> StrategyId {
        match self {
            StrategyConfig::Ma(_) => StrategyId::Ma,
            StrategyConfig::Macd(_) => StrategyId::Macd,
            StrategyConfig::Bollinger(_) => StrategyId::Bollinger,
            StrategyConfig::Rsi(_) => StrategyId::Rsi,
            StrategyConfig::Turtle(_) => StrategyId::Turtle,
            StrategyConfig::Kdj(_) => StrategyId::Kdj,
            StrategyConfig::DualThrust(_) => StrategyId::DualThrust,
            StrategyConfig::Composite(_) => StrategyId::Composite,
        }
    }

    /// Validates parameters and builds the strategy. Fails before any bar is seen.
    pub fn build(&self) -> Result<Box<dyn SignalStrategy>, SignalError> {
        config_validation::validate_strategy(self)?;
        let strategy: Box<dyn SignalStrategy> = match self {
            StrategyConfig::Ma(p) => Box::new(MaCrossover::new(p.clone())),
            StrategyConfig::Macd(p) => Box::new(MacdCross::new(p.clone())),
            StrategyConfig::Bollinger(p) => Box::new(BollingerReversion::new(p.clone())),
            StrategyConfig::Rsi(p) => Box::new(RsiReversion::new(p.clone())),
            StrategyConfig::Turtle(p) => Box::new(Turtle::new(p.clone())),
            StrategyConfig::Kdj(p) => Box::new(Kdj::new(p.clone())),
            StrategyConfig::DualThrust(p) => Box::new(DualThrust::new(p.clone())),
            StrategyConfig::Composite(c) => Box::new(CompositeStrategy::new(c.clone())?),
        };
        Ok(strategy)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::indicator::compute_indicators;
    use chrono::NaiveDate;

    pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
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

    /// Runs `step` across all bars from FLAT and returns every non-HOLD signal.
    pub fn replay(strategy: &dyn SignalStrategy, bars: &[OhlcvBar]) -> Vec<Signal> {
        let indicators = compute_indicators(bars, &strategy.indicators());
        let mut state = StrategyState::flat();
        let mut fired = Vec::new();
        for index in 0..bars.len() {
            let ctx = BarContext::new(bars, &indicators, index);
            let (next, signal) = strategy.step(&state, &ctx);
            state = next;
            if !signal.is_hold() {
                fired.push(signal);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::indicator::compute_indicators;
    use crate::domain::position::PositionSide;

    struct CloseAbove(f64, f64);

    impl SignalStrategy for CloseAbove {
        fn id(&self) -> StrategyId {
            StrategyId::Rsi
        }
        fn indicators(&self) -> Vec<IndicatorType> {
            Vec::new()
        }
        fn required_bars(&self) -> usize {
            1
        }
        fn entry(&self, ctx: &BarContext<'_>) -> Option<String> {
            (ctx.close() > self.0).then(|| "up".to_string())
        }
        fn exit(&self, ctx: &BarContext<'_>, _state: &StrategyState) -> Option<String> {
            (ctx.close() < self.1).then(|| "down".to_string())
        }
        fn plot_series(&self) -> Vec<PlotSeries> {
            Vec::new()
        }
        fn describe(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn step_enters_at_close_and_sets_high_water() {
        let bars = bars_from_closes(&[10.0, 20.0]);
        let indicators = compute_indicators(&bars, &[]);
        let strategy = CloseAbove(15.0, 5.0);

        let (state, signal) = strategy.step(&StrategyState::flat(), &BarContext::new(&bars, &indicators, 0));
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(state.side, PositionSide::Flat);

        let (state, signal) = strategy.step(&state, &BarContext::new(&bars, &indicators, 1));
        assert_eq!(signal.action, Action::EnterLong);
        assert_eq!(signal.reason, "up");
        assert_eq!(state.entry_price, Some(20.0));
        assert_eq!(state.high_water_mark, Some(20.0));
        assert_eq!(state.entry_index, Some(1));
    }

    #[test]
    fn step_long_updates_high_water_then_exits() {
        let bars = bars_from_closes(&[20.0, 30.0, 4.0]);
        let indicators = compute_indicators(&bars, &[]);
        let strategy = CloseAbove(15.0, 5.0);

        let state = StrategyState::entered(20.0, 0);
        let (state, signal) = strategy.step(&state, &BarContext::new(&bars, &indicators, 1));
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(state.high_water_mark, Some(30.0));

        let (state, signal) = strategy.step(&state, &BarContext::new(&bars, &indicators, 2));
        assert_eq!(signal.action, Action::Exit);
        assert_eq!(state, StrategyState::flat());
    }

    #[test]
    fn step_never_evaluates_entry_while_long() {
        let bars = bars_from_closes(&[100.0]);
        let indicators = compute_indicators(&bars, &[]);
        let strategy = CloseAbove(15.0, 5.0);
        let (state, signal) = strategy.step(
            &StrategyState::entered(90.0, 0),
            &BarContext::new(&bars, &indicators, 0),
        );
        assert_eq!(signal.action, Action::Hold);
        assert!(state.is_long());
    }

    #[test]
    fn replay_alternates() {
        let bars = bars_from_closes(&[10.0, 20.0, 21.0, 3.0, 30.0, 2.0]);
        let fired = replay(&CloseAbove(15.0, 5.0), &bars);
        let actions: Vec<Action> = fired.iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![Action::EnterLong, Action::Exit, Action::EnterLong, Action::Exit]
        );
    }

    #[test]
    fn config_for_every_base_id() {
        let members = MemberParams::default();
        for id in StrategyId::BASE {
            let config = members.config_for(id).unwrap();
            assert_eq!(config.id(), id);
            assert_eq!(members.build_member(id).unwrap().id(), id);
        }
        assert!(members.config_for(StrategyId::Composite).is_none());
    }

    #[test]
    fn strategy_config_serde_is_tagged() {
        let config = StrategyConfig::Rsi(RsiParams::default());
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kind"], "rsi");
        assert_eq!(json["period"], 14);
        let back: StrategyConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn build_rejects_invalid_params() {
        let config = StrategyConfig::Rsi(RsiParams {
            period: 0,
            ..RsiParams::default()
        });
        let err = config.build().err().unwrap();
        assert!(err.is_configuration());
    }
}
