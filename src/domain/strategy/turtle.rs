//! Turtle breakout on Donchian channels, with an optional trailing stop.
//!
//! Channels use the previous `entry_period` / `exit_period` bars only, so the
//! breakout bar never defines its own threshold.

use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::PriceField;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, PlotSeries, SignalStrategy, max_lookback};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleParams {
    pub entry_period: usize,
    pub exit_period: usize,
    pub trailing_stop_pct: f64,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            entry_period: 20,
            exit_period: 10,
            trailing_stop_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Turtle {
    trailing_stop_pct: f64,
    upper: IndicatorType,
    lower: IndicatorType,
    entry_rule: Rule,
    exit_rule: Rule,
}

impl Turtle {
    pub fn new(params: TurtleParams) -> Self {
        let upper = IndicatorType::DonchianHigh {
            field: PriceField::High,
            period: params.entry_period,
        };
        let lower = IndicatorType::DonchianLow {
            field: PriceField::Low,
            period: params.exit_period,
        };
        Self {
            trailing_stop_pct: params.trailing_stop_pct,
            entry_rule: Rule::Above {
                left: Operand::Close,
                right: Operand::value_of(upper.clone()),
            },
            exit_rule: Rule::Below {
                left: Operand::Close,
                right: Operand::value_of(lower.clone()),
            },
            upper,
            lower,
        }
    }
}

impl SignalStrategy for Turtle {
    fn id(&self) -> StrategyId {
        StrategyId::Turtle
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![self.upper.clone(), self.lower.clone()]
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
        if self.trailing_stop_pct <= 0.0 {
            return None;
        }

        let hwm = state.high_water_mark?;
        let stop = hwm * (1.0 - self.trailing_stop_pct);
        let close = ctx.close();
        (close <= stop).then(|| format!("TRAILING_STOP(CLOSE {:.4} <= {:.4})", close, stop))
    }

    fn plot_series(&self) -> Vec<PlotSeries> {
        vec![
            PlotSeries::new("donchian_high", IndicatorRef::value(self.upper.clone())),
            PlotSeries::new("donchian_low", IndicatorRef::value(self.lower.clone())),
        ]
    }

    fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            format!("entry: {}", self.entry_rule),
            format!("exit: {}", self.exit_rule),
        ];
        if self.trailing_stop_pct > 0.0 {
            lines.push(format!("exit: TRAILING_STOP({})", self.trailing_stop_pct));
        }
        lines
    }
}
