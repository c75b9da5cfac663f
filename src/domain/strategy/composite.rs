//! Composite signal fusion.
//!
//! Fuses a non-empty subset of the seven base strategies: entry requires every
//! selected member's entry predicate (and the optional trend / volume gates),
//! exit fires on any selected member's exit predicate. Member exits see the
//! composite's own entry price and high-water mark.
//!
//! Indicators of all seven members are computed so they can be plotted; only
//! selected members and enabled gates take part in decisions and warm-up.

use crate::domain::error::SignalError;
use crate::domain::indicator::IndicatorType;
use crate::domain::position::StrategyState;
use crate::domain::rule::{IndicatorRef, Operand, Rule};
use crate::domain::signal::StrategyId;
use crate::domain::strategy::{BarContext, MemberParams, PlotSeries, SignalStrategy, max_lookback};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub enabled: BTreeSet<StrategyId>,
    pub use_trend_filter: bool,
    pub trend_period: usize,
    pub use_volume_filter: bool,
    pub volume_period: usize,
    pub members: MemberParams,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            enabled: BTreeSet::from([StrategyId::Kdj]),
            use_trend_filter: true,
            trend_period: 60,
            use_volume_filter: false,
            volume_period: 20,
            members: MemberParams::default(),
        }
    }
}

impl CompositeConfig {
    fn gate_rules(&self) -> Vec<Rule> {
        let mut gates = Vec::new();
        if self.use_trend_filter {
            gates.push(Rule::AtLeast {
                left: Operand::Close,
                right: Operand::value_of(IndicatorType::close_sma(self.trend_period)),
            });
        }
        if self.use_volume_filter {
            gates.push(Rule::Above {
                left: Operand::Volume,
                right: Operand::value_of(IndicatorType::volume_sma(self.volume_period)),
            });
        }
        gates
    }

    fn gate_indicators(&self) -> Vec<IndicatorType> {
        let mut types = Vec::new();
        if self.use_trend_filter {
            types.push(IndicatorType::close_sma(self.trend_period));
        }
        if self.use_volume_filter {
            types.push(IndicatorType::volume_sma(self.volume_period));
        }
        types
    }
}

pub struct CompositeStrategy {
    config: CompositeConfig,
    /// All seven base strategies, in `StrategyId::BASE` order.
    members: Vec<Box<dyn SignalStrategy>>,
    gates: Vec<Rule>,
}

impl CompositeStrategy {
    pub fn new(config: CompositeConfig) -> Result<Self, SignalError> {
        if config.enabled.is_empty() {
            return Err(SignalError::EmptySignalSet);
        }
        if config.enabled.contains(&StrategyId::Composite) {
            return Err(SignalError::invalid(
                "composite",
                "signals",
                "a composite cannot include itself",
            ));
        }

        let members = StrategyId::BASE
            .iter()
            .filter_map(|&id| config.members.build_member(id))
            .collect();

        Ok(Self {
            gates: config.gate_rules(),
            members,
            config,
        })
    }

    fn selected(&self) -> impl Iterator<Item = &dyn SignalStrategy> {
        self.members
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| self.config.enabled.contains(&m.id()))
    }

    /// Trend / volume gate; an undefined moving average closes the gate.
    pub fn can_trade(&self, ctx: &BarContext<'_>) -> bool {
        self.gates.iter().all(|g| ctx.holds(g))
    }
}

impl SignalStrategy for CompositeStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Composite
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        let mut types: Vec<IndicatorType> = Vec::new();
        let all = self
            .members
            .iter()
            .flat_map(|m| m.indicators())
            .chain(self.config.gate_indicators());
        for t in all {
            if !types.contains(&t) {
                types.push(t);
            }
        }
        types
    }

    fn required_bars(&self) -> usize {
        let members = self.selected().map(|m| m.required_bars()).max().unwrap_or(0);
        members.max(max_lookback(&self.config.gate_indicators()))
    }

    fn entry(&self, ctx: &BarContext<'_>) -> Option<String> {
        if !self.can_trade(ctx) {
            return None;
        }
        let mut reasons = Vec::new();
        for member in self.selected() {
            let reason = member.entry(ctx)?;
            reasons.push(format!("{}: {}", member.id(), reason));
        }
        Some(format!("ALL[{}]", reasons.join("; ")))
    }

    fn exit(&self, ctx: &BarContext<'_>, state: &StrategyState) -> Option<String> {
        self.selected().find_map(|member| {
            member
                .exit(ctx, state)
                .map(|reason| format!("ANY[{}: {}]", member.id(), reason))
        })
    }

    fn plot_series(&self) -> Vec<PlotSeries> {
        let mut series: Vec<PlotSeries> = self
            .members
            .iter()
            .flat_map(|m| {
                let id = m.id();
                m.plot_series()
                    .into_iter()
                    .map(move |p| PlotSeries::new(format!("{}.{}", id, p.name), p.source))
            })
            .collect();
        if self.config.use_trend_filter {
            series.push(PlotSeries::new(
                "trend_sma",
                IndicatorRef::value(IndicatorType::close_sma(self.config.trend_period)),
            ));
        }
        if self.config.use_volume_filter {
            series.push(PlotSeries::new(
                "volume_sma",
                IndicatorRef::value(IndicatorType::volume_sma(self.config.volume_period)),
            ));
        }
        series
    }

    fn describe(&self) -> Vec<String> {
        let names: Vec<&str> = self.config.enabled.iter().map(|id| id.as_str()).collect();
        let mut lines = vec![format!("signals: {}", names.join(", "))];
        for gate in &self.gates {
            lines.push(format!("gate: {}", gate));
        }
        for member in self.selected() {
            for line in member.describe() {
                lines.push(format!("{}.{}", member.id(), line));
            }
        }
        lines
    }
}
