//! Signal vocabulary shared by strategies, the decision log and reports.

use crate::domain::error::SignalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    EnterLong,
    Exit,
    Hold,
}

/// Stable strategy identifiers used in config files and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    Ma,
    Macd,
    Bollinger,
    Rsi,
    Turtle,
    Kdj,
    DualThrust,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_id: StrategyId,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub action: Action,
    pub reason: String,
}

impl StrategyId {
    /// The seven strategies a composite can fuse, in display order.
    pub const BASE: [StrategyId; 7] = [
        StrategyId::Ma,
        StrategyId::Macd,
        StrategyId::Bollinger,
        StrategyId::Rsi,
        StrategyId::Turtle,
        StrategyId::Kdj,
        StrategyId::DualThrust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Ma => "ma",
            StrategyId::Macd => "macd",
            StrategyId::Bollinger => "bollinger",
            StrategyId::Rsi => "rsi",
            StrategyId::Turtle => "turtle",
            StrategyId::Kdj => "kdj",
            StrategyId::DualThrust => "dual_thrust",
            StrategyId::Composite => "composite",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        StrategyId::BASE
            .iter()
            .chain(std::iter::once(&StrategyId::Composite))
            .find(|id| id.as_str() == name)
            .copied()
            .ok_or(SignalError::UnknownStrategy { name })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::EnterLong => f.write_str("ENTER_LONG"),
            Action::Exit => f.write_str("EXIT"),
            Action::Hold => f.write_str("HOLD"),
        }
    }
}

impl Signal {
    pub fn hold(strategy_id: StrategyId, bar_index: usize, date: NaiveDate, reason: &str) -> Self {
        Self {
            strategy_id,
            bar_index,
            date,
            action: Action::Hold,
            reason: reason.to_string(),
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}
