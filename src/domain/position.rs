//! Per-run position state.
//!
//! A strategy is either FLAT or LONG. The state is owned by one run and is
//! only replaced through `SignalStrategy::step`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyState {
    pub side: PositionSide,
    pub entry_price: Option<f64>,
    pub entry_index: Option<usize>,
    pub high_water_mark: Option<f64>,
}

impl StrategyState {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// LONG at `price`; the high-water mark starts at the entry price.
    pub fn entered(price: f64, index: usize) -> Self {
        Self {
            side: PositionSide::Long,
            entry_price: Some(price),
            entry_index: Some(index),
            high_water_mark: Some(price),
        }
    }

    /// Raises the high-water mark to `close` if it is higher. No-op while FLAT.
    pub fn with_high_water(&self, close: f64) -> Self {
        let mut next = self.clone();
        if next.is_long() {
            next.high_water_mark = Some(match next.high_water_mark {
                Some(hwm) => hwm.max(close),
                None => close,
            });
        }
        next
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => f.write_str("FLAT"),
            PositionSide::Long => f.write_str("LONG"),
        }
    }
}
