//! Run driver: replays a bar sequence through one strategy.
//!
//! Indicators are computed once for the whole sequence, then each bar is
//! stepped in order. Bars inside the warm-up span emit HOLD; a sequence shorter
//! than the warm-up span emits only HOLD and is flagged with a shortfall.

use crate::domain::decision_log::DecisionLog;
use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, compute_indicators};
use crate::domain::ohlcv::{OhlcvBar, validate_bars};
use crate::domain::position::StrategyState;
use crate::domain::rule_eval::resolve_indicator;
use crate::domain::signal::{Signal, StrategyId};
use crate::domain::strategy::{BarContext, SignalStrategy};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataShortfall {
    pub bars: usize,
    pub required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub high_water_mark: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub strategy_id: StrategyId,
    /// One signal per input bar, HOLD included.
    pub signals: Vec<Signal>,
    pub log: DecisionLog,
    pub final_state: StrategyState,
    pub shortfall: Option<DataShortfall>,
    /// Plot overlays by name; `NaN` where the indicator is undefined.
    pub overlays: BTreeMap<String, Vec<f64>>,
}

impl RunResult {
    /// The position still held after the last bar, if any.
    pub fn open_position(&self) -> Option<OpenPosition> {
        if !self.final_state.is_long() {
            return None;
        }
        let entry_index = self.final_state.entry_index?;
        let entry_price = self.final_state.entry_price?;
        Some(OpenPosition {
            entry_index,
            entry_date: self.signals.get(entry_index)?.date,
            entry_price,
            high_water_mark: self.final_state.high_water_mark.unwrap_or(entry_price),
        })
    }
}

/// Validates the bars, computes indicators and runs the strategy.
pub fn run_strategy(strategy: &dyn SignalStrategy, bars: &[OhlcvBar]) -> Result<RunResult, SignalError> {
    if bars.is_empty() {
        return Err(SignalError::NoData {
            code: strategy.id().to_string(),
        });
    }
    validate_bars(bars)?;

    let indicators = compute_indicators(bars, &strategy.indicators());
    run_with_indicators(strategy, bars, &indicators)
}

/// Runs over precomputed indicators. `bars` must already be validated.
pub fn run_with_indicators(
    strategy: &dyn SignalStrategy,
    bars: &[OhlcvBar],
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
) -> Result<RunResult, SignalError> {
    let required = strategy.required_bars();
    let shortfall = (bars.len() < required).then(|| DataShortfall {
        bars: bars.len(),
        required,
    });
    if shortfall.is_some() {
        warn!(
            strategy = %strategy.id(),
            bars = bars.len(),
            required,
            "not enough bars for a decision; every bar will HOLD"
        );
    }

    let mut state = StrategyState::flat();
    let mut log = DecisionLog::new();
    let mut signals = Vec::with_capacity(bars.len());

    for (index, bar) in bars.iter().enumerate() {
        if shortfall.is_some() || index + 1 < required {
            signals.push(Signal::hold(strategy.id(), index, bar.date, "warming up"));
            continue;
        }

        let ctx = BarContext::new(bars, indicators, index);
        let (next, signal) = strategy.step(&state, &ctx);
        if !signal.is_hold() {
            log.record_signal(&signal, bar.close)?;
        }
        state = next;
        signals.push(signal);
    }

    let overlays = strategy
        .plot_series()
        .into_iter()
        .map(|plot| {
            let values = (0..bars.len())
                .map(|i| resolve_indicator(&plot.source, indicators, i))
                .collect();
            (plot.name, values)
        })
        .collect();

    debug!(
        strategy = %strategy.id(),
        bars = bars.len(),
        decisions = log.len(),
        final_side = %state.side,
        "run complete"
    );

    Ok(RunResult {
        strategy_id: strategy.id(),
        signals,
        log,
        final_state: state,
        shortfall,
        overlays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use crate::domain::strategy::test_support::bars_from_closes;
    use crate::domain::strategy::{RsiParams, StrategyConfig};

    fn rsi3() -> Box<dyn SignalStrategy> {
        StrategyConfig::Rsi(RsiParams {
            period: 3,
            ..RsiParams::default()
        })
        .build()
        .unwrap()
    }

    fn swing() -> Vec<OhlcvBar> {
        bars_from_closes(&[50.0, 48.0, 46.0, 44.0, 46.0, 49.0, 53.0, 52.0, 50.0, 47.0, 44.0, 41.0])
    }

    #[test]
    fn one_signal_per_bar() {
        let bars = swing();
        let result = run_strategy(rsi3().as_ref(), &bars).unwrap();
        assert_eq!(result.signals.len(), bars.len());
        assert_eq!(result.strategy_id, StrategyId::Rsi);
        for (i, s) in result.signals.iter().enumerate() {
            assert_eq!(s.bar_index, i);
            assert_eq!(s.date, bars[i].date);
        }
    }

    #[test]
    fn warm_up_bars_hold() {
        let result = run_strategy(rsi3().as_ref(), &swing()).unwrap();
        for s in &result.signals[..3] {
            assert_eq!(s.action, Action::Hold);
            assert_eq!(s.reason, "warming up");
        }
        assert_eq!(result.signals[3].action, Action::EnterLong);
    }

    #[test]
    fn log_mirrors_non_hold_signals() {
        let result = run_strategy(rsi3().as_ref(), &swing()).unwrap();
        let fired: Vec<&Signal> = result.signals.iter().filter(|s| !s.is_hold()).collect();
        assert_eq!(fired.len(), result.log.len());
        for (signal, record) in fired.iter().zip(result.log.iter()) {
            assert_eq!(signal.action, record.action);
            assert_eq!(signal.bar_index, record.bar_index);
        }
        assert_eq!(result.log.records()[0].price, 44.0);
    }

    #[test]
    fn short_sequence_is_all_hold_with_shortfall() {
        let bars = bars_from_closes(&[10.0, 9.0]);
        let result = run_strategy(rsi3().as_ref(), &bars).unwrap();
        assert!(result.signals.iter().all(Signal::is_hold));
        assert!(result.log.is_empty());
        assert_eq!(
            result.shortfall,
            Some(DataShortfall {
                bars: 2,
                required: 4,
            })
        );
    }

    #[test]
    fn empty_bars_is_no_data() {
        let err = run_strategy(rsi3().as_ref(), &[]).unwrap_err();
        assert!(matches!(err, SignalError::NoData { .. }));
    }

    #[test]
    fn unordered_bars_rejected() {
        let mut bars = swing();
        bars.swap(2, 3);
        let err = run_strategy(rsi3().as_ref(), &bars).unwrap_err();
        assert!(matches!(err, SignalError::InvalidBars { .. }));
    }

    #[test]
    fn overlays_align_with_bars() {
        let bars = swing();
        let result = run_strategy(rsi3().as_ref(), &bars).unwrap();
        let rsi = &result.overlays["rsi"];
        assert_eq!(rsi.len(), bars.len());
        assert!(rsi[2].is_nan());
        assert_eq!(rsi[3], 0.0);
    }

    #[test]
    fn open_position_reported_from_final_state() {
        let bars = bars_from_closes(&[50.0, 48.0, 46.0, 44.0, 43.0]);
        let result = run_strategy(rsi3().as_ref(), &bars).unwrap();
        let open = result.open_position().unwrap();
        assert_eq!(open.entry_index, 3);
        assert_eq!(open.entry_price, 44.0);
        assert_eq!(open.entry_date, bars[3].date);
        assert_eq!(open.high_water_mark, 44.0);
    }

    #[test]
    fn deterministic_rerun() {
        let bars = swing();
        let strategy = rsi3();
        let a = run_strategy(strategy.as_ref(), &bars).unwrap();
        let b = run_strategy(strategy.as_ref(), &bars).unwrap();
        assert_eq!(a.log, b.log);
        assert_eq!(a.signals, b.signals);
        assert_eq!(a.final_state, b.final_state);
    }
}
