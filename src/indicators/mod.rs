//! Incremental indicator engine.
//!
//! Stateful indicators (EMA, RSI, MACD, ATR) roll forward O(1) per new
//! bar from running accumulators; window indicators (SMA, Stochastic,
//! Bollinger, VWAP, Donchian) recompute over a bounded trailing
//! window. Every computed value is memoized by `(indicator, params)`
//! for the current bar, so repeated reads inside one strategy
//! evaluation are free and referentially consistent.

pub mod atr;
pub mod bands;
pub mod macd;
pub mod moving_average;
pub mod oscillators;
pub mod rsi;
pub mod vwap;

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::history::HistoryBuffer;
use crate::models::Candle;

pub use atr::{true_range, AtrState};
pub use bands::{bollinger, donchian, BollingerValue, ChannelValue};
pub use macd::{MacdState, MacdValue};
pub use moving_average::{ema, sma, EmaState};
pub use oscillators::{stochastic, StochasticValue};
pub use rsi::RsiState;
pub use vwap::vwap;

/// Cache key: indicator kind plus its full parameter set.
///
/// The same spec always maps to the same cached value for a given
/// buffer state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorSpec {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd { fast: usize, slow: usize, signal: usize },
    Atr(usize),
    Stochastic { k_period: usize, d_period: usize },
    Bollinger { period: usize, mult: Decimal },
    Vwap(usize),
    Donchian(usize),
}

/// A computed indicator reading.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Scalar(Decimal),
    Macd(MacdValue),
    Stochastic(StochasticValue),
    Bollinger(BollingerValue),
    Channel(ChannelValue),
}

impl IndicatorValue {
    /// The scalar payload, if this reading is single-valued.
    pub fn as_scalar(&self) -> Option<Decimal> {
        match self {
            IndicatorValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum StatefulIndicator {
    Ema(EmaState),
    Rsi(rsi::RsiState),
    Macd(MacdState),
    Atr(AtrState),
}

impl StatefulIndicator {
    fn for_spec(spec: &IndicatorSpec) -> Option<Self> {
        match *spec {
            IndicatorSpec::Ema(p) => Some(Self::Ema(EmaState::new(p))),
            IndicatorSpec::Rsi(p) => Some(Self::Rsi(rsi::RsiState::new(p))),
            IndicatorSpec::Macd { fast, slow, signal } => {
                Some(Self::Macd(MacdState::new(fast, slow, signal)))
            }
            IndicatorSpec::Atr(p) => Some(Self::Atr(AtrState::new(p))),
            _ => None,
        }
    }

    fn update(&mut self, candle: &Candle) {
        match self {
            Self::Ema(s) => s.update(candle.close),
            Self::Rsi(s) => s.update(candle.close),
            Self::Macd(s) => s.update(candle.close),
            Self::Atr(s) => s.update(candle),
        }
    }

    fn value(&self) -> Option<IndicatorValue> {
        match self {
            Self::Ema(s) => s.value().map(IndicatorValue::Scalar),
            Self::Rsi(s) => s.value().map(IndicatorValue::Scalar),
            Self::Macd(s) => s.value().map(IndicatorValue::Macd),
            Self::Atr(s) => s.value().map(IndicatorValue::Scalar),
        }
    }
}

#[derive(Debug, Clone)]
struct MemoEntry {
    seq: u64,
    value: Option<IndicatorValue>,
}

/// Per symbol-strategy indicator cache.
///
/// Mutated only from that symbol's own candle-arrival path; not
/// shared across actors.
#[derive(Debug, Default, Clone)]
pub struct IndicatorEngine {
    states: HashMap<IndicatorSpec, StatefulIndicator>,
    memo: HashMap<IndicatorSpec, MemoEntry>,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll every registered accumulator with the candle that was just
    /// pushed into the buffer, and invalidate the per-bar memo.
    pub fn on_candle(&mut self, candle: &Candle) {
        for state in self.states.values_mut() {
            state.update(candle);
        }
        self.memo.clear();
    }

    /// Memoized read of `spec` at the buffer's current bar.
    ///
    /// `None` means insufficient history (warm-up), a normal
    /// recoverable condition, never an error. Within one bar, repeated
    /// calls return the identical value without recomputation.
    pub fn get(&mut self, buffer: &HistoryBuffer, spec: &IndicatorSpec) -> Option<IndicatorValue> {
        let seq = buffer.seq();
        if let Some(entry) = self.memo.get(spec) {
            if entry.seq == seq {
                return entry.value.clone();
            }
        }
        let value = self.compute(buffer, spec);
        self.memo.insert(
            spec.clone(),
            MemoEntry {
                seq,
                value: value.clone(),
            },
        );
        value
    }

    /// Convenience for single-valued indicators.
    pub fn get_scalar(&mut self, buffer: &HistoryBuffer, spec: &IndicatorSpec) -> Option<Decimal> {
        self.get(buffer, spec).and_then(|v| v.as_scalar())
    }

    fn compute(&mut self, buffer: &HistoryBuffer, spec: &IndicatorSpec) -> Option<IndicatorValue> {
        match *spec {
            IndicatorSpec::Sma(p) => sma(buffer, p).map(IndicatorValue::Scalar),
            IndicatorSpec::Stochastic { k_period, d_period } => {
                stochastic(buffer, k_period, d_period).map(IndicatorValue::Stochastic)
            }
            IndicatorSpec::Bollinger { period, mult } => {
                bollinger(buffer, period, mult).map(IndicatorValue::Bollinger)
            }
            IndicatorSpec::Vwap(p) => vwap(buffer, p).map(IndicatorValue::Scalar),
            IndicatorSpec::Donchian(p) => donchian(buffer, p).map(IndicatorValue::Channel),
            _ => {
                // Stateful kind: register on first access, seeded by
                // replaying the retained history, then read.
                if !self.states.contains_key(spec) {
                    let mut state = StatefulIndicator::for_spec(spec)?;
                    for candle in buffer.iter() {
                        state.update(candle);
                    }
                    self.states.insert(spec.clone(), state);
                }
                self.states.get(spec)?.value()
            }
        }
    }
}
