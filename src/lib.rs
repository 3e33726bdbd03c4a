//! Exact-arithmetic decision core for an automated futures trader.
//!
//! The crate turns a stream of market events (candles, ticks, fills)
//! into structured trading signals. It holds no exchange connectivity
//! and no account state: risk sizing and order routing live in the
//! consuming layer. All price math is done in [`rust_decimal`], never
//! binary floats.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod indicators;
pub mod models;
pub mod num;
pub mod position;
pub mod signal;
pub mod strategy;
pub mod structure;

pub use config::StrategyConfig;
pub use engine::{DisableMode, RunMode, SymbolEngine};
pub use error::{ArithmeticError, EngineError};
pub use history::HistoryBuffer;
pub use indicators::{IndicatorEngine, IndicatorSpec, IndicatorValue};
pub use models::{Candle, Fill, MarketEvent, Regime, Side, Ticker};
pub use position::{CloseReason, EntryPlan, ExitContext, ExitEvent, PositionStateMachine};
pub use signal::{MarketContext, Signal, SignalAction};
pub use strategy::{BreakoutPolicy, EntryProposal, MarketView, PatternReversalPolicy, StrategyPolicy};
