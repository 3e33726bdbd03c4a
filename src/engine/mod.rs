//! Per-symbol decision engine.
//!
//! One [`SymbolEngine`] owns the candle history, indicator cache,
//! position state machine and one strategy policy for a single
//! symbol. Every market event goes through [`SymbolEngine::handle`],
//! which returns the signals the execution layer should act on.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StrategyConfig;
use crate::history::HistoryBuffer;
use crate::indicators::IndicatorEngine;
use crate::models::{Candle, Fill, MarketEvent, Regime, Ticker};
use crate::position::{EntryPlan, ExitContext, ExitEvent, PositionStateMachine};
use crate::signal::{MarketContext, Signal, SignalAction};
use crate::strategy::{MarketView, StrategyPolicy};

/// Whether the engine may trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Normal operation: entries and exits.
    Active,
    /// No new entries; the open position is managed to its natural
    /// exit, then the engine halts.
    Draining,
    /// No trading decisions at all. History keeps ingesting so a
    /// re-enable starts warm.
    Halted,
}

/// How to stand the engine down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableMode {
    /// Stop entering; let the exit chain finish the open trade.
    Graceful,
    /// Close the open position now at the last seen price.
    Immediate,
}

/// Decision engine for one symbol-strategy pair.
pub struct SymbolEngine<P: StrategyPolicy> {
    symbol: String,
    config: StrategyConfig,
    policy: P,
    history: HistoryBuffer,
    indicators: IndicatorEngine,
    position: PositionStateMachine,
    regime: Option<Regime>,
    mode: RunMode,
    /// Last-write-wins price for synthetic closes.
    last_price: Option<Decimal>,
    last_timestamp: Option<DateTime<Utc>>,
    last_signal: Option<Signal>,
}

impl<P: StrategyPolicy> SymbolEngine<P> {
    pub fn new(symbol: impl Into<String>, config: StrategyConfig, policy: P) -> Self {
        let history = HistoryBuffer::new(config.history_capacity);
        let position = PositionStateMachine::new(&config);
        Self {
            symbol: symbol.into(),
            config,
            policy,
            history,
            indicators: IndicatorEngine::new(),
            position,
            regime: None,
            mode: RunMode::Active,
            last_price: None,
            last_timestamp: None,
            last_signal: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn position(&self) -> &PositionStateMachine {
        &self.position
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn last_signal(&self) -> Option<&Signal> {
        self.last_signal.as_ref()
    }

    /// Replace the externally-classified regime. Takes effect from the
    /// next event.
    pub fn set_regime(&mut self, regime: Option<Regime>) {
        self.regime = regime;
    }

    pub fn regime(&self) -> Option<Regime> {
        self.regime
    }

    /// Resume trading after a disable.
    pub fn enable(&mut self) {
        self.mode = RunMode::Active;
    }

    /// Stand the engine down. `Immediate` may emit one synthetic close
    /// signal for the open position.
    pub fn disable(&mut self, mode: DisableMode) -> Option<Signal> {
        match mode {
            DisableMode::Graceful => {
                self.mode = if self.position.is_flat() {
                    RunMode::Halted
                } else {
                    RunMode::Draining
                };
                info!(symbol = %self.symbol, mode = ?self.mode, "engine disabled");
                None
            }
            DisableMode::Immediate => {
                self.mode = RunMode::Halted;
                let price = self.last_price?;
                let exit = self.position.force_close(price)?;
                let timestamp = self.last_timestamp.unwrap_or_else(Utc::now);
                let signal = self.exit_signal(&exit, timestamp);
                info!(symbol = %self.symbol, price = %price, "position closed on disable");
                self.last_signal = Some(signal.clone());
                Some(signal)
            }
        }
    }

    /// Single dispatch point for market events.
    ///
    /// Candles drive entries and exits; ticks drive exits only; fills
    /// confirm pending entries. Never panics on out-of-phase input,
    /// the offending event is logged and dropped.
    pub fn handle(&mut self, event: MarketEvent) -> Vec<Signal> {
        match event {
            MarketEvent::Candle(candle) => self.on_candle(candle),
            MarketEvent::Tick(ticker) => self.on_tick(ticker),
            MarketEvent::Fill(fill) => {
                self.on_fill(&fill);
                Vec::new()
            }
        }
    }

    fn on_candle(&mut self, candle: Candle) -> Vec<Signal> {
        let close = candle.close;
        let timestamp = candle.timestamp;
        if let Err(err) = self.history.push(candle.clone()) {
            warn!(symbol = %self.symbol, "candle rejected: {err}");
            return Vec::new();
        }
        self.indicators.on_candle(&candle);
        self.last_price = Some(close);
        self.last_timestamp = Some(timestamp);
        self.position.on_candle_close();

        let mut signals = Vec::new();
        if self.mode != RunMode::Halted {
            if let Some(exit) = self.run_exit_chain(close) {
                signals.push(self.exit_signal(&exit, timestamp));
            }
        }
        self.settle_drain();
        if self.mode == RunMode::Active
            && self.position.is_flat()
            && self.history.len() >= self.policy.min_candles(&self.config)
        {
            if let Some(signal) = self.try_enter(close, timestamp) {
                signals.push(signal);
            }
        }
        if let Some(last) = signals.last() {
            self.last_signal = Some(last.clone());
        }
        signals
    }

    fn on_tick(&mut self, ticker: Ticker) -> Vec<Signal> {
        if ticker.last_price <= Decimal::ZERO {
            warn!(symbol = %self.symbol, price = %ticker.last_price, "ticker rejected");
            return Vec::new();
        }
        self.last_price = Some(ticker.last_price);
        self.last_timestamp = Some(ticker.timestamp);
        if self.mode == RunMode::Halted {
            return Vec::new();
        }
        let mut signals = Vec::new();
        if let Some(exit) = self.run_exit_chain(ticker.last_price) {
            signals.push(self.exit_signal(&exit, ticker.timestamp));
        }
        self.settle_drain();
        if let Some(last) = signals.last() {
            self.last_signal = Some(last.clone());
        }
        signals
    }

    fn on_fill(&mut self, fill: &Fill) {
        match self.position.confirm_fill(fill) {
            Ok(()) => {
                debug!(symbol = %self.symbol, price = %fill.price, "entry fill confirmed")
            }
            // Orphan or duplicate fill: log, keep state unchanged.
            Err(err) => PositionStateMachine::note_violation(&err),
        }
    }

    /// Run the exit-priority chain at `price` for the open position.
    fn run_exit_chain(&mut self, price: Decimal) -> Option<ExitEvent> {
        if !self.position.is_open() {
            return None;
        }
        let side = self.position.side();
        let mut view = MarketView {
            buffer: &self.history,
            indicators: &mut self.indicators,
            regime: self.regime,
            config: &self.config,
        };
        let ctx = ExitContext {
            atr: view.atr(),
            invalidation_level: self.policy.invalidation_level(&mut view, side),
        };
        self.position.on_price(price, &ctx)
    }

    fn settle_drain(&mut self) {
        if self.mode == RunMode::Draining && self.position.is_flat() {
            self.mode = RunMode::Halted;
            info!(symbol = %self.symbol, "drained flat, engine halted");
        }
    }

    fn try_enter(&mut self, close: Decimal, timestamp: DateTime<Utc>) -> Option<Signal> {
        let proposal = {
            let mut view = MarketView {
                buffer: &self.history,
                indicators: &mut self.indicators,
                regime: self.regime,
                config: &self.config,
            };
            self.policy.entry(&mut view)?
        };
        let quantity = self.sizing_hint();
        let plan = EntryPlan {
            side: proposal.side,
            price: close,
            quantity,
            stop_price: proposal.stop_price,
            take_profits: proposal.take_profits.clone(),
            reason: proposal.context.reason.clone(),
        };
        if let Err(err) = self.position.request_entry(plan) {
            PositionStateMachine::note_violation(&err);
            return None;
        }
        info!(
            symbol = %self.symbol,
            policy = self.policy.name(),
            side = ?proposal.side,
            price = %close,
            "entry signalled"
        );
        Some(Signal {
            id: Uuid::new_v4(),
            action: SignalAction::open_for(proposal.side),
            symbol: self.symbol.clone(),
            price: close,
            quantity,
            stop_loss: Some(proposal.stop_price),
            take_profit: proposal.take_profits.first().copied(),
            reduce_only: false,
            confidence: proposal.confidence,
            context: proposal.context,
            timestamp,
        })
    }

    /// Notional-fraction sizing hint: percent of equity times
    /// leverage. The execution layer scales it by account equity.
    fn sizing_hint(&self) -> Decimal {
        self.config.position_size_percent / dec!(100) * self.config.leverage
    }

    /// Exits are mandatory risk actions, so their confidence is 1.
    fn exit_signal(&mut self, exit: &ExitEvent, timestamp: DateTime<Utc>) -> Signal {
        let atr = {
            let mut view = MarketView {
                buffer: &self.history,
                indicators: &mut self.indicators,
                regime: self.regime,
                config: &self.config,
            };
            view.atr()
        };
        Signal {
            id: Uuid::new_v4(),
            action: SignalAction::close_for(exit.side),
            symbol: self.symbol.clone(),
            price: exit.price,
            quantity: exit.quantity,
            stop_loss: None,
            take_profit: None,
            reduce_only: !exit.full,
            confidence: Decimal::ONE,
            context: MarketContext {
                atr,
                regime: self.regime,
                reason: exit.reason.as_str().to_string(),
                ..MarketContext::default()
            },
            timestamp,
        }
    }
}
