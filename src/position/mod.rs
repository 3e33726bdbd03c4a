use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::models::{Fill, Side};

/// Lifecycle phase of one symbol-strategy position slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPhase {
    Flat,
    /// Entry signalled, waiting for the fill to bind price/quantity.
    PendingEntry,
    Open,
}

/// Why an open position was reduced or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    StructureInvalidation,
    TrailingStop,
    PartialTarget,
    Disabled,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TakeProfit => "take_profit",
            CloseReason::StructureInvalidation => "structure_invalidation",
            CloseReason::TrailingStop => "trailing_stop",
            CloseReason::PartialTarget => "partial_target",
            CloseReason::Disabled => "disabled",
        }
    }
}

/// Everything a strategy decides at entry time.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPlan {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub stop_price: Decimal,
    /// Take-profit ladder ordered nearest first. With more than one
    /// target and partial exits enabled, the first target takes a
    /// partial exit; the final target closes the remainder.
    pub take_profits: Vec<Decimal>,
    pub reason: String,
}

/// Readings the exit chain needs from the current bar. A `None` field
/// skips its check for this update ("cannot evaluate yet", not a
/// fault).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitContext {
    pub atr: Option<Decimal>,
    /// The structure level that justified entry; crossing back through
    /// it invalidates the trade.
    pub invalidation_level: Option<Decimal>,
}

/// A reduce or close decision produced by the exit chain.
///
/// `full == true` means the machine already reset to Flat before
/// returning (the transition is atomic and exactly-once).
#[derive(Debug, Clone, PartialEq)]
pub struct ExitEvent {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub reason: CloseReason,
    pub full: bool,
}

#[derive(Debug, Clone, Default)]
struct TrailingState {
    active: bool,
    stop: Option<Decimal>,
    /// Best price seen since activation (high-water for longs,
    /// low-water for shorts).
    extreme: Decimal,
}

/// Per symbol-strategy position lifecycle state machine.
///
/// Owns entry/exit transitions, trailing-stop ratcheting and
/// partial-exit bookkeeping. It never talks to an exchange: the
/// surrounding engine turns [`ExitEvent`]s into signals.
#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    phase: PositionPhase,
    side: Side,
    entry_price: Decimal,
    quantity: Decimal,
    stop_price: Decimal,
    take_profits: Vec<Decimal>,
    next_target: usize,
    trailing: TrailingState,
    partial_exit_taken: bool,
    candles_since_entry: u32,
    pending: Option<EntryPlan>,

    // Config snapshot (ATR multiples)
    trailing_activation_atr: Decimal,
    trailing_distance_atr: Decimal,
    partial_exit_fraction: Decimal,
    partials_enabled: bool,
}

impl PositionStateMachine {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            phase: PositionPhase::Flat,
            side: Side::Long,
            entry_price: Decimal::ZERO,
            quantity: Decimal::ZERO,
            stop_price: Decimal::ZERO,
            take_profits: Vec::new(),
            next_target: 0,
            trailing: TrailingState::default(),
            partial_exit_taken: false,
            candles_since_entry: 0,
            pending: None,
            trailing_activation_atr: config.trailing_activation_atr,
            trailing_distance_atr: config.trailing_distance_atr,
            partial_exit_fraction: config.partial_exit_fraction,
            partials_enabled: config.partial_exits_enabled(),
        }
    }

    pub fn phase(&self) -> PositionPhase {
        self.phase
    }

    pub fn is_flat(&self) -> bool {
        self.phase == PositionPhase::Flat
    }

    pub fn is_open(&self) -> bool {
        self.phase == PositionPhase::Open
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn stop_price(&self) -> Decimal {
        self.stop_price
    }

    pub fn trailing_stop(&self) -> Option<Decimal> {
        self.trailing.stop
    }

    pub fn partial_exit_taken(&self) -> bool {
        self.partial_exit_taken
    }

    pub fn candles_since_entry(&self) -> u32 {
        self.candles_since_entry
    }

    /// Flat → Open, binding everything from the plan.
    ///
    /// Refuses while a position exists (this is what enforces
    /// `max_concurrent_positions = 1` exclusivity).
    pub fn open(&mut self, plan: &EntryPlan) -> Result<(), EngineError> {
        if self.phase != PositionPhase::Flat {
            return Err(EngineError::StateViolation(format!(
                "open while {:?}",
                self.phase
            )));
        }
        self.side = plan.side;
        self.entry_price = plan.price;
        self.quantity = plan.quantity;
        self.stop_price = plan.stop_price;
        self.take_profits = plan.take_profits.clone();
        self.next_target = 0;
        self.trailing = TrailingState::default();
        self.partial_exit_taken = false;
        self.candles_since_entry = 0;
        self.phase = PositionPhase::Open;
        info!(
            side = ?plan.side,
            entry = %plan.price,
            stop = %plan.stop_price,
            "position opened"
        );
        Ok(())
    }

    /// Flat → PendingEntry for policies that defer binding to the
    /// fill. Stop/target distances from the planned price are kept and
    /// re-anchored onto the fill price.
    pub fn request_entry(&mut self, plan: EntryPlan) -> Result<(), EngineError> {
        if self.phase != PositionPhase::Flat {
            return Err(EngineError::StateViolation(format!(
                "entry request while {:?}",
                self.phase
            )));
        }
        self.pending = Some(plan);
        self.phase = PositionPhase::PendingEntry;
        Ok(())
    }

    /// PendingEntry → Open on fill confirmation.
    pub fn confirm_fill(&mut self, fill: &Fill) -> Result<(), EngineError> {
        let plan = match (self.phase, self.pending.take()) {
            (PositionPhase::PendingEntry, Some(plan)) => plan,
            _ => {
                return Err(EngineError::StateViolation(
                    "fill with no pending entry".to_string(),
                ))
            }
        };
        let shift = fill.price - plan.price;
        let rebound = EntryPlan {
            side: plan.side,
            price: fill.price,
            quantity: fill.quantity,
            stop_price: plan.stop_price + shift,
            take_profits: plan.take_profits.iter().map(|tp| *tp + shift).collect(),
            reason: plan.reason,
        };
        self.phase = PositionPhase::Flat;
        self.open(&rebound)
    }

    /// Bump the bar counter for an open position.
    pub fn on_candle_close(&mut self) {
        if self.phase == PositionPhase::Open {
            self.candles_since_entry += 1;
        }
    }

    /// Run the exit-priority chain against `price`.
    ///
    /// Strict order: (1) hard stop-loss, (2) take-profit target(s),
    /// (3) structure invalidation, (4) trailing ratchet/check. The
    /// first matching condition wins and lower-priority checks are
    /// skipped. Not-Open phases return `None` immediately, which is
    /// what makes reprocessing an already-handled price a no-op.
    pub fn on_price(&mut self, price: Decimal, ctx: &ExitContext) -> Option<ExitEvent> {
        if self.phase != PositionPhase::Open {
            return None;
        }

        // (1) hard stop-loss
        if self.breached_stop(price, self.stop_price) {
            return Some(self.close_full(price, CloseReason::StopLoss));
        }

        // (2) take-profit ladder
        if let Some(&target) = self.take_profits.get(self.next_target) {
            if self.reached_target(price, target) {
                let take_partial = self.partials_enabled
                    && !self.partial_exit_taken
                    && self.next_target + 1 < self.take_profits.len();
                if take_partial {
                    return Some(self.reduce_at_target(price));
                }
                return Some(self.close_full(price, CloseReason::TakeProfit));
            }
        }

        // (3) structure invalidation
        if let Some(level) = ctx.invalidation_level {
            let violated = match self.side {
                Side::Long => price < level,
                Side::Short => price > level,
            };
            if violated {
                return Some(self.close_full(price, CloseReason::StructureInvalidation));
            }
        }

        // (4) trailing ratchet + check (needs ATR to size distances)
        if let Some(atr) = ctx.atr {
            if atr > Decimal::ZERO {
                self.update_trailing(price, atr);
                if let Some(stop) = self.trailing.stop {
                    if self.breached_stop(price, stop) {
                        return Some(self.close_full(price, CloseReason::TrailingStop));
                    }
                }
            }
        }

        None
    }

    /// Immediate-disable path: close now at `price`, bypassing the
    /// TP/trailing checks. No-op unless Open.
    pub fn force_close(&mut self, price: Decimal) -> Option<ExitEvent> {
        if self.phase != PositionPhase::Open {
            // Cancel a pending entry outright.
            if self.phase == PositionPhase::PendingEntry {
                self.reset();
                debug!("pending entry cancelled");
            }
            return None;
        }
        Some(self.close_full(price, CloseReason::Disabled))
    }

    fn breached_stop(&self, price: Decimal, stop: Decimal) -> bool {
        match self.side {
            Side::Long => price <= stop,
            Side::Short => price >= stop,
        }
    }

    fn reached_target(&self, price: Decimal, target: Decimal) -> bool {
        match self.side {
            Side::Long => price >= target,
            Side::Short => price <= target,
        }
    }

    fn update_trailing(&mut self, price: Decimal, atr: Decimal) {
        if !self.trailing.active {
            let profit = match self.side {
                Side::Long => price - self.entry_price,
                Side::Short => self.entry_price - price,
            };
            if profit >= self.trailing_activation_atr * atr {
                self.trailing.active = true;
                self.trailing.extreme = price;
            } else {
                return;
            }
        }

        // Ratchet the extreme, then the stop. The stop only ever moves
        // in the favorable direction, never loosens.
        let distance = self.trailing_distance_atr * atr;
        match self.side {
            Side::Long => {
                self.trailing.extreme = self.trailing.extreme.max(price);
                let candidate = self.trailing.extreme - distance;
                self.trailing.stop = Some(match self.trailing.stop {
                    Some(stop) => stop.max(candidate),
                    None => candidate,
                });
            }
            Side::Short => {
                self.trailing.extreme = self.trailing.extreme.min(price);
                let candidate = self.trailing.extreme + distance;
                self.trailing.stop = Some(match self.trailing.stop {
                    Some(stop) => stop.min(candidate),
                    None => candidate,
                });
            }
        }
    }

    fn reduce_at_target(&mut self, price: Decimal) -> ExitEvent {
        let exit_qty = self.quantity * self.partial_exit_fraction;
        self.quantity -= exit_qty;
        self.partial_exit_taken = true;
        self.next_target += 1;
        info!(
            qty = %exit_qty,
            remaining = %self.quantity,
            price = %price,
            "partial exit at first target"
        );
        ExitEvent {
            side: self.side,
            price,
            quantity: exit_qty,
            reason: CloseReason::PartialTarget,
            full: false,
        }
    }

    fn close_full(&mut self, price: Decimal, reason: CloseReason) -> ExitEvent {
        let event = ExitEvent {
            side: self.side,
            price,
            quantity: self.quantity,
            reason,
            full: true,
        };
        info!(
            side = ?self.side,
            price = %price,
            reason = reason.as_str(),
            bars_held = self.candles_since_entry,
            "position closed"
        );
        self.reset();
        event
    }

    /// Atomic reset of every position field.
    fn reset(&mut self) {
        self.phase = PositionPhase::Flat;
        self.entry_price = Decimal::ZERO;
        self.quantity = Decimal::ZERO;
        self.stop_price = Decimal::ZERO;
        self.take_profits.clear();
        self.next_target = 0;
        self.trailing = TrailingState::default();
        self.partial_exit_taken = false;
        self.candles_since_entry = 0;
        self.pending = None;
    }

    /// Log-and-ignore wrapper for events that contradict the phase.
    pub fn note_violation(err: &EngineError) {
        warn!("{err}; state left unchanged");
    }
}
