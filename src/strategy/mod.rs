//! Strategy policies.
//!
//! A policy is a thin, swappable rule set layered on the shared
//! engine: it reads the market through [`MarketView`] and proposes
//! entries; the position state machine owns everything that happens
//! after. One type per strategy, dispatched through the
//! [`StrategyPolicy`] trait.

pub mod breakout;
pub mod pattern_reversal;

use rust_decimal::Decimal;

use crate::config::StrategyConfig;
use crate::history::HistoryBuffer;
use crate::indicators::{IndicatorEngine, IndicatorSpec, IndicatorValue};
use crate::models::{Regime, Side};
use crate::signal::MarketContext;
use crate::structure::{
    self, CandlePattern, FibLevels, SrLevel, SwingKind, SwingPoint, Trendline,
};

pub use breakout::BreakoutPolicy;
pub use pattern_reversal::PatternReversalPolicy;

/// An entry proposed by a policy. The engine binds price/quantity and
/// turns it into a signal plus a state-machine transition.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryProposal {
    pub side: Side,
    pub stop_price: Decimal,
    /// Absolute target prices, nearest first.
    pub take_profits: Vec<Decimal>,
    /// Advisory confidence in [0, 1].
    pub confidence: Decimal,
    pub context: MarketContext,
}

/// Read view over one symbol's market state for the current bar.
///
/// Everything flows through the memoized indicator cache, so a policy
/// may ask for the same reading from several predicates without
/// recomputation.
pub struct MarketView<'a> {
    pub buffer: &'a HistoryBuffer,
    pub indicators: &'a mut IndicatorEngine,
    pub regime: Option<Regime>,
    pub config: &'a StrategyConfig,
}

impl<'a> MarketView<'a> {
    pub fn last_close(&self) -> Option<Decimal> {
        self.buffer.last().map(|c| c.close)
    }

    /// Prior bar's close: the reference for level classification, so
    /// the current bar's breakout is judged against levels fixed
    /// before it existed.
    pub fn prior_close(&self) -> Option<Decimal> {
        let len = self.buffer.len();
        if len < 2 {
            return None;
        }
        self.buffer.get(len - 2).map(|c| c.close)
    }

    pub fn atr(&mut self) -> Option<Decimal> {
        let spec = IndicatorSpec::Atr(self.config.atr_period);
        self.indicators.get_scalar(self.buffer, &spec)
    }

    pub fn rsi(&mut self) -> Option<Decimal> {
        let spec = IndicatorSpec::Rsi(self.config.rsi_period);
        self.indicators.get_scalar(self.buffer, &spec)
    }

    pub fn donchian(&mut self) -> Option<crate::indicators::ChannelValue> {
        let spec = IndicatorSpec::Donchian(self.config.donchian_period);
        match self.indicators.get(self.buffer, &spec) {
            Some(IndicatorValue::Channel(ch)) => Some(ch),
            _ => None,
        }
    }

    pub fn pattern(&self) -> Option<CandlePattern> {
        structure::detect_pattern(self.buffer, self.config.min_body_ratio)
    }

    pub fn swings(&self) -> Vec<SwingPoint> {
        structure::find_swing_points(self.buffer, self.config.swing_lookback)
    }

    /// Swings clustered into S/R levels with an ATR-scaled tolerance.
    pub fn sr_levels(&mut self) -> Vec<SrLevel> {
        let atr = match self.atr() {
            Some(atr) if atr > Decimal::ZERO => atr,
            _ => return Vec::new(),
        };
        let reference = match self.prior_close() {
            Some(close) => close,
            None => return Vec::new(),
        };
        let swings = self.swings();
        structure::cluster_levels(&swings, self.config.sr_tolerance_atr * atr, reference)
    }

    pub fn trendline(&self, kind: SwingKind) -> Option<Trendline> {
        let swings = self.swings();
        let current = self.buffer.len().checked_sub(1)?;
        structure::fit_trendline(
            &swings,
            kind,
            current,
            self.config.min_pivot_distance,
            self.config.max_pivot_age,
        )
    }

    /// Fibonacci levels of the dominant recent swing, gated on the
    /// swing spanning at least `min_swing_atr × ATR`.
    pub fn fib(&mut self) -> Option<FibLevels> {
        let atr = self.atr()?;
        if atr <= Decimal::ZERO {
            return None;
        }
        structure::find_recent_swing(
            self.buffer,
            self.config.donchian_period,
            self.config.min_swing_atr * atr,
        )
    }
}

/// A pluggable entry/exit rule set.
///
/// Policies are pure deciders: they never mutate position state and
/// never emit signals themselves.
pub trait StrategyPolicy: Send {
    fn name(&self) -> &str;

    /// Bars of history required before `entry` is worth calling.
    fn min_candles(&self, config: &StrategyConfig) -> usize;

    /// Evaluate entry predicates on a closed bar. `None` means no
    /// signal this bar.
    fn entry(&self, view: &mut MarketView<'_>) -> Option<EntryProposal>;

    /// The structure level whose violation invalidates an open trade,
    /// if the policy tracks one. Checked third in the exit-priority
    /// chain.
    fn invalidation_level(&self, _view: &mut MarketView<'_>, _side: Side) -> Option<Decimal> {
        None
    }
}
