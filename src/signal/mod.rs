use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Regime;
use crate::num;
use crate::structure::CandlePattern;

/// What the engine is asking the execution layer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl SignalAction {
    pub fn is_entry(self) -> bool {
        matches!(self, SignalAction::OpenLong | SignalAction::OpenShort)
    }

    pub fn open_for(side: crate::models::Side) -> Self {
        match side {
            crate::models::Side::Long => SignalAction::OpenLong,
            crate::models::Side::Short => SignalAction::OpenShort,
        }
    }

    pub fn close_for(side: crate::models::Side) -> Self {
        match side {
            crate::models::Side::Long => SignalAction::CloseLong,
            crate::models::Side::Short => SignalAction::CloseShort,
        }
    }
}

/// Audit payload: the indicator/structure readings that justified the
/// decision. Downstream risk sizing may re-weight against these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub atr: Option<Decimal>,
    pub rsi: Option<Decimal>,
    pub regime: Option<Regime>,
    pub pattern: Option<CandlePattern>,
    pub sr_level: Option<Decimal>,
    pub trendline_projection: Option<Decimal>,
    /// Human-readable trigger, e.g. "stop_loss" or "bullish_engulfing".
    pub reason: String,
}

/// The structured output contract consumed by the external
/// risk/execution layer. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub action: SignalAction,
    pub symbol: String,
    /// Suggested price (last trade or candle close at emission).
    pub price: Decimal,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// True for partial exits: reduce the position, do not flip it.
    pub reduce_only: bool,
    /// Advisory score in [0, 1]; the execution layer may re-weight or
    /// ignore it.
    pub confidence: Decimal,
    pub context: MarketContext,
    pub timestamp: DateTime<Utc>,
}

/// Bounded additive confidence score.
///
/// Starts at a configured base; each independent bonus is capped on
/// its own before being added; the final value is clamped to
/// `[base, 1.0]`.
#[derive(Debug, Clone)]
pub struct Confidence {
    base: Decimal,
    value: Decimal,
}

impl Confidence {
    pub fn new(base: Decimal) -> Self {
        let base = num::clamp(base, Decimal::ZERO, Decimal::ONE);
        Self { base, value: base }
    }

    /// Add `bonus`, capped at `cap`. Negative bonuses are ignored:
    /// detractors are expressed by simply not adding their bonus.
    pub fn add_capped(&mut self, bonus: Decimal, cap: Decimal) -> &mut Self {
        let bonus = num::clamp(bonus, Decimal::ZERO, cap);
        self.value += bonus;
        self
    }

    pub fn value(&self) -> Decimal {
        num::clamp(self.value, self.base, Decimal::ONE)
    }
}
