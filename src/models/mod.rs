use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One completed OHLCV bar for a fixed time interval.
///
/// All prices and the volume are exact decimals; nothing in the engine
/// touches binary floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Validate the OHLC shape invariant:
    /// `high >= max(open, close)` and `min(open, close) >= low`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.high < self.open.max(self.close) {
            return Err(EngineError::InvalidInput(format!(
                "candle high {} below body at {}",
                self.high, self.timestamp
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(EngineError::InvalidInput(format!(
                "candle low {} above body at {}",
                self.low, self.timestamp
            )));
        }
        if self.volume < Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "negative volume {} at {}",
                self.volume, self.timestamp
            )));
        }
        Ok(())
    }

    /// Body size (absolute open-to-close distance).
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Full high-to-low range.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Upper shadow: distance from the body top to the high.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// Lower shadow: distance from the body bottom to the low.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Typical price (HLC/3), used by VWAP.
    pub fn typical_price(&self) -> Decimal {
        crate::num::div(self.high + self.low + self.close, Decimal::from(3u32))
            .unwrap_or(self.close)
    }
}

/// Latest traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Position side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn flipped(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

/// Fill confirmation from the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Externally-classified market condition used to gate strategy
/// activation.
///
/// Regime filters always take `Option<Regime>`: `None` means
/// "wildcard, filter disabled" (the backtesting convention), never
/// "unknown regime".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    TrendingUp,
    TrendingDown,
    Ranging,
    Volatile,
    Quiet,
}

/// Single dispatch type for everything the engine consumes.
///
/// Replaces onTick/onKline/onFill callback sprawl: one `handle(event)`
/// entry point per symbol-strategy actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    Tick(Ticker),
    Candle(Candle),
    Fill(Fill),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            timestamp: Utc::now(),
            open,
            high,
            low,
            close,
            volume: dec!(1000),
        }
    }

    #[test]
    fn test_valid_candle() {
        let c = candle(dec!(100), dec!(105), dec!(98), dec!(103));
        assert!(c.validate().is_ok());
        assert_eq!(c.body(), dec!(3));
        assert_eq!(c.range(), dec!(7));
        assert_eq!(c.upper_shadow(), dec!(2));
        assert_eq!(c.lower_shadow(), dec!(2));
        assert!(c.is_bullish());
    }

    #[test]
    fn test_invalid_high_rejected() {
        let c = candle(dec!(100), dec!(99), dec!(98), dec!(100));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_invalid_low_rejected() {
        let c = candle(dec!(100), dec!(105), dec!(101), dec!(103));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_negative_volume_rejected() {
        let mut c = candle(dec!(100), dec!(105), dec!(98), dec!(103));
        c.volume = dec!(-1);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_typical_price() {
        let c = candle(dec!(100), dec!(106), dec!(100), dec!(103));
        // (106 + 100 + 103) / 3 = 103
        assert_eq!(c.typical_price(), dec!(103));
    }

    #[test]
    fn test_side_flipped() {
        assert_eq!(Side::Long.flipped(), Side::Short);
        assert_eq!(Side::Short.flipped(), Side::Long);
    }
}
