use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::history::HistoryBuffer;
use crate::models::Candle;

/// Recognized candlestick patterns over the last 1-3 completed bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlePattern {
    BullishEngulfing,
    BearishEngulfing,
    Hammer,
    ShootingStar,
    MorningStar,
    EveningStar,
}

impl CandlePattern {
    pub fn is_bullish(self) -> bool {
        matches!(
            self,
            CandlePattern::BullishEngulfing | CandlePattern::Hammer | CandlePattern::MorningStar
        )
    }
}

/// Detect the strongest pattern ending at the latest candle.
///
/// Three-candle patterns are evaluated before two-candle, which are
/// evaluated before one-candle: a qualifying larger pattern takes
/// precedence. `min_body_ratio` is the body/range ratio a candle must
/// reach to count as a full-bodied bar.
pub fn detect_pattern(buffer: &HistoryBuffer, min_body_ratio: Decimal) -> Option<CandlePattern> {
    let len = buffer.len();
    if len == 0 {
        return None;
    }
    let last = buffer.get(len - 1)?;

    if len >= 3 {
        let first = buffer.get(len - 3)?;
        let middle = buffer.get(len - 2)?;
        if let Some(p) = star_pattern(first, middle, last, min_body_ratio) {
            return Some(p);
        }
    }
    if len >= 2 {
        let prev = buffer.get(len - 2)?;
        if let Some(p) = engulfing_pattern(prev, last, min_body_ratio) {
            return Some(p);
        }
    }
    single_candle_pattern(last)
}

fn full_bodied(candle: &Candle, min_body_ratio: Decimal) -> bool {
    let range = candle.range();
    !range.is_zero() && candle.body() >= min_body_ratio * range
}

fn small_bodied(candle: &Candle, min_body_ratio: Decimal) -> bool {
    let range = candle.range();
    range.is_zero() || candle.body() < (Decimal::ONE - min_body_ratio) * range
}

fn midpoint(candle: &Candle) -> Decimal {
    (candle.open + candle.close) / dec!(2)
}

fn star_pattern(
    first: &Candle,
    middle: &Candle,
    last: &Candle,
    min_body_ratio: Decimal,
) -> Option<CandlePattern> {
    // Morning star: strong down bar, indecision bar, strong up bar
    // closing beyond the midpoint of the first body.
    if first.is_bearish()
        && full_bodied(first, min_body_ratio)
        && small_bodied(middle, min_body_ratio)
        && last.is_bullish()
        && full_bodied(last, min_body_ratio)
        && last.close > midpoint(first)
    {
        return Some(CandlePattern::MorningStar);
    }
    if first.is_bullish()
        && full_bodied(first, min_body_ratio)
        && small_bodied(middle, min_body_ratio)
        && last.is_bearish()
        && full_bodied(last, min_body_ratio)
        && last.close < midpoint(first)
    {
        return Some(CandlePattern::EveningStar);
    }
    None
}

fn engulfing_pattern(
    prev: &Candle,
    curr: &Candle,
    min_body_ratio: Decimal,
) -> Option<CandlePattern> {
    if !full_bodied(curr, min_body_ratio) {
        return None;
    }
    // The current body must wrap the previous body entirely, with a
    // strict close beyond it.
    if prev.is_bearish()
        && curr.is_bullish()
        && curr.open <= prev.close
        && curr.close > prev.open
    {
        return Some(CandlePattern::BullishEngulfing);
    }
    if prev.is_bullish()
        && curr.is_bearish()
        && curr.open >= prev.close
        && curr.close < prev.open
    {
        return Some(CandlePattern::BearishEngulfing);
    }
    None
}

fn single_candle_pattern(candle: &Candle) -> Option<CandlePattern> {
    let body = candle.body();
    if body.is_zero() {
        return None; // a doji is indecision, not a reversal bar
    }
    // Hammer: long lower shadow, negligible upper shadow.
    if candle.lower_shadow() >= dec!(2) * body && candle.upper_shadow() <= body {
        return Some(CandlePattern::Hammer);
    }
    // Shooting star: the mirror image.
    if candle.upper_shadow() >= dec!(2) * body && candle.lower_shadow() <= body {
        return Some(CandlePattern::ShootingStar);
    }
    None
}
