use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{EntryProposal, MarketView, StrategyPolicy};
use crate::config::StrategyConfig;
use crate::models::{Regime, Side};
use crate::signal::{Confidence, MarketContext};
use crate::structure::CandlePattern;

/// Candlestick-reversal entries.
///
/// Enters on a recognized reversal pattern, gated by RSI (no longs
/// into an overbought market, no shorts into an oversold one) and the
/// configured regime filter; quiet regimes are always skipped. Stops
/// and targets are ATR multiples of the entry close.
#[derive(Debug, Clone, Default)]
pub struct PatternReversalPolicy;

impl PatternReversalPolicy {
    pub fn new() -> Self {
        Self
    }

    fn pattern_bonus(pattern: CandlePattern) -> Decimal {
        match pattern {
            // Three-candle formations carry the most structure.
            CandlePattern::MorningStar | CandlePattern::EveningStar => dec!(0.2),
            CandlePattern::BullishEngulfing | CandlePattern::BearishEngulfing => dec!(0.15),
            CandlePattern::Hammer | CandlePattern::ShootingStar => dec!(0.1),
        }
    }
}

impl StrategyPolicy for PatternReversalPolicy {
    fn name(&self) -> &str {
        "pattern_reversal"
    }

    fn min_candles(&self, config: &StrategyConfig) -> usize {
        // ATR warm-up dominates; pattern detection needs only 3 bars.
        (config.atr_period + 1).max(config.rsi_period + 1)
    }

    fn entry(&self, view: &mut MarketView<'_>) -> Option<EntryProposal> {
        let regime = view.regime;
        if !view.config.regime_allows_entry(regime) || regime == Some(Regime::Quiet) {
            return None;
        }

        let pattern = view.pattern()?;
        let atr = view.atr()?;
        if atr <= Decimal::ZERO {
            return None;
        }
        let close = view.last_close()?;
        let rsi = view.rsi()?;

        let side = if pattern.is_bullish() {
            if rsi >= view.config.rsi_overbought {
                return None; // no longs into an overbought tape
            }
            Side::Long
        } else {
            if rsi <= view.config.rsi_oversold {
                return None;
            }
            Side::Short
        };

        let sl_distance = view.config.sl_atr_multiplier * atr;
        let tp_distance = view.config.tp_atr_multiplier * atr;
        let (stop_price, take_profit) = match side {
            Side::Long => (close - sl_distance, close + tp_distance),
            Side::Short => (close + sl_distance, close - tp_distance),
        };

        let mut confidence = Confidence::new(view.config.confidence_base);
        confidence.add_capped(Self::pattern_bonus(pattern), dec!(0.2));
        // RSI extremity: how far past the midline toward the
        // favorable band the oscillator sits.
        let extremity = match side {
            Side::Long => dec!(50) - rsi,
            Side::Short => rsi - dec!(50),
        };
        if extremity > Decimal::ZERO {
            confidence.add_capped(extremity * dec!(0.004), dec!(0.15));
        }
        // Regime alignment: a classified trend in our direction.
        let aligned = matches!(
            (side, regime),
            (Side::Long, Some(Regime::TrendingUp)) | (Side::Short, Some(Regime::TrendingDown))
        );
        if aligned {
            confidence.add_capped(dec!(0.1), dec!(0.1));
        }

        Some(EntryProposal {
            side,
            stop_price,
            take_profits: vec![take_profit],
            confidence: confidence.value(),
            context: MarketContext {
                atr: Some(atr),
                rsi: Some(rsi),
                regime,
                pattern: Some(pattern),
                sr_level: None,
                trendline_projection: None,
                reason: format!("{pattern:?}"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    use crate::history::HistoryBuffer;
    use crate::indicators::IndicatorEngine;
    use crate::models::Candle;

    fn view_over<'a>(
        buffer: &'a HistoryBuffer,
        indicators: &'a mut IndicatorEngine,
        config: &'a StrategyConfig,
        regime: Option<Regime>,
    ) -> MarketView<'a> {
        MarketView {
            buffer,
            indicators,
            regime,
            config,
        }
    }

    /// Mildly declining bars ending in a bullish engulfing candle.
    fn engulfing_buffer() -> (HistoryBuffer, IndicatorEngine) {
        let mut buf = HistoryBuffer::new(128);
        let mut engine = IndicatorEngine::new();
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let mut push = |i: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal| {
            let candle = Candle {
                timestamp: base + Duration::minutes(5 * i),
                open,
                high,
                low,
                close,
                volume: dec!(1000),
            };
            buf.push(candle.clone()).unwrap();
            engine.on_candle(&candle);
        };
        let mut level = dec!(120);
        for i in 0..20 {
            // Steady drift down, one point per bar, range 2.
            push(
                i,
                level,
                level + dec!(0.5),
                level - dec!(1.5),
                level - dec!(1),
            );
            level -= dec!(1);
        }
        // level is now 100. Bearish bar, then a bullish engulfing bar.
        push(20, dec!(100), dec!(100.3), dec!(98.4), dec!(98.6));
        push(21, dec!(98.5), dec!(101.6), dec!(98.3), dec!(101.5));
        (buf, engine)
    }

    #[test]
    fn test_emits_long_on_bullish_engulfing() {
        let (buf, mut engine) = engulfing_buffer();
        let config = StrategyConfig::default();
        let policy = PatternReversalPolicy::new();
        let mut view = view_over(&buf, &mut engine, &config, Some(Regime::Ranging));

        let proposal = policy.entry(&mut view).expect("entry expected");
        assert_eq!(proposal.side, Side::Long);
        assert_eq!(
            proposal.context.pattern,
            Some(CandlePattern::BullishEngulfing)
        );

        // SL/TP are exact ATR multiples of the close.
        let atr = view.atr().unwrap();
        assert!(atr > Decimal::ZERO);
        assert_eq!(proposal.stop_price, dec!(101.5) - dec!(1.5) * atr);
        assert_eq!(proposal.take_profits, vec![dec!(101.5) + dec!(2) * atr]);
        assert!(proposal.confidence >= config.confidence_base);
        assert!(proposal.confidence <= Decimal::ONE);
    }

    #[test]
    fn test_quiet_regime_blocks_entry() {
        let (buf, mut engine) = engulfing_buffer();
        let config = StrategyConfig::default();
        let policy = PatternReversalPolicy::new();
        let mut view = view_over(&buf, &mut engine, &config, Some(Regime::Quiet));
        assert!(policy.entry(&mut view).is_none());
    }

    #[test]
    fn test_wildcard_regime_allows_entry() {
        let (buf, mut engine) = engulfing_buffer();
        let config = StrategyConfig::default();
        let policy = PatternReversalPolicy::new();
        let mut view = view_over(&buf, &mut engine, &config, None);
        assert!(policy.entry(&mut view).is_some());
    }

    #[test]
    fn test_no_pattern_no_entry() {
        let mut buf = HistoryBuffer::new(128);
        let mut engine = IndicatorEngine::new();
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        for i in 0..30 {
            let candle = Candle {
                timestamp: base + Duration::minutes(5 * i),
                open: dec!(100),
                high: dec!(100.8),
                low: dec!(99.6),
                close: dec!(100.5),
                volume: dec!(1000),
            };
            buf.push(candle.clone()).unwrap();
            engine.on_candle(&candle);
        }
        let config = StrategyConfig::default();
        let policy = PatternReversalPolicy::new();
        let mut view = view_over(&buf, &mut engine, &config, None);
        assert!(policy.entry(&mut view).is_none());
    }
}
