use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{EntryProposal, MarketView, StrategyPolicy};
use crate::config::StrategyConfig;
use crate::models::{Regime, Side};
use crate::signal::{Confidence, MarketContext};
use crate::structure::{LevelKind, SwingDirection, SwingKind};

/// Donchian-channel breakout entries.
///
/// A close beyond the prior-bar channel opens in the breakout
/// direction. Confidence is raised when the close also crosses a
/// fitted trendline projection, and by the touch count of the level
/// that broke. Targets ladder off Fibonacci extensions of the recent
/// swing when one is large enough, with an ATR multiple as fallback.
#[derive(Debug, Clone, Default)]
pub struct BreakoutPolicy;

impl BreakoutPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Target ladder in trade direction: fib extensions beyond the
    /// entry when the swing qualifies, otherwise one ATR-based target.
    fn take_profits(
        view: &mut MarketView<'_>,
        side: Side,
        close: Decimal,
        atr: Decimal,
    ) -> Vec<Decimal> {
        if let Some(fib) = view.fib() {
            let aligned = matches!(
                (side, fib.direction),
                (Side::Long, SwingDirection::Up) | (Side::Short, SwingDirection::Down)
            );
            if aligned {
                let targets: Vec<Decimal> = fib
                    .extensions
                    .iter()
                    .map(|&(_, price)| price)
                    .filter(|&price| match side {
                        Side::Long => price > close,
                        Side::Short => price < close,
                    })
                    .collect();
                if !targets.is_empty() {
                    return targets;
                }
            }
        }
        let distance = view.config.tp_atr_multiplier * atr;
        match side {
            Side::Long => vec![close + distance],
            Side::Short => vec![close - distance],
        }
    }
}

impl StrategyPolicy for BreakoutPolicy {
    fn name(&self) -> &str {
        "breakout"
    }

    fn min_candles(&self, config: &StrategyConfig) -> usize {
        // Channel excludes the current bar, hence the +1.
        (config.donchian_period + 1).max(config.atr_period + 1)
    }

    fn entry(&self, view: &mut MarketView<'_>) -> Option<EntryProposal> {
        let regime = view.regime;
        if !view.config.regime_allows_entry(regime) || regime == Some(Regime::Quiet) {
            return None;
        }

        let channel = view.donchian()?;
        let atr = view.atr()?;
        if atr <= Decimal::ZERO {
            return None;
        }
        let close = view.last_close()?;

        let side = if close > channel.upper {
            Side::Long
        } else if close < channel.lower {
            Side::Short
        } else {
            return None;
        };
        let broken = match side {
            Side::Long => channel.upper,
            Side::Short => channel.lower,
        };

        let sl_distance = view.config.sl_atr_multiplier * atr;
        let stop_price = match side {
            Side::Long => close - sl_distance,
            Side::Short => close + sl_distance,
        };
        let take_profits = Self::take_profits(view, side, close, atr);

        let mut confidence = Confidence::new(view.config.confidence_base);
        // A close through the descending-highs line (or its mirror)
        // confirms the break against sloped structure, not just the
        // flat channel.
        let trendline_kind = match side {
            Side::Long => SwingKind::High,
            Side::Short => SwingKind::Low,
        };
        let projection = view.trendline(trendline_kind).map(|t| t.projection);
        if let Some(projection) = projection {
            let crossed = match side {
                Side::Long => close > projection,
                Side::Short => close < projection,
            };
            if crossed {
                confidence.add_capped(dec!(0.15), dec!(0.15));
            }
        }
        // A well-tested level breaking is worth more than a one-touch
        // wick high. The broken level is the one the close just passed.
        let levels = view.sr_levels();
        let level_kind = match side {
            Side::Long => LevelKind::Resistance,
            Side::Short => LevelKind::Support,
        };
        let broken_level = levels
            .iter()
            .filter(|l| l.kind == level_kind)
            .filter(|l| match side {
                Side::Long => l.price <= close,
                Side::Short => l.price >= close,
            })
            .max_by_key(|l| match side {
                Side::Long => l.price,
                Side::Short => -l.price,
            });
        let sr_level = broken_level.map(|l| l.price);
        if let Some(level) = broken_level {
            confidence.add_capped(Decimal::from(level.touches) * dec!(0.05), dec!(0.15));
        }
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
            take_profits,
            confidence: confidence.value(),
            context: MarketContext {
                atr: Some(atr),
                rsi: view.rsi(),
                regime,
                pattern: None,
                sr_level,
                trendline_projection: projection,
                reason: format!("donchian_breakout_{}", side.as_str()),
            },
        })
    }

    /// The broken boundary: a close back inside the channel means the
    /// breakout failed.
    fn invalidation_level(&self, view: &mut MarketView<'_>, side: Side) -> Option<Decimal> {
        let channel = view.donchian()?;
        Some(match side {
            Side::Long => channel.upper,
            Side::Short => channel.lower,
        })
    }
}
