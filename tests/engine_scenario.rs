//! End-to-end engine scenarios: scripted candle/tick/fill feeds
//! through a [`SymbolEngine`], asserting the emitted signal stream.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use futurebot::strategy::{BreakoutPolicy, PatternReversalPolicy};
use futurebot::{
    Candle, Fill, MarketEvent, Side, Signal, SignalAction, StrategyConfig, SymbolEngine, Ticker,
};

fn ts(i: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(5 * i)
}

fn candle(i: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> MarketEvent {
    MarketEvent::Candle(Candle {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume: dec!(1000),
    })
}

fn tick(i: i64, price: Decimal) -> MarketEvent {
    MarketEvent::Tick(Ticker {
        last_price: price,
        timestamp: ts(i),
    })
}

fn fill(i: i64, side: Side, price: Decimal, quantity: Decimal) -> MarketEvent {
    MarketEvent::Fill(Fill {
        side,
        price,
        quantity,
        timestamp: ts(i),
    })
}

/// A steady decline ending in a bearish bar engulfed by a strong
/// bullish one. The final candle produces the only entry signal.
fn feed_engulfing_reversal(engine: &mut SymbolEngine<PatternReversalPolicy>) -> Vec<Signal> {
    let mut all = Vec::new();
    let mut level = dec!(120);
    for i in 0..20 {
        all.extend(engine.handle(candle(
            i,
            level,
            level + dec!(0.5),
            level - dec!(1.5),
            level - dec!(1),
        )));
        level -= dec!(1);
    }
    all.extend(engine.handle(candle(20, dec!(100), dec!(100.3), dec!(98.4), dec!(98.6))));
    all.extend(engine.handle(candle(21, dec!(98.5), dec!(101.6), dec!(98.3), dec!(101.5))));
    all
}

#[test]
fn test_reversal_entry_then_trailing_exit() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut engine = SymbolEngine::new(
        "BTCUSDT",
        StrategyConfig::default(),
        PatternReversalPolicy::new(),
    );

    let signals = feed_engulfing_reversal(&mut engine);
    assert_eq!(signals.len(), 1, "exactly one entry across the feed");
    let entry = &signals[0];
    assert_eq!(entry.action, SignalAction::OpenLong);
    assert_eq!(entry.symbol, "BTCUSDT");
    assert_eq!(entry.price, dec!(101.5));
    assert_eq!(entry.quantity, dec!(0.06)); // 2% of equity at 3x

    // Stop and target sit at the configured ATR multiples of entry.
    let atr = entry.context.atr.expect("atr recorded in context");
    assert!(atr > dec!(2) && atr < dec!(2.2), "atr was {atr}");
    assert_eq!(entry.stop_loss, Some(dec!(101.5) - dec!(1.5) * atr));
    assert_eq!(entry.take_profit, Some(dec!(101.5) + dec!(2) * atr));

    // Nothing happens until the fill binds the position.
    assert!(engine.handle(tick(22, dec!(102))).is_empty());
    assert!(!engine.position().is_open());

    assert!(engine
        .handle(fill(22, Side::Long, dec!(101.5), dec!(0.06)))
        .is_empty());
    assert!(engine.position().is_open());

    // Price runs more than one ATR in profit, arming the trail, then
    // pulls back through it.
    assert!(engine.handle(tick(23, dec!(104))).is_empty());
    assert!(engine.handle(tick(24, dec!(104.8))).is_empty());
    let exits = engine.handle(tick(25, dec!(102.5)));
    assert_eq!(exits.len(), 1);
    let exit = &exits[0];
    assert_eq!(exit.action, SignalAction::CloseLong);
    assert_eq!(exit.context.reason, "trailing_stop");
    assert_eq!(exit.price, dec!(102.5));
    assert_eq!(exit.quantity, dec!(0.06));
    assert!(!exit.reduce_only);
    assert!(engine.position().is_flat());

    // A replay of the same tick is a no-op once flat.
    assert!(engine.handle(tick(26, dec!(102.5))).is_empty());
}

/// Channel breakout with a Fibonacci target ladder: partial exit at
/// the first extension, full close at the second.
#[test]
fn test_breakout_ladder_partial_then_full_exit() {
    let _ = tracing_subscriber::fmt::try_init();
    let config = StrategyConfig {
        min_swing_atr: dec!(1),
        ..StrategyConfig::default()
    };
    let mut engine = SymbolEngine::new("ETHUSDT", config, BreakoutPolicy::new());

    // A 10-point range capped at 105 for 24 bars.
    for i in 0..24 {
        assert!(engine
            .handle(candle(i, dec!(100), dec!(105), dec!(95), dec!(101)))
            .is_empty());
    }
    // Breakout close above the channel.
    let signals = engine.handle(candle(24, dec!(104), dec!(107.5), dec!(103.8), dec!(107)));
    assert_eq!(signals.len(), 1);
    let entry = &signals[0];
    assert_eq!(entry.action, SignalAction::OpenLong);
    // Swing 95..107.5 over the window: extensions at 1.272 and 1.618.
    assert_eq!(entry.take_profit, Some(dec!(110.9)));
    // ATR is exactly (13*10 + 6.5) / 14 = 9.75 here.
    assert_eq!(entry.stop_loss, Some(dec!(107) - dec!(1.5) * dec!(9.75)));

    engine.handle(fill(24, Side::Long, dec!(107), dec!(0.06)));
    assert!(engine.position().is_open());

    // First target: partial, reduce-only, half the size.
    let partials = engine.handle(tick(25, dec!(110.9)));
    assert_eq!(partials.len(), 1);
    let partial = &partials[0];
    assert_eq!(partial.action, SignalAction::CloseLong);
    assert!(partial.reduce_only);
    assert_eq!(partial.quantity, dec!(0.03));
    assert_eq!(partial.context.reason, "partial_target");
    assert!(engine.position().is_open());
    assert_eq!(engine.position().quantity(), dec!(0.03));

    // Second target: remainder closes in full.
    let closes = engine.handle(tick(26, dec!(115.225)));
    assert_eq!(closes.len(), 1);
    let close = &closes[0];
    assert!(!close.reduce_only);
    assert_eq!(close.quantity, dec!(0.03));
    assert_eq!(close.context.reason, "take_profit");
    assert!(engine.position().is_flat());
}

/// A close back inside the broken channel invalidates the breakout
/// before the hard stop is anywhere near.
#[test]
fn test_breakout_structure_invalidation() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut engine = SymbolEngine::new(
        "ETHUSDT",
        StrategyConfig::default(),
        BreakoutPolicy::new(),
    );
    for i in 0..24 {
        engine.handle(candle(i, dec!(100), dec!(105), dec!(95), dec!(101)));
    }
    let signals = engine.handle(candle(24, dec!(104), dec!(107.5), dec!(103.8), dec!(107)));
    assert_eq!(signals.len(), 1);
    engine.handle(fill(24, Side::Long, dec!(107), dec!(0.06)));

    // Hard stop is ~14.6 points below; 104.5 only re-enters the range.
    let exits = engine.handle(tick(25, dec!(104.5)));
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].context.reason, "structure_invalidation");
    assert!(engine.position().is_flat());
}

/// The wire shape consumed by the execution layer.
#[test]
fn test_signal_serializes_for_downstream() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut engine = SymbolEngine::new(
        "BTCUSDT",
        StrategyConfig::default(),
        PatternReversalPolicy::new(),
    );
    let signals = feed_engulfing_reversal(&mut engine);
    let json = serde_json::to_value(&signals[0]).expect("signal serializes");

    assert_eq!(json["action"], "open_long");
    assert_eq!(json["symbol"], "BTCUSDT");
    assert!(json["id"].is_string());
    assert!(json["timestamp"].is_string());
    assert!(json["stop_loss"].is_string() || json["stop_loss"].is_number());
    assert_eq!(json["reduce_only"], false);
    assert!(json["context"]["atr"].is_string() || json["context"]["atr"].is_number());
    assert_eq!(json["context"]["pattern"], "BullishEngulfing");

    // And it round-trips.
    let back: Signal = serde_json::from_value(json).expect("signal deserializes");
    assert_eq!(back, signals[0]);
}
