use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::Regime;

/// Per strategy-instance configuration.
///
/// Every option flows through the engine's generic period/multiplier
/// parameters; the effect of a given value is strategy-specific.
/// All distance-like options are expressed in ATR multiples so they
/// scale with the instrument's volatility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Candles retained per symbol (ring capacity).
    pub history_capacity: usize,

    // Indicator periods
    pub atr_period: usize,
    pub rsi_period: usize,
    pub donchian_period: usize,

    // Entry/exit distances (ATR multiples)
    pub sl_atr_multiplier: Decimal,
    pub tp_atr_multiplier: Decimal,
    pub trailing_activation_atr: Decimal,
    pub trailing_distance_atr: Decimal,

    /// Fraction of the position closed at the first target of a
    /// multi-target ladder. Outside (0, 1) disables partial exits.
    pub partial_exit_fraction: Decimal,

    /// At most this many concurrent positions per symbol-strategy pair.
    pub max_concurrent_positions: usize,

    // Market structure parameters
    pub swing_lookback: usize,
    pub sr_tolerance_atr: Decimal,
    pub min_pivot_distance: usize,
    pub max_pivot_age: usize,
    /// A swing must span at least this many ATRs before Fibonacci
    /// levels are drawn from it.
    pub min_swing_atr: Decimal,
    /// Minimum body/range ratio for a candle to count as a full body
    /// in pattern recognition.
    pub min_body_ratio: Decimal,

    // Oscillator thresholds
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,

    // Sizing hints passed through to the risk/execution layer
    pub position_size_percent: Decimal,
    pub leverage: Decimal,

    /// Regimes in which entries are allowed. `None` is a wildcard:
    /// the filter is disabled entirely (backtesting convention).
    pub allowed_regimes: Option<Vec<Regime>>,

    /// Floor of the confidence score attached to emitted signals.
    pub confidence_base: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            history_capacity: 500,
            atr_period: 14,
            rsi_period: 14,
            donchian_period: 20,
            sl_atr_multiplier: dec!(1.5),
            tp_atr_multiplier: dec!(2.0),
            trailing_activation_atr: dec!(1.0),
            trailing_distance_atr: dec!(1.0),
            partial_exit_fraction: dec!(0.5),
            max_concurrent_positions: 1,
            swing_lookback: 3,
            sr_tolerance_atr: dec!(0.5),
            min_pivot_distance: 3,
            max_pivot_age: 60,
            min_swing_atr: dec!(2.0),
            min_body_ratio: dec!(0.6),
            rsi_oversold: dec!(30),
            rsi_overbought: dec!(70),
            position_size_percent: dec!(2.0),
            leverage: dec!(3),
            allowed_regimes: None,
            confidence_base: dec!(0.3),
        }
    }
}

impl StrategyConfig {
    /// True when entries are permitted under `regime`.
    ///
    /// `self.allowed_regimes == None` accepts every regime, including
    /// `regime == None` (no classification available).
    pub fn regime_allows_entry(&self, regime: Option<Regime>) -> bool {
        match (&self.allowed_regimes, regime) {
            (None, _) => true,
            (Some(allowed), Some(r)) => allowed.contains(&r),
            // Filter configured but no classification yet: stay out.
            (Some(_), None) => false,
        }
    }

    /// True when partial exits are enabled.
    pub fn partial_exits_enabled(&self) -> bool {
        self.partial_exit_fraction > Decimal::ZERO && self.partial_exit_fraction < Decimal::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StrategyConfig::default();
        assert_eq!(config.atr_period, 14);
        assert_eq!(config.sl_atr_multiplier, dec!(1.5));
        assert_eq!(config.tp_atr_multiplier, dec!(2.0));
        assert_eq!(config.max_concurrent_positions, 1);
        assert!(config.partial_exits_enabled());
    }

    #[test]
    fn test_regime_wildcard() {
        let config = StrategyConfig::default();
        assert!(config.regime_allows_entry(None));
        assert!(config.regime_allows_entry(Some(Regime::Quiet)));
    }

    #[test]
    fn test_regime_filter() {
        let config = StrategyConfig {
            allowed_regimes: Some(vec![Regime::TrendingUp, Regime::Ranging]),
            ..Default::default()
        };
        assert!(config.regime_allows_entry(Some(Regime::TrendingUp)));
        assert!(!config.regime_allows_entry(Some(Regime::Quiet)));
        // Filter configured but nothing classified yet: no entries.
        assert!(!config.regime_allows_entry(None));
    }

    #[test]
    fn test_partial_exit_bounds() {
        let mut config = StrategyConfig::default();
        config.partial_exit_fraction = Decimal::ONE;
        assert!(!config.partial_exits_enabled());
        config.partial_exit_fraction = Decimal::ZERO;
        assert!(!config.partial_exits_enabled());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: StrategyConfig =
            serde_json::from_str(r#"{"atrPeriod": 21}"#).unwrap_or_default();
        // Unknown casing falls back to defaults; snake_case round-trips.
        let config2: StrategyConfig = serde_json::from_str(r#"{"atr_period": 21}"#).unwrap();
        assert_eq!(config.atr_period, 14);
        assert_eq!(config2.atr_period, 21);
    }
}
