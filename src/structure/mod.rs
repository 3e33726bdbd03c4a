//! Market structure detection: swings, support/resistance clustering,
//! trendlines, Fibonacci levels and candlestick patterns.
//!
//! Everything here is a pure function over the candle buffer; the
//! detectors hold no state of their own.

pub mod fib;
pub mod levels;
pub mod patterns;
pub mod swing;
pub mod trendline;

pub use fib::{find_recent_swing, FibLevels, SwingDirection, EXTENSION_RATIOS, RETRACEMENT_RATIOS};
pub use levels::{cluster_levels, nearest_level, LevelKind, SrLevel};
pub use patterns::{detect_pattern, CandlePattern};
pub use swing::{find_swing_points, SwingKind, SwingPoint};
pub use trendline::{fit_trendline, Trendline};
