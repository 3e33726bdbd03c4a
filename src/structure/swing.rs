use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::history::HistoryBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A local price extremum.
///
/// `index` is the candle's position in the buffer (oldest = 0) at the
/// time of detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: Decimal,
    pub kind: SwingKind,
}

/// Detect swing highs and lows under a symmetric strict-lookback rule.
///
/// Index `i` is a swing high iff `high[i]` is strictly greater than
/// every other high within `[i - lookback, i + lookback]`; symmetric
/// for lows. Classification needs `lookback` bars of context on both
/// sides, so the most recent `lookback` bars can never yet be
/// classified; that is what makes the detector free of look-ahead.
///
/// Returned points are ordered oldest first.
pub fn find_swing_points(buffer: &HistoryBuffer, lookback: usize) -> Vec<SwingPoint> {
    let len = buffer.len();
    let mut swings = Vec::new();
    if lookback == 0 || len < 2 * lookback + 1 {
        return swings;
    }

    for i in lookback..len - lookback {
        let candidate = match buffer.get(i) {
            Some(c) => c,
            None => continue,
        };

        let mut is_high = true;
        let mut is_low = true;
        for j in i - lookback..=i + lookback {
            if j == i {
                continue;
            }
            let other = match buffer.get(j) {
                Some(c) => c,
                None => continue,
            };
            if other.high >= candidate.high {
                is_high = false;
            }
            if other.low <= candidate.low {
                is_low = false;
            }
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            swings.push(SwingPoint {
                index: i,
                price: candidate.high,
                kind: SwingKind::High,
            });
        } else if is_low {
            swings.push(SwingPoint {
                index: i,
                price: candidate.low,
                kind: SwingKind::Low,
            });
        }
    }
    swings
}
