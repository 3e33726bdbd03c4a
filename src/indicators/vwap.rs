use rust_decimal::Decimal;

use crate::history::HistoryBuffer;
use crate::num;

/// Volume-weighted average price over the last `period` candles:
/// `Σ(typical · volume) / Σ(volume)` with typical = (H+L+C)/3.
///
/// Returns `None` during warm-up or when the window traded no volume
/// (backfilled data sometimes carries zero volume; an unweighted
/// answer would be misleading).
pub fn vwap(buffer: &HistoryBuffer, period: usize) -> Option<Decimal> {
    if period == 0 {
        return None;
    }
    let window = buffer.window(period)?;
    let mut weighted = Decimal::ZERO;
    let mut volume = Decimal::ZERO;
    for candle in window {
        weighted += candle.typical_price() * candle.volume;
        volume += candle.volume;
    }
    if volume.is_zero() {
        return None;
    }
    num::div(weighted, volume).ok()
}
