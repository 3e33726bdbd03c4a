use rust_decimal::{Decimal, MathematicalOps};

use crate::history::HistoryBuffer;
use crate::num;

/// Bollinger band triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValue {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

/// Donchian channel: the rolling N-bar high/low band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelValue {
    pub upper: Decimal,
    pub lower: Decimal,
}

/// Bollinger bands: middle = SMA(period), upper/lower = middle ± mult·σ
/// where σ is the population standard deviation of the window.
pub fn bollinger(buffer: &HistoryBuffer, period: usize, mult: Decimal) -> Option<BollingerValue> {
    if period == 0 {
        return None;
    }
    let closes = buffer.closes_back(period)?;
    let middle = num::mean(&closes)?;
    let squared: Vec<Decimal> = closes
        .iter()
        .map(|&c| {
            let d = c - middle;
            d * d
        })
        .collect();
    let variance = num::mean(&squared)?;
    let sigma = variance.sqrt()?;
    Some(BollingerValue {
        upper: middle + mult * sigma,
        middle,
        lower: middle - mult * sigma,
    })
}

/// Donchian channel over the **previous** `period` bars.
///
/// The bar under evaluation is excluded so the channel is fixed before
/// that bar exists: a breakout can be tested against it without
/// look-ahead bias. Needs `period + 1` candles.
pub fn donchian(buffer: &HistoryBuffer, period: usize) -> Option<ChannelValue> {
    if period == 0 || buffer.len() < period + 1 {
        return None;
    }
    let end = buffer.len() - 1; // exclude the current bar
    let start = end - period;
    let mut upper = buffer.get(start)?.high;
    let mut lower = buffer.get(start)?.low;
    for i in start + 1..end {
        let c = buffer.get(i)?;
        upper = upper.max(c.high);
        lower = lower.min(c.low);
    }
    Some(ChannelValue { upper, lower })
}
