use rust_decimal::Decimal;

use crate::history::HistoryBuffer;
use crate::num;

/// Simple moving average of the last `period` closes.
///
/// Returns `None` until the buffer holds at least `period` candles.
pub fn sma(buffer: &HistoryBuffer, period: usize) -> Option<Decimal> {
    if period == 0 {
        return None;
    }
    let closes = buffer.closes_back(period)?;
    num::mean(&closes)
}

/// Incrementally-updated exponential moving average.
///
/// Seed-then-roll: the first value is the simple average of the first
/// `period` closes, after which each bar costs one multiply-add:
/// `ema = close * k + prev * (1 - k)`, `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    k: Decimal,
    count: usize,
    seed_sum: Decimal,
    ema: Option<Decimal>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        // period + 1 is never zero, so this division is total.
        let k = num::div(Decimal::TWO, Decimal::from(period + 1)).unwrap_or(Decimal::ONE);
        Self {
            period,
            k,
            count: 0,
            seed_sum: Decimal::ZERO,
            ema: None,
        }
    }

    /// Consume the next close in chronological order.
    pub fn update(&mut self, close: Decimal) {
        match self.ema {
            None => {
                self.count += 1;
                self.seed_sum += close;
                if self.count == self.period {
                    self.ema = num::div(self.seed_sum, Decimal::from(self.period)).ok();
                }
            }
            Some(prev) => {
                self.ema = Some(close * self.k + prev * (Decimal::ONE - self.k));
            }
        }
    }

    /// Current EMA; `None` while still inside the seed window.
    pub fn value(&self) -> Option<Decimal> {
        self.ema
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Batch EMA over a full close series, oldest first.
///
/// Applies the identical seed-then-roll recurrence as [`EmaState`], so
/// the incremental and batch paths agree exactly.
pub fn ema(closes: &[Decimal], period: usize) -> Option<Decimal> {
    let mut state = EmaState::new(period);
    for &close in closes {
        state.update(close);
    }
    state.value()
}
