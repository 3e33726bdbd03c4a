use rust_decimal::Decimal;

use super::moving_average::EmaState;

/// One MACD reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub line: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Incrementally-updated MACD (Moving Average Convergence/Divergence).
///
/// `line = EMA(fast) - EMA(slow)`; the signal line is an EMA of the
/// line itself, seeded by the SMA of its first `signal` values (the
/// [`EmaState`] seed rule); `histogram = line - signal`.
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        debug_assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
        }
    }

    pub fn update(&mut self, close: Decimal) {
        self.fast.update(close);
        self.slow.update(close);
        if let (Some(f), Some(s)) = (self.fast.value(), self.slow.value()) {
            // The signal EMA only ever sees completed line values, so
            // its warm-up counts from the first bar the line exists.
            self.signal.update(f - s);
        }
    }

    /// Current MACD triple; `None` until the slow EMA and the signal
    /// EMA have both left their seed windows
    /// (`slow + signal - 1` bars).
    pub fn value(&self) -> Option<MacdValue> {
        let line = self.fast.value()? - self.slow.value()?;
        let signal = self.signal.value()?;
        Some(MacdValue {
            line,
            signal,
            histogram: line - signal,
        })
    }
}
