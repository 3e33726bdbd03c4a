use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::models::Candle;

/// Bounded ring of completed candles for one symbol.
///
/// Append-only: `push` evicts the oldest candle beyond capacity and
/// enforces strictly increasing timestamps, which is what makes the
/// O(1) incremental indicators correct. One buffer belongs to exactly
/// one symbol-strategy actor; there is no shared mutable state.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
    /// Total bars ever pushed. Memo caches key on this to detect a new
    /// bar without comparing timestamps.
    seq: u64,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            seq: 0,
        }
    }

    /// Append a completed candle, evicting the oldest beyond capacity.
    ///
    /// Rejects candles whose timestamp does not advance past the last
    /// one (duplicate or out-of-order delivery) without mutating the
    /// buffer. Returns the new bar sequence number.
    pub fn push(&mut self, candle: Candle) -> Result<u64, EngineError> {
        candle.validate()?;
        if let Some(last) = self.candles.back() {
            if candle.timestamp <= last.timestamp {
                return Err(EngineError::InvalidInput(format!(
                    "non-monotonic candle: {} after {}",
                    candle.timestamp, last.timestamp
                )));
            }
        }

        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        self.seq += 1;
        Ok(self.seq)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of bars ever pushed (not capped by capacity).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Candle by position, oldest first.
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.candles.back().map(|c| c.timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> + DoubleEndedIterator {
        self.candles.iter()
    }

    /// Last `n` candles, oldest first. `None` if fewer are present.
    pub fn window(&self, n: usize) -> Option<Vec<&Candle>> {
        if self.candles.len() < n {
            return None;
        }
        Some(self.candles.range(self.candles.len() - n..).collect())
    }

    /// Closes of the last `n` candles, oldest first. `None` if fewer
    /// are present.
    pub fn closes_back(&self, n: usize) -> Option<Vec<Decimal>> {
        self.window(n)
            .map(|w| w.into_iter().map(|c| c.close).collect())
    }
}
