use rust_decimal::Decimal;

use crate::num;

/// Incrementally-updated Relative Strength Index.
///
/// Wilder smoothing: the first average gain/loss is the simple mean of
/// the first `period` changes, after which
/// `avg = (avg * (period - 1) + change) / period`.
///
/// Values above 70 are conventionally overbought, below 30 oversold.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_close: Option<Decimal>,
    changes_seen: usize,
    seed_gain: Decimal,
    seed_loss: Decimal,
    avg_gain: Option<Decimal>,
    avg_loss: Option<Decimal>,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            changes_seen: 0,
            seed_gain: Decimal::ZERO,
            seed_loss: Decimal::ZERO,
            avg_gain: None,
            avg_loss: None,
        }
    }

    pub fn update(&mut self, close: Decimal) {
        if let Some(prev) = self.prev_close {
            let change = close - prev;
            let gain = change.max(Decimal::ZERO);
            let loss = (-change).max(Decimal::ZERO);
            let p = Decimal::from(self.period);

            match (self.avg_gain, self.avg_loss) {
                (Some(ag), Some(al)) => {
                    self.avg_gain = num::div(ag * (p - Decimal::ONE) + gain, p).ok();
                    self.avg_loss = num::div(al * (p - Decimal::ONE) + loss, p).ok();
                }
                _ => {
                    self.changes_seen += 1;
                    self.seed_gain += gain;
                    self.seed_loss += loss;
                    if self.changes_seen == self.period {
                        self.avg_gain = num::div(self.seed_gain, p).ok();
                        self.avg_loss = num::div(self.seed_loss, p).ok();
                    }
                }
            }
        }
        self.prev_close = Some(close);
    }

    /// Current RSI in [0, 100]; `None` until `period + 1` closes have
    /// been seen. A zero average loss reads as 100.
    pub fn value(&self) -> Option<Decimal> {
        let avg_gain = self.avg_gain?;
        let avg_loss = self.avg_loss?;
        if avg_loss.is_zero() {
            return Some(Decimal::ONE_HUNDRED);
        }
        let rs = num::div(avg_gain, avg_loss).ok()?;
        let rsi = Decimal::ONE_HUNDRED
            - num::div(Decimal::ONE_HUNDRED, Decimal::ONE + rs).ok()?;
        Some(rsi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rsi_of(closes: &[Decimal], period: usize) -> Option<Decimal> {
        let mut state = RsiState::new(period);
        for &c in closes {
            state.update(c);
        }
        state.value()
    }

    #[test]
    fn test_rsi_warm_up() {
        // period + 1 closes required before a value appears
        let closes: Vec<Decimal> = (1..=14).map(Decimal::from).collect();
        assert!(rsi_of(&closes, 14).is_none());
        let closes: Vec<Decimal> = (1..=15).map(Decimal::from).collect();
        assert!(rsi_of(&closes, 14).is_some());
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<Decimal> = (100..=110).map(Decimal::from).collect();
        assert_eq!(rsi_of(&closes, 5).unwrap(), dec!(100));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let closes: Vec<Decimal> = (100..=110).rev().map(Decimal::from).collect();
        assert_eq!(rsi_of(&closes, 5).unwrap(), dec!(0));
    }

    #[test]
    fn test_rsi_balanced_is_50() {
        // Seed changes +1,-1,+1,-1 give equal average gain and loss;
        // flat closes afterwards decay both equally, so RSI stays 50.
        let mut closes = vec![dec!(100), dec!(101), dec!(100), dec!(101), dec!(100)];
        closes.extend(std::iter::repeat(dec!(100)).take(6));
        let rsi = rsi_of(&closes, 4).unwrap();
        assert_eq!(rsi, dec!(50));
    }

    #[test]
    fn test_rsi_bounded() {
        let closes = vec![
            dec!(44.0), dec!(44.25), dec!(44.5), dec!(43.75), dec!(44.0),
            dec!(44.5), dec!(45.0), dec!(45.5), dec!(45.25), dec!(45.5),
            dec!(46.0), dec!(46.5), dec!(46.25), dec!(46.0), dec!(46.5),
        ];
        let rsi = rsi_of(&closes, 14).unwrap();
        assert!(rsi > Decimal::ZERO && rsi < dec!(100));
        assert!(rsi > dec!(50)); // mostly gains
    }
}
