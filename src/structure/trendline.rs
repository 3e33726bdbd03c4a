use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::swing::{SwingKind, SwingPoint};
use crate::num;

/// A line fitted through two qualifying pivots of the same kind, with
/// its projection at the current bar.
///
/// No sign assumption on the slope: ascending, descending and flat
/// lines are all valid, which is what lets one detector catch both a
/// descending-resistance breakout and an ascending-wedge-resistance
/// breakout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub p1: SwingPoint,
    pub p2: SwingPoint,
    /// Price change per bar.
    pub slope: Decimal,
    /// Linear extrapolation of the line to the current bar index.
    pub projection: Decimal,
}

/// Fit a trendline through the two most recent pivots of `kind`.
///
/// Qualification: the index gap between the two pivots must satisfy
/// `min_distance <= gap <= max_age`, and the older pivot must be no
/// further than `max_age` bars behind `current_index`. Returns `None`
/// when no such pair exists.
pub fn fit_trendline(
    swings: &[SwingPoint],
    kind: SwingKind,
    current_index: usize,
    min_distance: usize,
    max_age: usize,
) -> Option<Trendline> {
    let pivots: Vec<&SwingPoint> = swings.iter().filter(|s| s.kind == kind).collect();
    if pivots.len() < 2 {
        return None;
    }

    let p2 = **pivots.last()?;
    // Most recent earlier pivot that qualifies against p2.
    let p1 = **pivots[..pivots.len() - 1].iter().rev().find(|p| {
        let gap = p2.index - p.index;
        gap >= min_distance && gap <= max_age && current_index - p.index <= max_age
    })?;

    let gap = Decimal::from(p2.index - p1.index);
    let slope = num::div(p2.price - p1.price, gap).ok()?;
    let ahead = Decimal::from(current_index - p2.index);
    let projection = p2.price + slope * ahead;

    Some(Trendline {
        p1,
        p2,
        slope,
        projection,
    })
}
