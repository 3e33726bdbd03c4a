use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::swing::SwingPoint;
use crate::num;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    Support,
    Resistance,
}

/// A clustered support/resistance zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrLevel {
    /// Arithmetic mean of the clustered swing prices.
    pub price: Decimal,
    pub kind: LevelKind,
    /// Number of swings merged into this level.
    pub touches: usize,
}

/// Cluster swing prices into support/resistance levels.
///
/// Candidate prices are sorted; adjacent candidates within `tolerance`
/// of the previous member (callers typically pass ATR × multiplier)
/// are merged into one level whose price is the mean of its members
/// and whose touch count is the cluster size.
///
/// `reference_close` should be the *prior* bar's close so that the
/// current bar's breakout can be evaluated against levels fixed before
/// it existed: levels below the reference classify as support, at or
/// above as resistance.
pub fn cluster_levels(
    swings: &[SwingPoint],
    tolerance: Decimal,
    reference_close: Decimal,
) -> Vec<SrLevel> {
    if swings.is_empty() {
        return Vec::new();
    }

    let mut prices: Vec<Decimal> = swings.iter().map(|s| s.price).collect();
    prices.sort();

    let mut levels = Vec::new();
    let mut cluster: Vec<Decimal> = vec![prices[0]];

    for &price in &prices[1..] {
        // `prices` is sorted, so distance to the last member decides
        // whether the chain continues.
        let last = *cluster.last().unwrap_or(&price);
        if price - last <= tolerance {
            cluster.push(price);
        } else {
            levels.push(finish_cluster(&cluster, reference_close));
            cluster = vec![price];
        }
    }
    levels.push(finish_cluster(&cluster, reference_close));
    levels
}

fn finish_cluster(members: &[Decimal], reference_close: Decimal) -> SrLevel {
    let price = num::mean(members).unwrap_or(reference_close);
    let kind = if price < reference_close {
        LevelKind::Support
    } else {
        LevelKind::Resistance
    };
    SrLevel {
        price,
        kind,
        touches: members.len(),
    }
}

/// The nearest level of `kind` relative to `price`: the highest
/// support below it, or the lowest resistance above it.
pub fn nearest_level(levels: &[SrLevel], kind: LevelKind, price: Decimal) -> Option<&SrLevel> {
    match kind {
        LevelKind::Support => levels
            .iter()
            .filter(|l| l.kind == LevelKind::Support && l.price < price)
            .max_by(|a, b| a.price.cmp(&b.price)),
        LevelKind::Resistance => levels
            .iter()
            .filter(|l| l.kind == LevelKind::Resistance && l.price > price)
            .min_by(|a, b| a.price.cmp(&b.price)),
    }
}
