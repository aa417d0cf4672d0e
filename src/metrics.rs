use fastnum::{D128, dec128};

use crate::domain::LedgerEntry;

/// Presentation-ready figures for one account snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub balance: D128,
    pub initial: D128,
    pub target: D128,
    pub total_pnl: D128,
    pub distance_to_target: D128,
    /// Share of the initial-to-target span covered by profit, in `[0, 1]`.
    pub progress: D128,
}

impl Metrics {
    pub fn from_snapshot(snapshot: &LedgerEntry) -> Self {
        Metrics::compute(snapshot.initial, snapshot.target, snapshot.balance)
    }

    /// A target at or below the initial balance has no meaningful span, so its
    /// progress is zero.
    pub fn compute(initial: D128, target: D128, balance: D128) -> Self {
        let total_pnl = balance - initial;
        let span = target - initial;

        let progress = if span > D128::ZERO {
            clamp_unit(total_pnl / span)
        } else {
            D128::ZERO
        };

        Metrics {
            balance,
            initial,
            target,
            total_pnl,
            distance_to_target: target - balance,
            progress,
        }
    }

    pub fn progress_percent(&self) -> D128 {
        self.progress * dec128!(100)
    }

    pub fn target_reached(&self) -> bool {
        self.target > self.initial && self.balance >= self.target
    }
}

fn clamp_unit(value: D128) -> D128 {
    if value < D128::ZERO {
        D128::ZERO
    } else if value > D128::ONE {
        D128::ONE
    } else {
        value
    }
}
