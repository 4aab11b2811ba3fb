// ============================================================================
// Settlement Engine - resolving concluded wagers
// ============================================================================
//
// Runs as a recurring background sweep and on demand for admins. A wager
// settles exactly once: the open-status guard in `settle_one` makes every
// path idempotent. Outcomes are simulated from the wager's final odds with
// a seedable RNG unless an admin forces a result.

use crate::bank::Bank;
use crate::odds;
use crate::wagers::{Wager, WagerBook, WagerError, WagerStatus};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Hours past the event start before a wager counts as concluded
/// (approximates game duration).
pub const GRACE_HOURS: i64 = 3;

/// Weight given to the odds-implied probability when simulating an outcome;
/// the remainder is uniform noise.
const IMPLIED_WEIGHT: f64 = 0.9;

pub struct SettlementEngine {
    rng: StdRng,
    grace: Duration,
}

impl SettlementEngine {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            grace: Duration::hours(GRACE_HOURS),
        }
    }

    /// Deterministic engine for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            grace: Duration::hours(GRACE_HOURS),
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Settle one wager. `forced` overrides the simulated outcome (admin).
    /// Calling this on a non-open wager fails with `NotOpen` and changes
    /// nothing, so double settlement can never credit twice.
    pub fn settle_one(
        &mut self,
        book: &mut WagerBook,
        bank: &mut Bank,
        wager_id: &str,
        forced: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<Wager, WagerError> {
        let wager = book
            .get_mut(wager_id)
            .ok_or_else(|| WagerError::NotFound(format!("wager {}", wager_id)))?;

        if wager.status != WagerStatus::Open {
            return Err(WagerError::NotOpen("wager already settled".to_string()));
        }

        let won = match forced {
            Some(result) => result,
            None => simulate_outcome(wager.combined_odds, &mut self.rng),
        };

        wager.settled_at = Some(now);
        wager.can_cancel = false;

        if won {
            let payout = odds::payout(wager.combined_odds, wager.stake);
            wager.status = WagerStatus::Won;
            wager.payout = Some(payout);
            bank.credit(&wager.user_id, payout);
            tracing::info!("wager {} won, paid {:.2} to {}", wager_id, payout, wager.user_id);
        } else {
            wager.status = WagerStatus::Lost;
            wager.payout = Some(0.0);
            tracing::info!("wager {} lost", wager_id);
        }

        Ok(wager.clone())
    }

    /// Settle every open wager whose event concluded (event time plus the
    /// grace window has passed). Returns the number settled.
    pub fn sweep(&mut self, book: &mut WagerBook, bank: &mut Bank, now: DateTime<Utc>) -> usize {
        let due = book.due_for_settlement(now - self.grace);

        let mut settled = 0;
        for wager_id in due {
            if self.settle_one(book, bank, &wager_id, None, now).is_ok() {
                settled += 1;
            }
        }

        if settled > 0 {
            tracing::info!("settlement sweep resolved {} wager(s)", settled);
        }
        settled
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated win/loss: implied probability from the final odds blended with
/// a small uniform component, then a boolean draw.
pub fn simulate_outcome(american: i32, rng: &mut StdRng) -> bool {
    let implied = odds::win_probability(american);
    let adjusted = implied * IMPLIED_WEIGHT + rng.gen::<f64>() * (1.0 - IMPLIED_WEIGHT);
    rng.gen::<f64>() < adjusted
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SettlementStats {
    pub total_wagers: usize,
    pub open: usize,
    pub won: usize,
    pub lost: usize,
    pub cancelled: usize,
    pub total_payouts: f64,
}

pub fn settlement_stats(book: &WagerBook) -> SettlementStats {
    let mut stats = SettlementStats {
        total_wagers: 0,
        open: 0,
        won: 0,
        lost: 0,
        cancelled: 0,
        total_payouts: 0.0,
    };

    for wager in book.all() {
        stats.total_wagers += 1;
        match wager.status {
            WagerStatus::Open => stats.open += 1,
            WagerStatus::Won => {
                stats.won += 1;
                stats.total_payouts += wager.payout.unwrap_or(0.0);
            }
            WagerStatus::Lost => stats.lost += 1,
            WagerStatus::Cancelled => stats.cancelled += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_outcome_tracks_odds() {
        // A heavy favorite should win far more often than a long shot.
        let mut rng = StdRng::seed_from_u64(7);
        let favorite_wins = (0..2000)
            .filter(|_| simulate_outcome(-400, &mut rng))
            .count();
        let longshot_wins = (0..2000)
            .filter(|_| simulate_outcome(400, &mut rng))
            .count();
        assert!(favorite_wins > 1200, "favorite won {}", favorite_wins);
        assert!(longshot_wins < 800, "longshot won {}", longshot_wins);
    }
}
