use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::state::RaffleStatus;

/// Which settlement preconditions currently hold.
///
/// Returned by the `CheckUpkeep` instruction as program return data so that
/// automation pollers can tell why a round is not eligible yet.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepDiagnostics {
    pub is_open: bool,
    pub interval_elapsed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepDiagnostics {
    /// Settlement may start only when every precondition holds.
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.interval_elapsed && self.has_players && self.has_balance
    }

    /// Names of the preconditions that do not hold
    pub fn failed_conditions(&self) -> Vec<&'static str> {
        [
            (self.is_open, "round not open"),
            (self.interval_elapsed, "interval not elapsed"),
            (self.has_players, "no players"),
            (self.has_balance, "empty pot"),
        ]
        .iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| *name)
        .collect()
    }
}

/// Evaluates the upkeep predicate. Pure: safe to call as often as pollers like.
pub fn check_upkeep(
    status: RaffleStatus,
    last_settlement_timestamp: UnixTimestamp,
    interval: i64,
    num_players: u64,
    pot_balance: u64,
    now: UnixTimestamp,
) -> UpkeepDiagnostics {
    // A clock behind the last settlement counts as "not elapsed".
    let interval_elapsed = now
        .checked_sub(last_settlement_timestamp)
        .map_or(false, |elapsed| elapsed >= interval);

    UpkeepDiagnostics {
        is_open: status == RaffleStatus::Open,
        interval_elapsed,
        has_players: num_players > 0,
        has_balance: pot_balance > 0,
    }
}
