//! Periodically settled raffle.
//!
//! Participants pay a fixed entry fee into a shared pot held by the round
//! account. Once the configured interval has passed, anyone may trigger
//! settlement, which requests randomness from an external oracle; the
//! oracle's signed callback draws the winner, pays out the pot and reopens
//! the round.

pub mod constants;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod oracle;
pub mod payout;
pub mod processor;
pub mod settlement;
pub mod state;
pub mod upkeep;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
