use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    entrypoint::ProgramResult, log::sol_log_data, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::state::RequestId;

/// Facts emitted on every successful transition, for indexers and UIs.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    EntryRecorded {
        participant: Pubkey,
        amount: u64,
        num_players: u64,
    },
    SettlementRequested {
        request_id: RequestId,
    },
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        round_number: u64,
    },
}

impl RaffleEvent {
    /// Writes the event to the transaction log: a readable line plus the
    /// borsh encoding as log data.
    pub fn emit(&self) -> ProgramResult {
        match self {
            Self::EntryRecorded {
                participant,
                amount,
                num_players,
            } => msg!(
                "EntryRecorded: {} paid {} lamports, {} players",
                participant,
                amount,
                num_players
            ),
            Self::SettlementRequested { request_id } => {
                msg!("SettlementRequested: request {}", request_id)
            }
            Self::WinnerPicked {
                winner,
                prize,
                round_number,
            } => msg!(
                "WinnerPicked: {} won {} lamports in round {}",
                winner,
                prize,
                round_number
            ),
        }

        let data = self
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        sol_log_data(&[data.as_slice()]);
        Ok(())
    }
}
