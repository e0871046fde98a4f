use solana_program::{decode_error::DecodeError, msg, program_error::ProgramError};
use thiserror::Error;

use crate::{
    payout::TransferError,
    state::{RaffleStatus, RequestId},
};

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Config or round account already exists
    #[error("Raffle already initialized")]
    AlreadyInitialized,

    /// Config or round account was never initialized
    #[error("Raffle not initialized")]
    NotInitialized,

    /// Construction parameters out of range
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Account does not sit at the expected program address
    #[error("Account does not match the expected program address")]
    InvalidAccount,

    /// Entry paid less than the entry fee
    #[error("Payment of {paid} lamports is below the entry fee of {entry_fee}")]
    InsufficientPayment { paid: u64, entry_fee: u64 },

    /// Entry attempted while the round is settling
    #[error("Round is not open for entries")]
    RoundNotOpen,

    /// Ledger reached the capacity the round account was sized for
    #[error("Round is full")]
    RoundFull,

    /// Settlement attempted while the upkeep predicate is false
    #[error("Upkeep not needed (pot {pot_balance}, players {num_players}, state {state:?})")]
    UpkeepNotNeeded {
        pot_balance: u64,
        num_players: u64,
        state: RaffleStatus,
    },

    /// Randomness callback signed by someone other than the configured oracle
    #[error("Caller is not the configured randomness oracle")]
    UnauthorizedOracle,

    /// Callback for a request that is not the pending one
    #[error("Unknown randomness request {request_id}")]
    UnknownRequest { request_id: RequestId },

    /// Callback delivered no random words
    #[error("Randomness callback carried no words")]
    InvalidRandomWords,

    /// Settling round has no players to draw from
    #[error("Round has no players")]
    EmptyRound,

    /// Payout to the winner failed; the round stays settling
    #[error("Payout failed: {0}")]
    Transfer(#[from] TransferError),

    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// Initialization signed by someone other than the program's upgrade authority
    #[error("Only the program upgrade authority may initialize the raffle")]
    UnauthorizedAdmin,
}

impl RaffleError {
    /// Stable custom error code reported through `ProgramError::Custom`.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidInstructionData => 0,
            Self::AlreadyInitialized => 1,
            Self::NotInitialized => 2,
            Self::InvalidConfig => 3,
            Self::InvalidAccount => 4,
            Self::InsufficientPayment { .. } => 5,
            Self::RoundNotOpen => 6,
            Self::RoundFull => 7,
            Self::UpkeepNotNeeded { .. } => 8,
            Self::UnauthorizedOracle => 9,
            Self::UnknownRequest { .. } => 10,
            Self::InvalidRandomWords => 11,
            Self::EmptyRound => 12,
            Self::Transfer(_) => 13,
            Self::Overflow => 14,
            Self::UnauthorizedAdmin => 15,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        // Only the code survives the conversion, so log the details first.
        msg!("Raffle error: {}", e);
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}
