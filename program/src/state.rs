use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::{
    constants::{DEFAULT_NUM_WORDS, DEFAULT_REQUEST_CONFIRMATIONS},
    ledger::EntryLedger,
};

/// Identifier the oracle assigns to a randomness request
pub type RequestId = u64;

/// Coarse status of the round, as reported to pollers and in errors
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleStatus {
    /// Accepting entries
    Open,
    /// Waiting for the oracle callback
    Settling,
}

impl TryFrom<u8> for RaffleStatus {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleStatus::Open),
            1 => Ok(RaffleStatus::Settling),
            _ => Err("Invalid raffle status"),
        }
    }
}

impl From<RaffleStatus> for u8 {
    fn from(status: RaffleStatus) -> Self {
        match status {
            RaffleStatus::Open => 0,
            RaffleStatus::Settling => 1,
        }
    }
}

/// Round state. The pending request id only exists while settling.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    Open,
    Settling { request_id: RequestId },
}

/// Parameters forwarded to the oracle with every randomness request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestParams {
    /// Oracle key hash (gas lane) selecting the proving key and price tier
    pub key_hash: [u8; 32],
    /// Oracle subscription that is billed for the request
    pub subscription_id: u64,
    /// Confirmations the oracle waits before answering
    pub request_confirmations: u16,
    /// Compute budget the oracle should attach to the callback transaction
    pub callback_compute_limit: u32,
    /// Number of random words requested
    pub num_words: u32,
}

impl RequestParams {
    /// Request parameters with the default confirmation count and a single word.
    pub fn new(key_hash: [u8; 32], subscription_id: u64, callback_compute_limit: u32) -> Self {
        Self {
            key_hash,
            subscription_id,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            callback_compute_limit,
            num_words: DEFAULT_NUM_WORDS,
        }
    }
}

/// Immutable raffle configuration, fixed at initialization
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that initialized the raffle
    pub admin: Pubkey,
    /// Only this identity may deliver randomness
    pub oracle: Pubkey,
    /// Minimum payment per entry in lamports
    pub entry_fee: u64,
    /// Seconds that must elapse after a settlement before the next one
    pub interval: i64,
    /// Oracle request parameters
    pub request: RequestParams,
    /// Number of player slots the round account was sized for
    pub max_players: u32,
    /// Bump of the round PDA
    pub round_bump: u8,
}

impl Config {
    pub fn entry_fee(&self) -> u64 {
        self.entry_fee
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn request_confirmations(&self) -> u16 {
        self.request.request_confirmations
    }

    pub fn num_words(&self) -> u32 {
        self.request.num_words
    }
}

impl Sealed for Config {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 32 + 8 + 2 + 4 + 4 + 4 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (
            is_initialized,
            admin,
            oracle,
            entry_fee,
            interval,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_compute_limit,
            num_words,
            max_players,
            round_bump,
        ) = array_refs![src, 1, 32, 32, 8, 8, 32, 8, 2, 4, 4, 4, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(Config {
            is_initialized,
            admin: Pubkey::new_from_array(*admin),
            oracle: Pubkey::new_from_array(*oracle),
            entry_fee: u64::from_le_bytes(*entry_fee),
            interval: i64::from_le_bytes(*interval),
            request: RequestParams {
                key_hash: *key_hash,
                subscription_id: u64::from_le_bytes(*subscription_id),
                request_confirmations: u16::from_le_bytes(*request_confirmations),
                callback_compute_limit: u32::from_le_bytes(*callback_compute_limit),
                num_words: u32::from_le_bytes(*num_words),
            },
            max_players: u32::from_le_bytes(*max_players),
            round_bump: round_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            oracle_dst,
            entry_fee_dst,
            interval_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_compute_limit_dst,
            num_words_dst,
            max_players_dst,
            round_bump_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 32, 8, 2, 4, 4, 4, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *entry_fee_dst = self.entry_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.request.key_hash);
        *subscription_id_dst = self.request.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.request.request_confirmations.to_le_bytes();
        *callback_compute_limit_dst = self.request.callback_compute_limit.to_le_bytes();
        *num_words_dst = self.request.num_words.to_le_bytes();
        *max_players_dst = self.max_players.to_le_bytes();
        round_bump_dst[0] = self.round_bump;
    }
}

/// The single mutable round. Its account also holds the pot lamports.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Round {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Open or settling, with the pending request id
    pub state: RoundState,
    /// Players and pot of the current round
    pub ledger: EntryLedger,
    /// When the current round started
    pub last_settlement_timestamp: UnixTimestamp,
    /// Winner of the most recently completed round
    pub recent_winner: Option<Pubkey>,
    /// Number of rounds completed so far
    pub round_number: u64,
    /// Nonce mixed into the next randomness request id
    pub request_nonce: u64,
}

impl Round {
    // bool + largest RoundState + ledger header + timestamp + Option<Pubkey> + two u64
    const BASE_LEN: usize = 1 + (1 + 8) + EntryLedger::HEADER_LEN + 8 + (1 + 32) + 8 + 8;

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            state: RoundState::Open,
            ledger: EntryLedger::default(),
            last_settlement_timestamp: now,
            recent_winner: None,
            round_number: 0,
            request_nonce: 0,
        }
    }

    /// Account size needed to hold `max_players` entries
    pub fn space(max_players: u32) -> usize {
        Self::BASE_LEN + max_players as usize * EntryLedger::SLOT_LEN
    }

    /// Reads a round from account data. Trailing bytes left by a longer
    /// ledger are ignored.
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let round =
            Self::deserialize(&mut &data[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !round.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(round)
    }

    pub fn save(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        self.serialize(&mut &mut data[..])
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    pub fn status(&self) -> RaffleStatus {
        match self.state {
            RoundState::Open => RaffleStatus::Open,
            RoundState::Settling { .. } => RaffleStatus::Settling,
        }
    }

    pub fn pending_request_id(&self) -> Option<RequestId> {
        match self.state {
            RoundState::Open => None,
            RoundState::Settling { request_id } => Some(request_id),
        }
    }

    pub fn players(&self) -> &[Pubkey] {
        self.ledger.players()
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.ledger.get(index)
    }

    pub fn num_players(&self) -> u64 {
        self.ledger.len() as u64
    }

    pub fn pot_balance(&self) -> u64 {
        self.ledger.pot_balance()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.last_settlement_timestamp
    }
}
