use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::{
    constants::MAX_RANDOM_WORDS,
    error::RaffleError,
    oracle::RandomWord,
    state::{RequestId, RequestParams},
    utils::{find_config_address, find_program_data_address, find_round_address},
};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle: config account and the round account holding the pot
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin (program upgrade authority), pays for both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The round account (PDA)
    /// 3. `[]` The oracle authority allowed to deliver randomness
    /// 4. `[]` The program's ProgramData account
    /// 5. `[]` The system program
    InitializeRaffle {
        /// Minimum payment per entry in lamports
        entry_fee: u64,
        /// Seconds between settlements
        interval: i64,
        /// Oracle request parameters
        request: RequestParams,
        /// Player slots to allocate in the round account
        max_players: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant, pays the entry
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The system program
    Enter {
        /// Lamports paid, at least the entry fee
        amount: u64,
    },

    /// Report whether settlement may start; `UpkeepDiagnostics` is returned
    /// as program return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The round account
    CheckUpkeep,

    /// Start settlement and request randomness (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    PerformUpkeep,

    /// Oracle callback: pick the winner, pay the pot, reopen the round
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The winner, `players[words[0] mod players.len()]`
    FulfillRandomness {
        /// Request being answered
        request_id: RequestId,
        /// Delivered random words
        random_words: Vec<RandomWord>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entry_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (request_confirmations, rest) = Self::unpack_u16(rest)?;
                let (callback_compute_limit, rest) = Self::unpack_u32(rest)?;
                let (num_words, rest) = Self::unpack_u32(rest)?;
                let (max_players, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entry_fee,
                    interval,
                    request: RequestParams {
                        key_hash,
                        subscription_id,
                        request_confirmations,
                        callback_compute_limit,
                        num_words,
                    },
                    max_players,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                if count > MAX_RANDOM_WORDS {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let mut random_words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (word, tail) = Self::unpack_fixed_bytes::<32>(rest)?;
                    random_words.push(word);
                    rest = tail;
                }
                Self::FulfillRandomness {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle {
                entry_fee,
                interval,
                request,
                max_players,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entry_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(&request.key_hash);
                buf.extend_from_slice(&request.subscription_id.to_le_bytes());
                buf.extend_from_slice(&request.request_confirmations.to_le_bytes());
                buf.extend_from_slice(&request.callback_compute_limit.to_le_bytes());
                buf.extend_from_slice(&request.num_words.to_le_bytes());
                buf.extend_from_slice(&max_players.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomness {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(word);
                }
            }
        }
        buf
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstructionData))?;
        Ok((bytes, rest))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((i64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_u16(input: &[u8]) -> Result<(u16, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<2>(input)?;
        Ok((u16::from_le_bytes(bytes), rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    admin: &Pubkey,
    oracle: &Pubkey,
    entry_fee: u64,
    interval: i64,
    request: RequestParams,
    max_players: u32,
) -> Instruction {
    let data = RaffleInstruction::InitializeRaffle {
        entry_fee,
        interval,
        request,
        max_players,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*admin, true),
        AccountMeta::new(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new_readonly(*oracle, false),
        AccountMeta::new_readonly(find_program_data_address(program_id), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter instruction
pub fn enter(program_id: &Pubkey, participant: &Pubkey, amount: u64) -> Instruction {
    let data = RaffleInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*participant, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new_readonly(find_round_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle: &Pubkey,
    winner: &Pubkey,
    request_id: RequestId,
    random_words: Vec<RandomWord>,
) -> Instruction {
    let data = RaffleInstruction::FulfillRandomness {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_round_address(program_id).0, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
