use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    constants::{CONFIG_SEED, MAX_PLAYERS_CAPACITY, MAX_RANDOM_WORDS, ROUND_SEED},
    error::RaffleError,
    instruction::RaffleInstruction,
    oracle::{CoordinatorOracle, RandomWord},
    payout::LamportPayout,
    state::{Config, RequestId, RequestParams, Round},
    utils::{
        check_upgrade_authority, create_pda_account, find_config_address, find_round_address,
        load_config, load_round,
    },
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entry_fee,
                interval,
                request,
                max_players,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entry_fee,
                    interval,
                    request,
                    max_players,
                    program_id,
                )
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomness {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Creates the config and round accounts. Only the program's upgrade
    /// authority may do this. The round starts open and empty, with `now` as
    /// its settlement baseline.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entry_fee: u64,
        interval: i64,
        request: RequestParams,
        max_players: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let program_data_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        check_upgrade_authority(admin_info.key, program_data_info, program_id)?;

        if entry_fee == 0
            || interval <= 0
            || request.num_words == 0
            || request.num_words > MAX_RANDOM_WORDS
            || max_players == 0
            || max_players > MAX_PLAYERS_CAPACITY
        {
            msg!(
                "Invalid config: entry_fee={}, interval={}, num_words={}, max_players={}",
                entry_fee,
                interval,
                request.num_words,
                max_players
            );
            return Err(RaffleError::InvalidConfig.into());
        }

        let (config_address, config_bump) = find_config_address(program_id);
        let (round_address, round_bump) = find_round_address(program_id);
        if *config_info.key != config_address || *round_info.key != round_address {
            msg!("Config and round accounts must be the program addresses");
            return Err(RaffleError::InvalidAccount.into());
        }
        if config_info.owner == program_id || round_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        let round_space = Round::space(max_players);

        create_pda_account(
            admin_info,
            &rent,
            Config::LEN,
            program_id,
            system_program_info,
            config_info,
            &[CONFIG_SEED, &[config_bump]],
        )?;
        create_pda_account(
            admin_info,
            &rent,
            round_space,
            program_id,
            system_program_info,
            round_info,
            &[ROUND_SEED, &[round_bump]],
        )?;

        let config = Config {
            is_initialized: true,
            admin: *admin_info.key,
            oracle: *oracle_info.key,
            entry_fee,
            interval,
            request,
            max_players,
            round_bump,
        };
        Config::pack(config, &mut config_info.data.borrow_mut())?;

        let now = Clock::get()?.unix_timestamp;
        Round::new(now).save(&mut round_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: entry_fee={}, interval={}s, oracle={}, max_players={}",
            entry_fee,
            interval,
            oracle_info.key,
            max_players
        );
        Ok(())
    }

    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(config_info, program_id)?;
        let mut round = load_round(round_info, &config, program_id)?;

        let event = round.enter(&config, *participant_info.key, amount)?;

        invoke(
            &system_instruction::transfer(participant_info.key, round_info.key, amount),
            &[
                participant_info.clone(),
                round_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        round.save(&mut round_info.data.borrow_mut())?;
        event.emit()
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config = load_config(config_info, program_id)?;
        let round = load_round(round_info, &config, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let diagnostics = round.check_upkeep(&config, now);

        if diagnostics.upkeep_needed() {
            msg!("Upkeep needed");
        } else {
            msg!("Upkeep not needed: {}", diagnostics.failed_conditions().join(", "));
        }

        let data = diagnostics
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(config_info, program_id)?;
        let mut round = load_round(round_info, &config, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let mut oracle = CoordinatorOracle::new(*round_info.key);
        let event = round.perform_upkeep(&config, now, &mut oracle)?;

        round.save(&mut round_info.data.borrow_mut())?;
        event.emit()
    }

    /// Oracle callback. Any failure, including a failed payout, aborts the
    /// transaction and leaves the round settling on the same request.
    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: RequestId,
        random_words: &[RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !oracle_info.is_signer {
            msg!("Oracle must sign the randomness callback");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(config_info, program_id)?;
        let mut round = load_round(round_info, &config, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let rent_reserve = Rent::get()?.minimum_balance(round_info.data_len());
        let mut payout = LamportPayout::new(round_info, winner_info, rent_reserve);

        let event = round
            .fulfill_randomness(
                &config,
                oracle_info.key,
                request_id,
                random_words,
                now,
                &mut payout,
            )
            .map_err(|err| {
                msg!("Rejected randomness callback for request {}", request_id);
                err
            })?;

        round.save(&mut round_info.data.borrow_mut())?;
        event.emit()
    }
}
