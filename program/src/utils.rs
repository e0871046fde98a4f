// Raffle program - address and account helpers
use arrayref::{array_ref, array_refs};
use solana_program::{
    account_info::AccountInfo,
    bpf_loader_upgradeable,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
};

use crate::{
    constants::{CONFIG_SEED, ROUND_SEED},
    error::RaffleError,
    state::{Config, Round},
};

/// Size of the ProgramData header: enum tag, deploy slot, optional authority
pub const PROGRAM_DATA_METADATA_LEN: usize = 4 + 8 + 1 + 32;

// Enum tag of `UpgradeableLoaderState::ProgramData`
const PROGRAM_DATA_TAG: u32 = 3;

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the round account
pub fn find_round_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUND_SEED], program_id)
}

/// Find the ProgramData account the upgradeable loader keeps for `program_id`
pub fn find_program_data_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[program_id.as_ref()], &bpf_loader_upgradeable::id()).0
}

/// Reads the upgrade authority out of a ProgramData account's header.
/// `None` means the program was deployed as immutable.
pub fn unpack_upgrade_authority(data: &[u8]) -> Result<Option<Pubkey>, ProgramError> {
    if data.len() < PROGRAM_DATA_METADATA_LEN {
        return Err(ProgramError::InvalidAccountData);
    }
    let header = array_ref![data, 0, PROGRAM_DATA_METADATA_LEN];
    let (tag, _slot, authority_tag, authority) = array_refs![header, 4, 8, 1, 32];

    if u32::from_le_bytes(*tag) != PROGRAM_DATA_TAG {
        return Err(ProgramError::InvalidAccountData);
    }
    match authority_tag {
        [0] => Ok(None),
        [1] => Ok(Some(Pubkey::new_from_array(*authority))),
        _ => Err(ProgramError::InvalidAccountData),
    }
}

/// Checks that `admin` is the upgrade authority recorded for `program_id`
pub fn check_upgrade_authority(
    admin: &Pubkey,
    program_data_info: &AccountInfo,
    program_id: &Pubkey,
) -> ProgramResult {
    if *program_data_info.key != find_program_data_address(program_id) {
        msg!("Invalid program data account");
        return Err(RaffleError::InvalidAccount.into());
    }
    if *program_data_info.owner != bpf_loader_upgradeable::id() {
        return Err(ProgramError::IncorrectProgramId);
    }

    match unpack_upgrade_authority(&program_data_info.data.borrow())? {
        Some(authority) if authority == *admin => Ok(()),
        _ => {
            msg!("{} is not the upgrade authority", admin);
            Err(RaffleError::UnauthorizedAdmin.into())
        }
    }
}

/// Creates a program-owned account at a PDA. An address that was already
/// funded by someone else is topped up to rent exemption, then allocated and
/// assigned, since `create_account` refuses accounts holding lamports.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    rent: &Rent,
    space: usize,
    owner: &Pubkey,
    system_program: &AccountInfo<'a>,
    new_pda_account: &AccountInfo<'a>,
    new_pda_signer_seeds: &[&[u8]],
) -> ProgramResult {
    let required_lamports = rent.minimum_balance(space).max(1);

    if new_pda_account.lamports() > 0 {
        let top_up = required_lamports.saturating_sub(new_pda_account.lamports());
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer.key, new_pda_account.key, top_up),
                &[
                    payer.clone(),
                    new_pda_account.clone(),
                    system_program.clone(),
                ],
            )?;
        }

        invoke_signed(
            &system_instruction::allocate(new_pda_account.key, space as u64),
            &[new_pda_account.clone(), system_program.clone()],
            &[new_pda_signer_seeds],
        )?;

        invoke_signed(
            &system_instruction::assign(new_pda_account.key, owner),
            &[new_pda_account.clone(), system_program.clone()],
            &[new_pda_signer_seeds],
        )
    } else {
        invoke_signed(
            &system_instruction::create_account(
                payer.key,
                new_pda_account.key,
                required_lamports,
                space as u64,
                owner,
            ),
            &[
                payer.clone(),
                new_pda_account.clone(),
                system_program.clone(),
            ],
            &[new_pda_signer_seeds],
        )
    }
}

/// Loads the config after checking owner and address
pub fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<Config, ProgramError> {
    if config_info.owner != program_id {
        msg!("Config account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    if *config_info.key != find_config_address(program_id).0 {
        msg!("Invalid config account address");
        return Err(RaffleError::InvalidAccount.into());
    }

    let config = Config::unpack_unchecked(&config_info.data.borrow())?;
    if !config.is_initialized {
        return Err(RaffleError::NotInitialized.into());
    }
    Ok(config)
}

/// Loads the round after checking owner and address against the config's bump
pub fn load_round(
    round_info: &AccountInfo,
    config: &Config,
    program_id: &Pubkey,
) -> Result<Round, ProgramError> {
    if round_info.owner != program_id {
        msg!("Round account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let expected = Pubkey::create_program_address(&[ROUND_SEED, &[config.round_bump]], program_id)?;
    if *round_info.key != expected {
        msg!("Invalid round account address");
        return Err(RaffleError::InvalidAccount.into());
    }

    Round::load(&round_info.data.borrow()).map_err(|err| match err {
        ProgramError::UninitializedAccount => RaffleError::NotInitialized.into(),
        err => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RequestParams;

    fn program_data(authority: Option<&Pubkey>) -> Vec<u8> {
        let mut data = Vec::with_capacity(PROGRAM_DATA_METADATA_LEN + 4);
        data.extend_from_slice(&PROGRAM_DATA_TAG.to_le_bytes());
        data.extend_from_slice(&42u64.to_le_bytes());
        match authority {
            Some(key) => {
                data.push(1);
                data.extend_from_slice(key.as_ref());
            }
            None => data.extend_from_slice(&[0u8; 33]),
        }
        // program bytes follow the header
        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        data
    }

    fn config(round_bump: u8) -> Config {
        Config {
            is_initialized: true,
            admin: Pubkey::new_unique(),
            oracle: Pubkey::new_unique(),
            entry_fee: 100,
            interval: 30,
            request: RequestParams::new([1u8; 32], 588, 500_000),
            max_players: 4,
            round_bump,
        }
    }

    #[test]
    fn test_addresses_are_distinct_and_stable() {
        let program_id = Pubkey::new_unique();
        let (config, _) = find_config_address(&program_id);
        let (round, bump) = find_round_address(&program_id);

        assert_ne!(config, round);
        assert_eq!(find_round_address(&program_id), (round, bump));
        assert_eq!(
            Pubkey::create_program_address(&[ROUND_SEED, &[bump]], &program_id).unwrap(),
            round
        );
    }

    #[test]
    fn test_unpack_upgrade_authority() {
        let authority = Pubkey::new_unique();

        assert_eq!(
            unpack_upgrade_authority(&program_data(Some(&authority))).unwrap(),
            Some(authority)
        );
        assert_eq!(unpack_upgrade_authority(&program_data(None)).unwrap(), None);

        let mut program_account = program_data(Some(&authority));
        program_account[0] = 2;
        assert_eq!(
            unpack_upgrade_authority(&program_account).unwrap_err(),
            ProgramError::InvalidAccountData
        );
        assert!(unpack_upgrade_authority(&[3, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_only_upgrade_authority_may_initialize() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let key = find_program_data_address(&program_id);
        let owner = bpf_loader_upgradeable::id();
        let mut lamports = 1_000_000u64;
        let mut data = program_data(Some(&authority));
        let info = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &owner, false, 0);

        assert!(check_upgrade_authority(&authority, &info, &program_id).is_ok());
        assert_eq!(
            check_upgrade_authority(&Pubkey::new_unique(), &info, &program_id).unwrap_err(),
            ProgramError::from(RaffleError::UnauthorizedAdmin)
        );
        assert_eq!(
            check_upgrade_authority(&authority, &info, &Pubkey::new_unique()).unwrap_err(),
            ProgramError::from(RaffleError::InvalidAccount)
        );
    }

    #[test]
    fn test_immutable_program_cannot_be_initialized() {
        let program_id = Pubkey::new_unique();
        let key = find_program_data_address(&program_id);
        let owner = bpf_loader_upgradeable::id();
        let mut lamports = 1_000_000u64;
        let mut data = program_data(None);
        let info = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &owner, false, 0);

        assert_eq!(
            check_upgrade_authority(&Pubkey::new_unique(), &info, &program_id).unwrap_err(),
            ProgramError::from(RaffleError::UnauthorizedAdmin)
        );
    }

    #[test]
    fn test_zeroed_config_is_not_initialized() {
        let program_id = Pubkey::new_unique();
        let (key, _) = find_config_address(&program_id);
        let mut lamports = 1_000_000u64;
        let mut data = vec![0u8; Config::LEN];
        let info = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &program_id, false, 0);

        assert_eq!(
            load_config(&info, &program_id).unwrap_err(),
            ProgramError::from(RaffleError::NotInitialized)
        );
    }

    #[test]
    fn test_zeroed_round_is_not_initialized() {
        let program_id = Pubkey::new_unique();
        let (key, bump) = find_round_address(&program_id);
        let mut lamports = 1_000_000u64;
        let mut data = vec![0u8; Round::space(4)];
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &program_id, false, 0);

        assert_eq!(
            load_round(&info, &config(bump), &program_id).unwrap_err(),
            ProgramError::from(RaffleError::NotInitialized)
        );

        Round::new(1_000).save(&mut info.data.borrow_mut()).unwrap();
        assert_eq!(
            load_round(&info, &config(bump), &program_id).unwrap(),
            Round::new(1_000)
        );
    }
}
