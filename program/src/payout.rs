use solana_program::{account_info::AccountInfo, msg, pubkey::Pubkey};
use thiserror::Error;

/// Why the pot could not be paid out
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferError {
    /// The supplied payout account is not the drawn winner
    #[error("recipient account is not the drawn winner")]
    RecipientMismatch,
    /// Pot account cannot cover the prize without dropping below rent exemption
    #[error("pot holds {available} spendable lamports, {required} required")]
    InsufficientFunds { available: u64, required: u64 },
    /// Lamport balances are already borrowed elsewhere
    #[error("account lamports already borrowed")]
    AccountBorrowFailed,
    /// Recipient balance would overflow
    #[error("recipient balance overflow")]
    Overflow,
}

/// Moves the pot to the winner. A failed transfer must leave both sides as
/// they were.
pub trait PayoutExecutor {
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), TransferError>;
}

/// Pays out of a program-owned account by moving lamports directly, keeping
/// `rent_reserve` lamports behind so the account stays rent-exempt.
pub struct LamportPayout<'a, 'info> {
    source: &'a AccountInfo<'info>,
    recipient: &'a AccountInfo<'info>,
    rent_reserve: u64,
}

impl<'a, 'info> LamportPayout<'a, 'info> {
    pub fn new(
        source: &'a AccountInfo<'info>,
        recipient: &'a AccountInfo<'info>,
        rent_reserve: u64,
    ) -> Self {
        Self {
            source,
            recipient,
            rent_reserve,
        }
    }
}

impl<'a, 'info> PayoutExecutor for LamportPayout<'a, 'info> {
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), TransferError> {
        if self.recipient.key != to {
            msg!("Payout account {} is not the winner {}", self.recipient.key, to);
            return Err(TransferError::RecipientMismatch);
        }

        let available = self.source.lamports().saturating_sub(self.rent_reserve);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        let mut source_lamports = self
            .source
            .try_borrow_mut_lamports()
            .map_err(|_| TransferError::AccountBorrowFailed)?;
        let mut recipient_lamports = self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| TransferError::AccountBorrowFailed)?;

        let credited = recipient_lamports
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        **source_lamports -= amount;
        **recipient_lamports = credited;

        msg!("Paid {} lamports to {}", amount, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account<'a>(
        key: &'a Pubkey,
        owner: &'a Pubkey,
        lamports: &'a mut u64,
        data: &'a mut [u8],
    ) -> AccountInfo<'a> {
        AccountInfo::new(key, false, true, lamports, data, owner, false, 0)
    }

    #[test]
    fn test_moves_lamports_above_reserve() {
        let (pot_key, winner_key, owner) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let (mut pot_data, mut winner_data) = ([0u8; 0], [0u8; 0]);
        let (mut pot_lamports, mut winner_lamports) = (1_300u64, 50u64);
        let pot = account(&pot_key, &owner, &mut pot_lamports, &mut pot_data);
        let winner = account(&winner_key, &owner, &mut winner_lamports, &mut winner_data);

        LamportPayout::new(&pot, &winner, 1_000)
            .transfer(&winner_key, 300)
            .unwrap();

        assert_eq!(pot.lamports(), 1_000);
        assert_eq!(winner.lamports(), 350);
    }

    #[test]
    fn test_refuses_to_dip_into_rent_reserve() {
        let (pot_key, winner_key, owner) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let (mut pot_data, mut winner_data) = ([0u8; 0], [0u8; 0]);
        let (mut pot_lamports, mut winner_lamports) = (1_200u64, 0u64);
        let pot = account(&pot_key, &owner, &mut pot_lamports, &mut pot_data);
        let winner = account(&winner_key, &owner, &mut winner_lamports, &mut winner_data);

        let err = LamportPayout::new(&pot, &winner, 1_000)
            .transfer(&winner_key, 300)
            .unwrap_err();

        assert_eq!(
            err,
            TransferError::InsufficientFunds {
                available: 200,
                required: 300
            }
        );
        assert_eq!(pot.lamports(), 1_200);
        assert_eq!(winner.lamports(), 0);
    }

    #[test]
    fn test_rejects_wrong_recipient() {
        let (pot_key, winner_key, owner) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let (mut pot_data, mut winner_data) = ([0u8; 0], [0u8; 0]);
        let (mut pot_lamports, mut winner_lamports) = (5_000u64, 0u64);
        let pot = account(&pot_key, &owner, &mut pot_lamports, &mut pot_data);
        let winner = account(&winner_key, &owner, &mut winner_lamports, &mut winner_data);

        let err = LamportPayout::new(&pot, &winner, 0)
            .transfer(&Pubkey::new_unique(), 300)
            .unwrap_err();

        assert_eq!(err, TransferError::RecipientMismatch);
        assert_eq!(pot.lamports(), 5_000);
    }
}
