use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;

/// Players of the current round in entry order, together with what they paid.
///
/// The pot is the sum of actual payments rather than `entry_fee * players`,
/// since entries may overpay and the excess stays in the pot.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    players: Vec<Pubkey>,
    pot_balance: u64,
}

impl EntryLedger {
    /// Serialized size of an empty ledger: vec length prefix + pot
    pub const HEADER_LEN: usize = 4 + 8;
    /// Serialized size of one player slot
    pub const SLOT_LEN: usize = 32;

    /// Records one entry. The same participant may hold several slots.
    pub fn append(&mut self, participant: Pubkey, amount: u64) -> Result<(), RaffleError> {
        let pot_balance = self
            .pot_balance
            .checked_add(amount)
            .ok_or(RaffleError::Overflow)?;
        self.players.push(participant);
        self.pot_balance = pot_balance;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.players.clear();
        self.pot_balance = 0;
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn get(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn pot_balance(&self) -> u64 {
        self.pot_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_entry_order_and_duplicates() {
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let mut ledger = EntryLedger::default();

        ledger.append(alice, 100).unwrap();
        ledger.append(bob, 100).unwrap();
        ledger.append(alice, 100).unwrap();

        assert_eq!(ledger.players(), &[alice, bob, alice]);
        assert_eq!(ledger.pot_balance(), 300);
    }

    #[test]
    fn test_pot_tracks_overpayment() {
        let mut ledger = EntryLedger::default();
        ledger.append(Pubkey::new_unique(), 100).unwrap();
        ledger.append(Pubkey::new_unique(), 250).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pot_balance(), 350);
    }

    #[test]
    fn test_overflow_leaves_ledger_untouched() {
        let mut ledger = EntryLedger::default();
        ledger.append(Pubkey::new_unique(), u64::MAX).unwrap();

        let err = ledger.append(Pubkey::new_unique(), 1).unwrap_err();
        assert_eq!(err, RaffleError::Overflow);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pot_balance(), u64::MAX);
    }

    #[test]
    fn test_reset_clears_players_and_pot() {
        let mut ledger = EntryLedger::default();
        ledger.append(Pubkey::new_unique(), 100).unwrap();
        ledger.reset();

        assert!(ledger.is_empty());
        assert_eq!(ledger.pot_balance(), 0);
        assert_eq!(ledger.get(0), None);
    }
}
