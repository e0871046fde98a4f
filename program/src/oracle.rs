// Randomness oracle client: request side plus winner selection from the delivered words
use arrayref::array_ref;
use solana_program::{keccak, log::sol_log_data, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    state::{RequestId, RequestParams},
};

/// One random word as delivered by the oracle: a 256-bit little-endian integer
pub type RandomWord = [u8; 32];

/// Request half of the oracle's request/callback protocol. The callback half
/// is the `FulfillRandomness` instruction.
pub trait RandomnessOracle {
    /// Issues a request and returns the id the callback will carry.
    /// `nonce` makes consecutive requests from the same consumer distinct.
    fn request_randomness(
        &mut self,
        params: &RequestParams,
        nonce: u64,
    ) -> Result<RequestId, RaffleError>;
}

/// On-chain oracle client: publishes the request in the program log, where
/// the oracle node watching this program picks it up and later answers with
/// a signed `FulfillRandomness`.
pub struct CoordinatorOracle {
    consumer: Pubkey,
}

impl CoordinatorOracle {
    /// `consumer` is the round account the randomness is for
    pub fn new(consumer: Pubkey) -> Self {
        Self { consumer }
    }
}

impl RandomnessOracle for CoordinatorOracle {
    fn request_randomness(
        &mut self,
        params: &RequestParams,
        nonce: u64,
    ) -> Result<RequestId, RaffleError> {
        let request_id = derive_request_id(params, &self.consumer, nonce);

        msg!(
            "Randomness requested: id={}, subscription={}, confirmations={}, compute_limit={}, words={}",
            request_id,
            params.subscription_id,
            params.request_confirmations,
            params.callback_compute_limit,
            params.num_words
        );
        sol_log_data(&[
            b"randomness_request".as_ref(),
            &request_id.to_le_bytes(),
            self.consumer.as_ref(),
            &params.key_hash,
            &params.subscription_id.to_le_bytes(),
            &params.request_confirmations.to_le_bytes(),
            &params.callback_compute_limit.to_le_bytes(),
            &params.num_words.to_le_bytes(),
        ]);

        Ok(request_id)
    }
}

/// Request id as the oracle computes it: the first 8 bytes of
/// keccak(key_hash || consumer || subscription_id || nonce).
pub fn derive_request_id(params: &RequestParams, consumer: &Pubkey, nonce: u64) -> RequestId {
    let hash = keccak::hashv(&[
        params.key_hash.as_ref(),
        consumer.as_ref(),
        &params.subscription_id.to_le_bytes(),
        &nonce.to_le_bytes(),
    ]);
    let bytes = hash.to_bytes();
    u64::from_le_bytes(*array_ref![bytes, 0, 8])
}

/// Picks a ledger slot: `word mod num_players` over the full 256-bit word.
///
/// Plain modulo is slightly biased towards low slots when `num_players` does
/// not divide 2^256; the bias is accepted and not corrected.
pub fn winner_index(word: &RandomWord, num_players: u64) -> Option<u64> {
    if num_players == 0 {
        return None;
    }

    // Horner's rule from the most significant byte down.
    let modulus = num_players as u128;
    let remainder = word
        .iter()
        .rev()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);

    Some(remainder as u64)
}

/// Widens a u64 into a random word (little-endian, upper bytes zero)
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[..8].copy_from_slice(&value.to_le_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RequestParams {
        RequestParams::new([9u8; 32], 588, 500_000)
    }

    #[test]
    fn test_small_word_is_plain_modulo() {
        assert_eq!(winner_index(&word_from_u64(7), 3), Some(1));
        assert_eq!(winner_index(&word_from_u64(9), 3), Some(0));
        assert_eq!(winner_index(&word_from_u64(5), 1), Some(0));
    }

    #[test]
    fn test_no_players_has_no_winner() {
        assert_eq!(winner_index(&word_from_u64(7), 0), None);
    }

    #[test]
    fn test_uses_all_256_bits() {
        // 2^64 mod 3 == 1, which a reduction over the low 8 bytes would miss.
        let mut word = [0u8; 32];
        word[8] = 1;
        assert_eq!(winner_index(&word, 3), Some(1));

        // 2^256 - 1 mod 10 == 5
        assert_eq!(winner_index(&[0xff; 32], 10), Some(5));
    }

    #[test]
    fn test_request_id_depends_on_nonce_and_consumer() {
        let consumer = Pubkey::new_unique();
        let first = derive_request_id(&params(), &consumer, 0);

        assert_eq!(first, derive_request_id(&params(), &consumer, 0));
        assert_ne!(first, derive_request_id(&params(), &consumer, 1));
        assert_ne!(first, derive_request_id(&params(), &Pubkey::new_unique(), 0));
    }

    #[test]
    fn test_coordinator_returns_derived_id() {
        let consumer = Pubkey::new_unique();
        let mut oracle = CoordinatorOracle::new(consumer);

        let request_id = oracle.request_randomness(&params(), 4).unwrap();
        assert_eq!(request_id, derive_request_id(&params(), &consumer, 4));
    }
}
