//! Settlement state machine for the round: `Open -> Settling -> Open`.
//!
//! Every transition works on an in-memory [`Round`] and either returns the
//! event to emit or an error, in which case the round is left exactly as it
//! was. The processor persists the round only after a transition succeeds.

use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    oracle::{winner_index, RandomWord, RandomnessOracle},
    payout::PayoutExecutor,
    state::{Config, RequestId, Round, RoundState},
    upkeep::{self, UpkeepDiagnostics},
};

impl Round {
    /// Records an entry of `amount` lamports for `participant`.
    pub fn enter(
        &mut self,
        config: &Config,
        participant: Pubkey,
        amount: u64,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.state != RoundState::Open {
            return Err(RaffleError::RoundNotOpen);
        }
        if amount < config.entry_fee {
            return Err(RaffleError::InsufficientPayment {
                paid: amount,
                entry_fee: config.entry_fee,
            });
        }
        if self.ledger.len() >= config.max_players as usize {
            return Err(RaffleError::RoundFull);
        }

        self.ledger.append(participant, amount)?;

        Ok(RaffleEvent::EntryRecorded {
            participant,
            amount,
            num_players: self.num_players(),
        })
    }

    /// Read-only upkeep predicate at time `now`.
    pub fn check_upkeep(&self, config: &Config, now: UnixTimestamp) -> UpkeepDiagnostics {
        upkeep::check_upkeep(
            self.status(),
            self.last_settlement_timestamp,
            config.interval,
            self.num_players(),
            self.pot_balance(),
            now,
        )
    }

    /// Starts settlement: re-checks the predicate, then requests randomness.
    /// Players and pot stay in place until the callback pays out.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        config: &Config,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let diagnostics = self.check_upkeep(config, now);
        if !diagnostics.upkeep_needed() {
            return Err(RaffleError::UpkeepNotNeeded {
                pot_balance: self.pot_balance(),
                num_players: self.num_players(),
                state: self.status(),
            });
        }

        let next_nonce = self
            .request_nonce
            .checked_add(1)
            .ok_or(RaffleError::Overflow)?;
        let request_id = oracle.request_randomness(&config.request, self.request_nonce)?;

        self.request_nonce = next_nonce;
        self.state = RoundState::Settling { request_id };

        Ok(RaffleEvent::SettlementRequested { request_id })
    }

    /// Finalizes the round with the oracle's answer to `request_id`.
    ///
    /// The winner is paid before anything else changes; if the payout fails
    /// the round stays settling with the same pending request, so the same
    /// callback can be delivered again.
    pub fn fulfill_randomness<P: PayoutExecutor>(
        &mut self,
        config: &Config,
        caller: &Pubkey,
        request_id: RequestId,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<RaffleEvent, RaffleError> {
        if *caller != config.oracle {
            return Err(RaffleError::UnauthorizedOracle);
        }
        match self.state {
            RoundState::Settling {
                request_id: pending,
            } if pending == request_id => {}
            _ => return Err(RaffleError::UnknownRequest { request_id }),
        }

        let word = random_words
            .first()
            .ok_or(RaffleError::InvalidRandomWords)?;
        let index = winner_index(word, self.num_players()).ok_or(RaffleError::EmptyRound)?;
        let winner = *self
            .ledger
            .get(index as usize)
            .ok_or(RaffleError::EmptyRound)?;
        let prize = self.pot_balance();
        let round_number = self
            .round_number
            .checked_add(1)
            .ok_or(RaffleError::Overflow)?;

        payout.transfer(&winner, prize)?;

        self.recent_winner = Some(winner);
        self.ledger.reset();
        self.last_settlement_timestamp = now;
        self.round_number = round_number;
        self.state = RoundState::Open;

        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            round_number,
        })
    }
}
