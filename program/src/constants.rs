// PDA seeds
pub const CONFIG_SEED: &[u8] = b"config";
pub const ROUND_SEED: &[u8] = b"round";

/// Blocks the oracle waits before answering a request
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per settlement; only the first one picks the winner
pub const DEFAULT_NUM_WORDS: u32 = 1;

/// Upper bound on words a single callback may carry
pub const MAX_RANDOM_WORDS: u32 = 16;

/// Largest ledger a round account can be created with through CPI (10 KiB
/// allocation limit, 32 bytes per player slot)
pub const MAX_PLAYERS_CAPACITY: u32 = 300;
