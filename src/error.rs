// Fair Launch Client - Errors
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use thiserror::Error;

use crate::phase::Phase;

/// Precondition failures detected before anything is sent to the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The action is not available in the current phase
    #[error("Action not available during phase {0:?}")]
    WrongPhase(Phase),

    /// The participant has never bid
    #[error("No ticket exists for this wallet")]
    NoTicket,

    /// Grace only allows adjusting an existing ticket
    #[error("New bids cannot be placed during the grace period")]
    NewBidDuringGrace,

    /// Withdrawn tickets cannot be adjusted, punched or refunded
    #[error("Ticket was withdrawn")]
    TicketWithdrawn,

    /// Punched tickets cannot be punched again or withdrawn
    #[error("Ticket was already punched")]
    TicketPunched,

    /// Rug refunds require a punched ticket
    #[error("Ticket has not been punched")]
    TicketNotPunched,

    /// The lottery did not select this ticket
    #[error("Ticket is not a lottery winner")]
    NotAWinner,

    /// Winning tickets are claimed by punching, not withdrawn
    #[error("Winning tickets must be punched instead of withdrawn")]
    WinnerMustPunch,

    /// Bid amount outside the configured price range
    #[error("Bid of {amount} lamports outside range {min}..={max}")]
    BidOutOfRange { amount: u64, min: u64, max: u64 },

    /// Bid amount not aligned with the tick size
    #[error("Bid of {amount} lamports is not a multiple of the {tick_size} lamport tick")]
    BidOffTick { amount: u64, tick_size: u64 },

    /// Projected post-fee balance would go negative
    #[error("Insufficient funds: required {required} lamports, available {available} lamports")]
    InsufficientFunds { required: u64, available: u64 },

    /// The wallet balance was not part of the snapshot
    #[error("Wallet balance unknown")]
    BalanceUnknown,

    /// The raffle has no anti-rug policy
    #[error("Raffle has no anti-rug policy")]
    NoAntiRugPolicy,

    /// The anti-rug refund window has not opened
    #[error("Anti-rug refund available from {available_at}")]
    RefundNotYetAvailable { available_at: UnixTimestamp },

    /// No mint is attached to the raffle
    #[error("No mint configured for this raffle")]
    NoMint,

    /// The mint exists but is not accepting exchanges
    #[error("Mint is not active")]
    MintInactive,

    /// The mint has no items left
    #[error("Mint is sold out")]
    SoldOut,

    /// The winning token was already exchanged
    #[error("Ticket was already claimed")]
    AlreadyClaimed,

    /// The raffle account itself is missing from the snapshot
    #[error("Raffle account not loaded")]
    RaffleNotLoaded,
}

/// Errors that may occur while decoding account snapshots
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Account {account} holds {len} bytes, expected at least {expected}")]
    AccountTooShort { account: &'static str, len: usize, expected: usize },

    #[error("Account {account} has an unexpected discriminator")]
    DiscriminatorMismatch { account: &'static str },

    #[error("Account {account} could not be deserialized: {reason}")]
    Deserialize { account: &'static str, reason: String },

    #[error("Unknown ticket state tag {0}")]
    InvalidTicketState(u8),

    /// A refreshed snapshot moved a ticket out of a terminal state
    #[error("Ticket {ticket} regressed from a terminal state; snapshot is stale")]
    TerminalRegression { ticket: Pubkey },

    #[error("Lottery error: {0}")]
    Lottery(#[from] LotteryError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

/// Guard failures while reading the lottery bitmask
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// The sequence number is not below the raffle's token count
    #[error("Sequence {sequence} outside a raffle of {token_count} tokens")]
    SequenceOutOfRange { sequence: u64, token_count: u64 },

    /// The sequence number maps past the end of the flag bytes
    #[error("Sequence {sequence} maps to byte {byte_index}, bitmask holds {len} bytes")]
    BitmaskTooShort { sequence: u64, byte_index: usize, len: usize },

    #[error("Lottery bitmask holds {0} bytes, shorter than its header")]
    HeaderTooShort(usize),
}

/// Failures reported by the RPC collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The request never reached the cluster
    #[error("Transport error: {0}")]
    Transport(String),

    /// The cluster rejected the transaction before it landed (preflight or sanitize)
    #[error("Transaction rejected: {message}")]
    Rejected { code: Option<u32>, message: String },
}

/// Errors raised when validating a `ClientConfig`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Poll interval must not exceed the transaction timeout")]
    PollIntervalExceedsTimeout,
}
