// Fair Launch Client
// Client core for fair launch raffles: phase and ticket derivation, lottery
// lookup, and the bid, punch, withdraw, refund and mint transactions

// Account data
pub mod error;
pub mod snapshot;
pub mod state;
pub mod utils;

// Pure derivations
pub mod lottery;
pub mod phase;
pub mod ticket;

// Transactions
pub mod classify;
pub mod config;
pub mod confirmation;
pub mod instruction;
pub mod orchestrator;
pub mod rpc;

pub use classify::ErrorKind;
pub use config::ClientConfig;
pub use orchestrator::{Operation, Outcome, TransactionOrchestrator};
pub use phase::Phase;
pub use snapshot::AccountSnapshot;
pub use ticket::{TicketLedger, TicketStatus};
