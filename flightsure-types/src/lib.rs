pub mod error;
pub mod event;
pub mod instruction;
pub mod params;
pub mod state;
pub mod transaction;

pub use error::LedgerError;
pub use event::{Component, EventLog, LedgerEvent};
pub use instruction::{FlightStatus, LedgerInstruction};
pub use state::LedgerState;
pub use transaction::Transaction;

/// 32-byte account identity (an ed25519 verifying key at the transaction layer).
pub type Address = [u8; 32];

/// Amounts are denominated in wei.
pub type Amount = u128;

/// blake3(airline ‖ designator ‖ departure).
pub type FlightKey = [u8; 32];

pub type ProposalId = u64;
