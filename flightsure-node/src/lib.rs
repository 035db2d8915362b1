pub mod service;
pub mod settlement;
pub mod wallet;

pub use service::{spawn, LedgerHandle, LedgerService, SubmitError};
pub use settlement::{ChannelSettlement, Payout};
pub use wallet::Wallet;
