use crate::{Address, Amount};
use thiserror::Error;

/// Every failure a ledger operation can report. A failed operation never
/// leaves partial state behind, so callers may branch on the variant freely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("caller {} is not the administrator", hex::encode(.0))]
    AccessDenied(Address),
    #[error("ledger is not operational")]
    NotOperational,

    // Airlines
    #[error("airline {} has not provided funding", hex::encode(.0))]
    NotFunded(Address),
    #[error("airline {} is not registered", hex::encode(.0))]
    NotRegistered(Address),
    #[error("unknown airline {}", hex::encode(.0))]
    UnknownAirline(Address),
    #[error("no open proposal for airline {}", hex::encode(.0))]
    UnknownCandidate(Address),
    #[error("airline {} has already been proposed", hex::encode(.0))]
    AlreadyProposed(Address),
    #[error("airline {} is already registered", hex::encode(.0))]
    AlreadyRegistered(Address),
    #[error("funding of {provided} wei is below the minimum of {required} wei")]
    BelowMinimumFund { required: Amount, provided: Amount },
    #[error("airline {} already voted for this candidate", hex::encode(.0))]
    DuplicateVote(Address),
    #[error("consensus not reached: {votes} votes, more than {needed_over} required")]
    ConsensusNotReached { votes: usize, needed_over: usize },

    // Flights
    #[error("flight {} is already registered", hex::encode(.0))]
    DuplicateFlight([u8; 32]),
    #[error("flight {} is not registered", hex::encode(.0))]
    UnknownFlight([u8; 32]),
    #[error("flight {} already has a final status", hex::encode(.0))]
    FlightStatusFinal([u8; 32]),

    // Insurance
    #[error("insurance amount must be greater than zero")]
    InvalidAmount,
    #[error("insurance amount {provided} wei exceeds the cap of {cap} wei")]
    AmountExceedsCap { cap: Amount, provided: Amount },
    #[error("passenger already holds a policy for this flight")]
    DuplicatePolicy,
    #[error("flight {} is not delayed due to the airline", hex::encode(.0))]
    FlightNotLateAirlineFault([u8; 32]),
    #[error("flight {} has already been credited", hex::encode(.0))]
    AlreadyCredited([u8; 32]),
    #[error("ledger holds {available} wei, {required} wei required")]
    InsufficientLedgerBalance { available: Amount, required: Amount },
    #[error("no withdrawable balance")]
    ZeroBalance,
    #[error("settlement transfer failed: {0}")]
    TransferFailure(String),

    // Oracles
    #[error("oracle {} is already registered", hex::encode(.0))]
    OracleAlreadyRegistered(Address),
    #[error("registration fee of {provided} wei is below {required} wei")]
    BelowOracleFee { required: Amount, provided: Amount },
    #[error("oracle {} is not registered", hex::encode(.0))]
    UnknownOracle(Address),
    #[error("a status request for this flight is already open")]
    RequestAlreadyOpen,
    #[error("no open status request for this flight and index")]
    RequestNotOpen,
    #[error("oracle was not assigned index {0} for this request")]
    OracleNotAssignedIndex(u8),
    #[error("oracle {} already responded to this request", hex::encode(.0))]
    DuplicateResponse(Address),
    #[error("invalid flight status code {0}")]
    InvalidStatusCode(u8),

    // Transaction envelope
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },
    #[error("invalid transaction signature")]
    InvalidSignature,
}
