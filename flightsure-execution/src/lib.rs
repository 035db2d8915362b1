pub mod airlines;
pub mod flights;
pub mod guard;
pub mod insurance;
pub mod ledger;
pub mod oracles;

pub use insurance::{RecordingSettlement, Settlement};
pub use ledger::Ledger;

use flightsure_crypto::signatures::verify_signature;
use flightsure_types::instruction::LedgerInstruction;
use flightsure_types::{Address, Amount, FlightKey, FlightStatus, LedgerError, LedgerState, ProposalId, Transaction};

pub struct ExecutionContext<'a> {
    pub state: &'a mut LedgerState,
    pub timestamp: u64,
    pub settlement: &'a mut dyn Settlement,
}

/// What a successfully executed instruction produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Done,
    Proposed(ProposalId),
    FlightPublished(FlightKey),
    Credited(usize),
    Withdrawn(Amount),
    OracleRegistered([u8; 3]),
    StatusRequested(u8),
    Response(Option<FlightStatus>),
}

/// Verifies the envelope, consumes the sender's nonce and runs the
/// instruction with the sender as caller.
///
/// The nonce is consumed even if the instruction itself fails, so a signed
/// transaction can never be replayed.
pub fn execute_transaction(tx: &Transaction, ctx: &mut ExecutionContext) -> Result<Receipt, LedgerError> {
    verify_signature(&tx.sender, &tx.signing_bytes(), &tx.signature)
        .map_err(|_| LedgerError::InvalidSignature)?;

    let expected = ctx.state.nonce_of(&tx.sender);
    if tx.nonce != expected {
        return Err(LedgerError::InvalidNonce {
            expected,
            got: tx.nonce,
        });
    }
    ctx.state.nonces.insert(tx.sender, expected + 1);

    execute_instruction(&tx.instruction, &tx.sender, ctx)
}

pub fn execute_instruction(
    instruction: &LedgerInstruction,
    caller: &Address,
    ctx: &mut ExecutionContext,
) -> Result<Receipt, LedgerError> {
    let state = &mut *ctx.state;
    match instruction {
        LedgerInstruction::SetOperational { operational } => {
            guard::set_operational(state, caller, *operational)?;
            Ok(Receipt::Done)
        }
        LedgerInstruction::ProposeAirline { candidate, name } => {
            airlines::propose(state, caller, candidate, name).map(Receipt::Proposed)
        }
        LedgerInstruction::FundAirline { amount } => {
            airlines::fund(state, caller, *amount)?;
            Ok(Receipt::Done)
        }
        LedgerInstruction::VoteAirline { candidate } => {
            airlines::vote(state, caller, candidate)?;
            Ok(Receipt::Done)
        }
        LedgerInstruction::AdmitAirline { candidate } => {
            airlines::admit(state, caller, candidate)?;
            Ok(Receipt::Done)
        }
        LedgerInstruction::PublishFlight { designator, departure } => {
            flights::publish(state, caller, designator, *departure).map(Receipt::FlightPublished)
        }
        LedgerInstruction::BuyInsurance { flight, amount } => {
            insurance::buy(state, caller, flight, *amount)?;
            Ok(Receipt::Done)
        }
        LedgerInstruction::CreditInsurees { flight } => {
            insurance::credit(state, caller, flight).map(Receipt::Credited)
        }
        LedgerInstruction::Withdraw => {
            insurance::withdraw(state, caller, &mut *ctx.settlement).map(Receipt::Withdrawn)
        }
        LedgerInstruction::RegisterOracle { fee } => {
            oracles::register(state, caller, *fee).map(Receipt::OracleRegistered)
        }
        LedgerInstruction::RequestFlightStatus { flight } => {
            oracles::request_status(state, caller, flight, ctx.timestamp).map(Receipt::StatusRequested)
        }
        LedgerInstruction::SubmitOracleResponse { flight, status, index } => {
            oracles::submit_response(state, caller, flight, *status, *index).map(Receipt::Response)
        }
    }
}
