//! Passenger policies, crediting and the payout ledger.
//!
//! Credits move value from the flight airline's escrow into the passenger's
//! payout balance; both stay inside `contract_balance` until withdrawn. The
//! books always satisfy
//! `contract_balance + deficits == escrows + payouts + oracle fees`.

use crate::guard::{require_admin, require_operational};
use flightsure_types::event::LedgerEvent;
use flightsure_types::params::{credit_for, INSURANCE_CAP};
use flightsure_types::state::InsurancePolicy;
use flightsure_types::{Address, Amount, FlightKey, FlightStatus, LedgerError, LedgerState};
use tracing::{debug, info, warn};

/// Moves withdrawn funds out of the ledger. Implemented by whatever settles
/// payments outside the state machine.
pub trait Settlement {
    fn transfer(&mut self, payee: &Address, amount: Amount) -> Result<(), String>;
}

/// Settlement that accepts every transfer and keeps a record of it.
#[derive(Debug, Default, Clone)]
pub struct RecordingSettlement {
    pub transfers: Vec<(Address, Amount)>,
}

impl Settlement for RecordingSettlement {
    fn transfer(&mut self, payee: &Address, amount: Amount) -> Result<(), String> {
        self.transfers.push((*payee, amount));
        Ok(())
    }
}

pub fn buy(state: &mut LedgerState, passenger: &Address, key: &FlightKey, amount: Amount) -> Result<(), LedgerError> {
    require_operational(state)?;
    let flight = state
        .flights
        .get(key)
        .filter(|f| f.registered)
        .ok_or(LedgerError::UnknownFlight(*key))?;
    if flight.status.is_final() {
        return Err(LedgerError::FlightStatusFinal(*key));
    }
    if amount == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if amount > INSURANCE_CAP {
        return Err(LedgerError::AmountExceedsCap {
            cap: INSURANCE_CAP,
            provided: amount,
        });
    }
    if state.policy(passenger, key).is_some() {
        return Err(LedgerError::DuplicatePolicy);
    }

    let airline = flight.airline;
    state.policies.entry(*key).or_default().push(InsurancePolicy {
        passenger: *passenger,
        flight: *key,
        amount,
        credited: false,
        credit: 0,
    });
    if let Some(a) = state.airlines.get_mut(&airline) {
        a.escrow = a.escrow.saturating_add(amount);
    }
    state.contract_balance = state.contract_balance.saturating_add(amount);
    state.events.push(LedgerEvent::InsurancePurchased {
        passenger: *passenger,
        flight: *key,
        amount,
    });
    debug!("Passenger {} insured flight {} for {} wei", hex::encode(passenger), hex::encode(key), amount);
    Ok(())
}

/// Credits every uncredited policy of `key` at 1.5x its premium. Never fails:
/// the airline's escrow covers what it can and any shortfall is advanced
/// from the pooled balance and booked against the airline as a deficit.
pub(crate) fn apply_credit(state: &mut LedgerState, key: &FlightKey) -> usize {
    let Some(airline) = state.flight(key).map(|f| f.airline) else {
        return 0;
    };

    let mut credited = Vec::new();
    if let Some(policies) = state.policies.get_mut(key) {
        for policy in policies.iter_mut().filter(|p| !p.credited) {
            policy.credited = true;
            policy.credit = credit_for(policy.amount);
            credited.push((policy.passenger, policy.credit));
        }
    }

    let mut total: Amount = 0;
    for (passenger, amount) in &credited {
        let balance = state.payouts.entry(*passenger).or_default();
        *balance = balance.saturating_add(*amount);
        total = total.saturating_add(*amount);
        state.events.push(LedgerEvent::PassengerCredited {
            passenger: *passenger,
            flight: *key,
            amount: *amount,
        });
    }

    let mut shortfall = 0;
    if let Some(a) = state.airlines.get_mut(&airline) {
        shortfall = total.saturating_sub(a.escrow);
        a.escrow = a.escrow.saturating_sub(total);
        a.deficit = a.deficit.saturating_add(shortfall);
    }
    if shortfall > 0 {
        state.events.push(LedgerEvent::EscrowShortfall {
            airline,
            flight: *key,
            amount: shortfall,
        });
        warn!(
            "Airline {} escrow short by {} wei crediting flight {}",
            hex::encode(airline),
            shortfall,
            hex::encode(key)
        );
    }
    if let Some(flight) = state.flights.get_mut(key) {
        flight.credited = true;
    }

    info!(
        "Credited {} passengers of flight {} with {} wei",
        credited.len(),
        hex::encode(key),
        total
    );
    credited.len()
}

/// Credits every uncredited policy of a `LateAirline` flight.
pub(crate) fn credit_flight(state: &mut LedgerState, key: &FlightKey) -> Result<usize, LedgerError> {
    let flight = state.flight(key).ok_or(LedgerError::UnknownFlight(*key))?;
    if flight.status != FlightStatus::LateAirline {
        return Err(LedgerError::FlightNotLateAirlineFault(*key));
    }
    if flight.credited {
        return Err(LedgerError::AlreadyCredited(*key));
    }
    Ok(apply_credit(state, key))
}

/// Administrator entry point; oracle finalization credits without it.
pub fn credit(state: &mut LedgerState, caller: &Address, key: &FlightKey) -> Result<usize, LedgerError> {
    require_operational(state)?;
    require_admin(state, caller)?;
    credit_flight(state, key)
}

/// Pays out the caller's whole balance. The balance is zeroed before the
/// settlement transfer runs and restored only if that transfer fails.
pub fn withdraw(
    state: &mut LedgerState,
    caller: &Address,
    settlement: &mut dyn Settlement,
) -> Result<Amount, LedgerError> {
    require_operational(state)?;
    let amount = state.balance_of(caller);
    if amount == 0 {
        return Err(LedgerError::ZeroBalance);
    }
    if amount > state.contract_balance {
        return Err(LedgerError::InsufficientLedgerBalance {
            available: state.contract_balance,
            required: amount,
        });
    }

    state.payouts.remove(caller);
    state.contract_balance = state.contract_balance.saturating_sub(amount);

    if let Err(reason) = settlement.transfer(caller, amount) {
        state.payouts.insert(*caller, amount);
        state.contract_balance = state.contract_balance.saturating_add(amount);
        warn!("Withdrawal of {} wei for {} failed: {}", amount, hex::encode(caller), reason);
        return Err(LedgerError::TransferFailure(reason));
    }

    state.events.push(LedgerEvent::Withdrawn {
        payee: *caller,
        amount,
    });
    info!("Withdrew {} wei to {}", amount, hex::encode(caller));
    Ok(amount)
}
