//! Oracle registration and per-flight status consensus.
//!
//! A flight moves `NoRequest → Open → Finalized`. A request is opened with a
//! sampling index; only oracles holding that index may answer, each at most
//! once. The first status code reported by [`ORACLE_QUORUM`] distinct oracles
//! becomes the flight's final status.

use crate::guard::require_operational;
use crate::insurance;
use flightsure_crypto::keys::{distinct_indexes, sample_index};
use flightsure_types::event::LedgerEvent;
use flightsure_types::params::{ORACLE_INDEX_RANGE, ORACLE_QUORUM, ORACLE_REGISTRATION_FEE};
use flightsure_types::state::{Oracle, OracleRequest, RequestState};
use flightsure_types::{Address, Amount, FlightKey, FlightStatus, LedgerError, LedgerState};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub fn register(state: &mut LedgerState, oracle: &Address, fee: Amount) -> Result<[u8; 3], LedgerError> {
    require_operational(state)?;
    if state.oracles.contains_key(oracle) {
        return Err(LedgerError::OracleAlreadyRegistered(*oracle));
    }
    if fee < ORACLE_REGISTRATION_FEE {
        return Err(LedgerError::BelowOracleFee {
            required: ORACLE_REGISTRATION_FEE,
            provided: fee,
        });
    }

    let indexes = distinct_indexes(oracle, &mut state.index_nonce, ORACLE_INDEX_RANGE);
    state.oracles.insert(*oracle, Oracle { indexes });
    state.contract_balance = state.contract_balance.saturating_add(fee);
    state.events.push(LedgerEvent::OracleRegistered {
        oracle: *oracle,
        indexes,
    });
    debug!("Oracle {} registered with indexes {:?}", hex::encode(oracle), indexes);
    Ok(indexes)
}

/// Opens a status request and returns the sampling index oracles must answer
/// with. Delivery of the request to oracles happens off-ledger via the
/// emitted `OracleRequest` event.
pub fn request_status(
    state: &mut LedgerState,
    requester: &Address,
    key: &FlightKey,
    timestamp: u64,
) -> Result<u8, LedgerError> {
    require_operational(state)?;
    let flight = state.flight(key).ok_or(LedgerError::UnknownFlight(*key))?;
    if flight.status.is_final() {
        return Err(LedgerError::FlightStatusFinal(*key));
    }
    if state.requests.get(key).is_some_and(OracleRequest::is_open) {
        return Err(LedgerError::RequestAlreadyOpen);
    }

    let index = sample_index(requester, state.index_nonce, ORACLE_INDEX_RANGE);
    state.index_nonce = state.index_nonce.wrapping_add(1);
    state.requests.insert(
        *key,
        OracleRequest {
            index,
            requester: *requester,
            opened_at: timestamp,
            state: RequestState::Open,
            responses: BTreeMap::new(),
        },
    );
    state.events.push(LedgerEvent::OracleRequest {
        flight: *key,
        index,
        requester: *requester,
        opened_at: timestamp,
    });
    debug!("Status request opened for flight {} with index {}", hex::encode(key), index);
    Ok(index)
}

/// Records one oracle report. Returns the final status when this report
/// completes the quorum.
pub fn submit_response(
    state: &mut LedgerState,
    oracle: &Address,
    key: &FlightKey,
    code: u8,
    index: u8,
) -> Result<Option<FlightStatus>, LedgerError> {
    require_operational(state)?;
    let status = FlightStatus::try_from(code)?;
    if !status.is_final() {
        return Err(LedgerError::InvalidStatusCode(code));
    }

    let request = state
        .requests
        .get(key)
        .filter(|r| r.is_open())
        .ok_or(LedgerError::RequestNotOpen)?;
    let assigned = state
        .oracles
        .get(oracle)
        .ok_or(LedgerError::UnknownOracle(*oracle))?;
    if !assigned.holds(index) {
        return Err(LedgerError::OracleNotAssignedIndex(index));
    }
    if request.index != index {
        return Err(LedgerError::RequestNotOpen);
    }
    if request.has_responded(oracle) {
        return Err(LedgerError::DuplicateResponse(*oracle));
    }

    let matching = request.responses.get(&status).map_or(0, |set| set.len()) + 1;
    let finalized = matching >= ORACLE_QUORUM;

    if let Some(request) = state.requests.get_mut(key) {
        request.responses.entry(status).or_default().insert(*oracle);
        if finalized {
            request.state = RequestState::Finalized(status);
        }
    }
    state.events.push(LedgerEvent::OracleReport {
        oracle: *oracle,
        flight: *key,
        status,
        index,
    });

    if !finalized {
        return Ok(None);
    }

    if let Some(flight) = state.flights.get_mut(key) {
        flight.status = status;
    }
    state.events.push(LedgerEvent::FlightStatusFinalized { flight: *key, status });
    info!("Flight {} finalized as {:?}", hex::encode(key), status);

    let uncredited = state.flight(key).is_some_and(|f| !f.credited);
    if status == FlightStatus::LateAirline && uncredited {
        insurance::apply_credit(state, key);
    }
    Ok(Some(status))
}
