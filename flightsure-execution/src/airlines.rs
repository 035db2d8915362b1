//! Airline lifecycle: proposal, funding and admission.
//!
//! The first [`CONSENSUS_THRESHOLD`] registrations need no vote. After that a
//! candidate is admitted only when strictly more than half of the active
//! (registered and funded) airlines have voted for it. Unfunded members can
//! not vote, so they do not count towards the threshold either.

use crate::guard::require_operational;
use flightsure_types::event::LedgerEvent;
use flightsure_types::params::{CONSENSUS_THRESHOLD, MIN_AIRLINE_FUNDING};
use flightsure_types::state::Airline;
use flightsure_types::{Address, Amount, LedgerError, LedgerState, ProposalId};
use tracing::{debug, info};

/// Registered and funded, i.e. allowed to sponsor, vote and publish flights.
pub(crate) fn require_active<'a>(state: &'a LedgerState, address: &Address) -> Result<&'a Airline, LedgerError> {
    let airline = state
        .airlines
        .get(address)
        .ok_or(LedgerError::NotRegistered(*address))?;
    if !airline.registered {
        return Err(LedgerError::NotRegistered(*address));
    }
    if !airline.funded {
        return Err(LedgerError::NotFunded(*address));
    }
    Ok(airline)
}

pub fn propose(
    state: &mut LedgerState,
    sponsor: &Address,
    candidate: &Address,
    name: &str,
) -> Result<ProposalId, LedgerError> {
    require_operational(state)?;
    require_active(state, sponsor)?;
    if let Some(existing) = state.airlines.get(candidate) {
        return Err(if existing.registered {
            LedgerError::AlreadyRegistered(*candidate)
        } else {
            LedgerError::AlreadyProposed(*candidate)
        });
    }

    let proposal_id = state.proposals.len() as ProposalId;
    state.proposals.push(*candidate);
    state.airlines.insert(
        *candidate,
        Airline {
            name: name.to_string(),
            proposal_id: Some(proposal_id),
            ..Default::default()
        },
    );
    state.events.push(LedgerEvent::AirlineProposed {
        sponsor: *sponsor,
        candidate: *candidate,
        proposal_id,
    });
    debug!("Airline {} proposed as #{} ({})", hex::encode(candidate), proposal_id, name);
    Ok(proposal_id)
}

/// Escrows `amount` for the caller. Funding again is allowed; it repays any
/// outstanding deficit before adding to the escrow.
pub fn fund(state: &mut LedgerState, caller: &Address, amount: Amount) -> Result<(), LedgerError> {
    require_operational(state)?;
    if !state.airlines.contains_key(caller) {
        return Err(LedgerError::UnknownAirline(*caller));
    }
    if amount < MIN_AIRLINE_FUNDING {
        return Err(LedgerError::BelowMinimumFund {
            required: MIN_AIRLINE_FUNDING,
            provided: amount,
        });
    }

    if let Some(airline) = state.airlines.get_mut(caller) {
        let repaid = amount.min(airline.deficit);
        airline.funded = true;
        airline.deficit -= repaid;
        airline.escrow = airline.escrow.saturating_add(amount - repaid);
    }
    state.contract_balance = state.contract_balance.saturating_add(amount);
    state.events.push(LedgerEvent::AirlineFunded {
        airline: *caller,
        amount,
    });
    info!("Airline {} funded with {} wei", hex::encode(caller), amount);
    Ok(())
}

pub fn vote(state: &mut LedgerState, voter: &Address, candidate: &Address) -> Result<(), LedgerError> {
    require_operational(state)?;
    require_active(state, voter)?;
    let target = state
        .airlines
        .get(candidate)
        .ok_or(LedgerError::UnknownCandidate(*candidate))?;
    if target.registered {
        return Err(LedgerError::AlreadyRegistered(*candidate));
    }
    if target.voters.contains(voter) {
        return Err(LedgerError::DuplicateVote(*voter));
    }

    let votes = match state.airlines.get_mut(candidate) {
        Some(target) => {
            target.voters.insert(*voter);
            target.voters.len()
        }
        None => return Err(LedgerError::UnknownCandidate(*candidate)),
    };
    state.events.push(LedgerEvent::AirlineVoted {
        voter: *voter,
        candidate: *candidate,
        votes,
    });
    debug!("Vote {} for airline {}", votes, hex::encode(candidate));
    Ok(())
}

pub fn admit(state: &mut LedgerState, caller: &Address, candidate: &Address) -> Result<(), LedgerError> {
    require_operational(state)?;
    require_active(state, caller)?;
    let registered = state.registered_airline_count();
    let target = state
        .airlines
        .get(candidate)
        .ok_or(LedgerError::UnknownCandidate(*candidate))?;
    if target.registered {
        return Err(LedgerError::AlreadyRegistered(*candidate));
    }

    if registered >= CONSENSUS_THRESHOLD {
        let electorate = state.active_airline_count();
        let votes = target.voters.len();
        if votes * 2 <= electorate {
            return Err(LedgerError::ConsensusNotReached {
                votes,
                needed_over: electorate / 2,
            });
        }
    }

    if let Some(target) = state.airlines.get_mut(candidate) {
        target.registered = true;
        target.voters.clear();
    }
    let registered_count = registered + 1;
    state.events.push(LedgerEvent::AirlineRegistered {
        airline: *candidate,
        registered_count,
    });
    info!(
        "Airline {} registered ({} registered airlines)",
        hex::encode(candidate),
        registered_count
    );
    Ok(())
}

pub fn count(state: &LedgerState) -> usize {
    state.registered_airline_count()
}
