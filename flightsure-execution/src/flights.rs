use crate::airlines::require_active;
use crate::guard::require_operational;
use flightsure_crypto::keys::flight_key;
use flightsure_types::event::LedgerEvent;
use flightsure_types::state::Flight;
use flightsure_types::{Address, FlightKey, FlightStatus, LedgerError, LedgerState};
use tracing::debug;

pub fn publish(
    state: &mut LedgerState,
    airline: &Address,
    designator: &str,
    departure: u64,
) -> Result<FlightKey, LedgerError> {
    require_operational(state)?;
    require_active(state, airline)?;
    let key = flight_key(airline, designator, departure);
    if state.flights.contains_key(&key) {
        return Err(LedgerError::DuplicateFlight(key));
    }

    state.flights.insert(
        key,
        Flight {
            airline: *airline,
            designator: designator.to_string(),
            departure,
            status: FlightStatus::Unknown,
            registered: true,
            credited: false,
        },
    );
    state.flight_order.push(key);
    state.events.push(LedgerEvent::FlightPublished {
        flight: key,
        airline: *airline,
        designator: designator.to_string(),
        departure,
    });
    debug!("Flight {} published as {}", designator, hex::encode(key));
    Ok(key)
}

pub fn lookup<'a>(state: &'a LedgerState, key: &FlightKey) -> Option<&'a Flight> {
    state.flight(key)
}

/// Flight keys in publication order. Lazy; call again to restart.
pub fn list_all(state: &LedgerState) -> impl Iterator<Item = &FlightKey> + '_ {
    state.flight_keys()
}
