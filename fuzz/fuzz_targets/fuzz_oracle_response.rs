#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flightsure_execution::Ledger;
use flightsure_types::params::{MIN_AIRLINE_FUNDING, ORACLE_QUORUM, ORACLE_REGISTRATION_FEE};
use flightsure_types::state::{Airline, RequestState};
use flightsure_types::{FlightStatus, LedgerState};

const ADMIN: [u8; 32] = [0xAA; 32];
const AIRLINE: [u8; 32] = [0x01; 32];

#[derive(Arbitrary, Debug)]
struct Response {
    oracle: u8,
    status: u8,
    index: u8,
}

#[derive(Arbitrary, Debug)]
struct OracleInput {
    oracles: u8,
    reopen: bool,
    responses: Vec<Response>,
}

fuzz_target!(|data: OracleInput| {
    let mut state = LedgerState::new(ADMIN);
    state.airlines.insert(
        AIRLINE,
        Airline {
            registered: true,
            ..Default::default()
        },
    );
    let mut ledger = Ledger::new(state);
    ledger.fund_airline(&AIRLINE, MIN_AIRLINE_FUNDING).unwrap();
    let key = ledger.publish_flight(&AIRLINE, "FZ2", 7).unwrap();

    let fleet = data.oracles % 40 + 1;
    for n in 0..fleet {
        let indexes = ledger.register_oracle(&[n; 32], ORACLE_REGISTRATION_FEE).unwrap();
        assert!(indexes[0] != indexes[1] && indexes[1] != indexes[2] && indexes[0] != indexes[2]);
    }
    ledger.request_flight_status(&AIRLINE, &key).unwrap();

    let mut finalized = None;
    for response in data.responses.iter().take(128) {
        let oracle = [response.oracle % (fleet + 2); 32];
        let result = ledger.submit_oracle_response(&oracle, &key, response.status, response.index);

        if let Ok(Some(status)) = result {
            assert!(finalized.is_none());
            assert!(status.is_final());
            finalized = Some(status);
        }
        if finalized.is_some() {
            // A finalized flight never accepts another report.
            assert!(result.is_err() || matches!(result, Ok(Some(_))));
        }
        if data.reopen && finalized.is_some() {
            assert!(ledger.request_flight_status(&AIRLINE, &key).is_err());
        }
    }

    let request = &ledger.state().requests[&key];
    match finalized {
        Some(status) => {
            assert_eq!(request.state, RequestState::Finalized(status));
            assert_eq!(ledger.flight_status(&key), status);
            assert!(request.responses[&status].len() >= ORACLE_QUORUM);
        }
        None => {
            assert!(request.is_open());
            assert_eq!(ledger.flight_status(&key), FlightStatus::Unknown);
            assert!(request.responses.values().all(|set| set.len() < ORACLE_QUORUM));
        }
    }
});
