#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flightsure_execution::Ledger;
use flightsure_types::params::{INSURANCE_CAP, MIN_AIRLINE_FUNDING, ORACLE_REGISTRATION_FEE};
use flightsure_types::state::Airline;
use flightsure_types::{Amount, FlightKey, FlightStatus, LedgerState};

const ADMIN: [u8; 32] = [0xAA; 32];
const AIRLINE: [u8; 32] = [0x01; 32];
const ORACLES: u8 = 30;

#[derive(Arbitrary, Debug)]
enum Op {
    Buy { passenger: u8, flight: u8, amount: u64 },
    MarkLate { flight: u8 },
    Credit { flight: u8 },
    Withdraw { passenger: u8 },
    Pause(bool),
}

#[derive(Arbitrary, Debug)]
struct InsuranceInput {
    extra_funding: u64,
    ops: Vec<Op>,
}

fuzz_target!(|data: InsuranceInput| {
    let mut state = LedgerState::new(ADMIN);
    state.airlines.insert(
        AIRLINE,
        Airline {
            registered: true,
            ..Default::default()
        },
    );
    let mut ledger = Ledger::new(state);
    let funding = MIN_AIRLINE_FUNDING + Amount::from(data.extra_funding);
    ledger.fund_airline(&AIRLINE, funding).unwrap();

    let flights: Vec<_> = (0..4u64)
        .map(|n| ledger.publish_flight(&AIRLINE, "FZ1", n).unwrap())
        .collect();
    for n in 0..ORACLES {
        ledger.register_oracle(&[0x80 + n; 32], ORACLE_REGISTRATION_FEE).unwrap();
    }
    let fees = ORACLE_REGISTRATION_FEE * Amount::from(ORACLES);
    let passenger = |p: u8| [p % 8 + 0x10; 32];

    for op in data.ops.iter().take(64) {
        match op {
            Op::Buy { passenger: p, flight, amount } => {
                let key = flights[*flight as usize % flights.len()];
                let amount = Amount::from(*amount) * 1_000_000 % (INSURANCE_CAP + 2);
                let _ = ledger.buy_insurance(&passenger(*p), &key, amount);
            }
            Op::MarkLate { flight } => {
                let key = flights[*flight as usize % flights.len()];
                settle_late(&mut ledger, &key);
            }
            Op::Credit { flight } => {
                let key = flights[*flight as usize % flights.len()];
                let _ = ledger.credit_insurees(&ADMIN, &key);
            }
            Op::Withdraw { passenger: p } => {
                let _ = ledger.withdraw(&passenger(*p));
            }
            Op::Pause(paused) => {
                let _ = ledger.set_operational(&ADMIN, !paused);
            }
        }

        // Escrow shortfalls are advanced from the pool and booked as deficit.
        let state = ledger.state();
        let escrow: Amount = state.airlines.values().map(|a| a.escrow).sum();
        let deficit: Amount = state.airlines.values().map(|a| a.deficit).sum();
        let owed: Amount = state.payouts.values().sum();
        assert_eq!(state.contract_balance + deficit, escrow + owed + fees);
        for policies in state.policies.values() {
            for policy in policies {
                assert!(policy.amount > 0 && policy.amount <= INSURANCE_CAP);
            }
        }
    }

    let paid: Amount = ledger.settlement().transfers.iter().map(|(_, a)| a).sum();
    assert_eq!(ledger.contract_balance() + paid, funding + fees + premiums(&ledger));
});

/// Drives the oracle quorum to a `LateAirline` verdict for `key`.
fn settle_late(ledger: &mut Ledger, key: &FlightKey) {
    let Ok(index) = ledger.request_flight_status(&AIRLINE, key) else {
        return;
    };
    for n in 0..ORACLES {
        let oracle = [0x80 + n; 32];
        if !ledger.oracle_indexes(&oracle).is_some_and(|i| i.contains(&index)) {
            continue;
        }
        match ledger.submit_oracle_response(&oracle, key, FlightStatus::LateAirline.code(), index) {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) => {}
        }
    }
}

fn premiums(ledger: &Ledger) -> Amount {
    ledger
        .state()
        .policies
        .values()
        .flatten()
        .map(|p| p.amount)
        .sum()
}
