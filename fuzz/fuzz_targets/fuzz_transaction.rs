#![no_main]

use libfuzzer_sys::fuzz_target;

use flightsure_execution::{execute_transaction, ExecutionContext, RecordingSettlement};
use flightsure_types::{LedgerState, Transaction};

fuzz_target!(|data: &[u8]| {
    let Ok(tx) = bincode::deserialize::<Transaction>(data) else {
        return;
    };

    let mut state = LedgerState::new([0xAA; 32]);
    let mut settlement = RecordingSettlement::default();
    let mut ctx = ExecutionContext {
        state: &mut state,
        timestamp: 1,
        settlement: &mut settlement,
    };

    // A rejected transaction leaves no events behind.
    if execute_transaction(&tx, &mut ctx).is_err() {
        assert!(state.events.is_empty());
    }
});
