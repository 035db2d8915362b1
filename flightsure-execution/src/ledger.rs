use crate::insurance::{RecordingSettlement, Settlement};
use crate::{airlines, flights, guard, insurance, oracles};
use flightsure_types::event::LedgerEvent;
use flightsure_types::state::Flight;
use flightsure_types::{Address, Amount, FlightKey, FlightStatus, LedgerError, LedgerState, ProposalId};

/// The ledger as one owned value: state plus the settlement collaborator used
/// by withdrawals. Every method maps to one public operation.
pub struct Ledger<S: Settlement = RecordingSettlement> {
    pub(crate) state: LedgerState,
    settlement: S,
    timestamp: u64,
}

impl Ledger<RecordingSettlement> {
    pub fn new(state: LedgerState) -> Self {
        Self::with_settlement(state, RecordingSettlement::default())
    }
}

impl<S: Settlement> Ledger<S> {
    pub fn with_settlement(state: LedgerState, settlement: S) -> Self {
        Self {
            state,
            settlement,
            timestamp: 0,
        }
    }

    /// Timestamp recorded on status requests opened from now on.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    pub fn into_parts(self) -> (LedgerState, S) {
        (self.state, self.settlement)
    }

    pub fn events_since(&self, cursor: usize) -> &[LedgerEvent] {
        self.state.events.since(cursor)
    }

    // === Access Guard ===

    pub fn is_operational(&self) -> bool {
        guard::is_operational(&self.state)
    }

    pub fn set_operational(&mut self, caller: &Address, operational: bool) -> Result<(), LedgerError> {
        guard::set_operational(&mut self.state, caller, operational)
    }

    // === Airlines ===

    pub fn propose_airline(&mut self, sponsor: &Address, candidate: &Address, name: &str) -> Result<ProposalId, LedgerError> {
        airlines::propose(&mut self.state, sponsor, candidate, name)
    }

    pub fn fund_airline(&mut self, caller: &Address, amount: Amount) -> Result<(), LedgerError> {
        airlines::fund(&mut self.state, caller, amount)
    }

    pub fn vote_airline(&mut self, voter: &Address, candidate: &Address) -> Result<(), LedgerError> {
        airlines::vote(&mut self.state, voter, candidate)
    }

    pub fn admit_airline(&mut self, caller: &Address, candidate: &Address) -> Result<(), LedgerError> {
        airlines::admit(&mut self.state, caller, candidate)
    }

    pub fn registered_airline_count(&self) -> usize {
        airlines::count(&self.state)
    }

    // === Flights ===

    pub fn publish_flight(&mut self, airline: &Address, designator: &str, departure: u64) -> Result<FlightKey, LedgerError> {
        flights::publish(&mut self.state, airline, designator, departure)
    }

    pub fn flight_info(&self, key: &FlightKey) -> Option<&Flight> {
        flights::lookup(&self.state, key)
    }

    pub fn flights(&self) -> impl Iterator<Item = &FlightKey> + '_ {
        flights::list_all(&self.state)
    }

    pub fn flight_status(&self, key: &FlightKey) -> FlightStatus {
        self.state.flight_status(key)
    }

    // === Insurance ===

    pub fn buy_insurance(&mut self, passenger: &Address, key: &FlightKey, amount: Amount) -> Result<(), LedgerError> {
        insurance::buy(&mut self.state, passenger, key, amount)
    }

    pub fn credit_insurees(&mut self, caller: &Address, key: &FlightKey) -> Result<usize, LedgerError> {
        insurance::credit(&mut self.state, caller, key)
    }

    pub fn withdraw(&mut self, caller: &Address) -> Result<Amount, LedgerError> {
        insurance::withdraw(&mut self.state, caller, &mut self.settlement)
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.state.balance_of(address)
    }

    pub fn contract_balance(&self) -> Amount {
        self.state.contract_balance
    }

    // === Oracles ===

    pub fn register_oracle(&mut self, oracle: &Address, fee: Amount) -> Result<[u8; 3], LedgerError> {
        oracles::register(&mut self.state, oracle, fee)
    }

    pub fn oracle_indexes(&self, oracle: &Address) -> Option<[u8; 3]> {
        self.state.oracle_indexes(oracle)
    }

    pub fn request_flight_status(&mut self, requester: &Address, key: &FlightKey) -> Result<u8, LedgerError> {
        oracles::request_status(&mut self.state, requester, key, self.timestamp)
    }

    pub fn submit_oracle_response(
        &mut self,
        oracle: &Address,
        key: &FlightKey,
        status: u8,
        index: u8,
    ) -> Result<Option<FlightStatus>, LedgerError> {
        oracles::submit_response(&mut self.state, oracle, key, status, index)
    }
}
