use crate::event::EventLog;
use crate::instruction::FlightStatus;
use crate::{Address, Amount, FlightKey, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Airline {
    pub name: String,
    pub registered: bool,
    pub funded: bool,
    /// Funding plus premiums on this airline's flights, minus credits paid out.
    pub escrow: Amount,
    /// Credits paid from the pooled balance because escrow ran out. Settled
    /// first by later funding.
    pub deficit: Amount,
    pub voters: BTreeSet<Address>,
    pub proposal_id: Option<ProposalId>,
}

impl Airline {
    /// Registered and funded: allowed to sponsor, vote and publish flights.
    pub fn is_active(&self) -> bool {
        self.registered && self.funded
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Flight {
    pub airline: Address,
    pub designator: String,
    pub departure: u64,
    pub status: FlightStatus,
    pub registered: bool,
    pub credited: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsurancePolicy {
    pub passenger: Address,
    pub flight: FlightKey,
    pub amount: Amount,
    pub credited: bool,
    pub credit: Amount,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Oracle {
    pub indexes: [u8; 3],
}

impl Oracle {
    pub fn holds(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Open,
    Finalized(FlightStatus),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OracleRequest {
    pub index: u8,
    pub requester: Address,
    pub opened_at: u64,
    pub state: RequestState,
    pub responses: BTreeMap<FlightStatus, BTreeSet<Address>>,
}

impl OracleRequest {
    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    pub fn has_responded(&self, oracle: &Address) -> bool {
        self.responses.values().any(|set| set.contains(oracle))
    }
}

/// The whole ledger. Every operation takes this aggregate by `&mut`; there is
/// no other shared state.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LedgerState {
    // === Access Guard ===
    pub operational: bool,
    pub admin: Address,

    /// Everything held by the ledger: airline escrow, oracle fees and
    /// uncollected payouts.
    pub contract_balance: Amount,
    pub index_nonce: u64,
    pub nonces: HashMap<Address, u64>,

    // === Airlines ===
    pub airlines: HashMap<Address, Airline>,
    /// Proposal id → candidate, in proposal order.
    pub proposals: Vec<Address>,

    // === Flights ===
    pub flights: HashMap<FlightKey, Flight>,
    pub flight_order: Vec<FlightKey>,

    // === Insurance ===
    pub policies: HashMap<FlightKey, Vec<InsurancePolicy>>,
    pub payouts: HashMap<Address, Amount>,

    // === Oracles ===
    pub oracles: HashMap<Address, Oracle>,
    pub requests: HashMap<FlightKey, OracleRequest>,

    pub events: EventLog,
}

impl LedgerState {
    pub fn new(admin: Address) -> Self {
        Self {
            operational: true,
            admin,
            ..Default::default()
        }
    }

    pub fn registered_airline_count(&self) -> usize {
        self.airlines.values().filter(|a| a.registered).count()
    }

    /// Airlines allowed to vote: registered and funded.
    pub fn active_airline_count(&self) -> usize {
        self.airlines.values().filter(|a| a.is_active()).count()
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    pub fn is_airline_registered(&self, address: &Address) -> bool {
        self.airlines.get(address).is_some_and(|a| a.registered)
    }

    pub fn is_airline_funded(&self, address: &Address) -> bool {
        self.airlines.get(address).is_some_and(|a| a.funded)
    }

    /// Candidates that were proposed but not yet admitted, in proposal order.
    pub fn pending_proposals(&self) -> Vec<(ProposalId, Address)> {
        self.proposals
            .iter()
            .enumerate()
            .filter(|(_, candidate)| !self.is_airline_registered(candidate))
            .map(|(id, candidate)| (id as ProposalId, *candidate))
            .collect()
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub fn flight_status(&self, key: &FlightKey) -> FlightStatus {
        self.flights
            .get(key)
            .map(|f| f.status)
            .unwrap_or_default()
    }

    /// Published flight keys in publication order. Each call starts over.
    pub fn flight_keys(&self) -> impl Iterator<Item = &FlightKey> + '_ {
        self.flight_order.iter()
    }

    pub fn policies_for(&self, key: &FlightKey) -> &[InsurancePolicy] {
        self.policies.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn policy(&self, passenger: &Address, key: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies_for(key)
            .iter()
            .find(|p| &p.passenger == passenger)
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.payouts.get(address).copied().unwrap_or(0)
    }

    pub fn oracle_indexes(&self, oracle: &Address) -> Option<[u8; 3]> {
        self.oracles.get(oracle).map(|o| o.indexes)
    }

    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or(0)
    }
}
