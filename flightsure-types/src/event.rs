use crate::instruction::FlightStatus;
use crate::{Address, Amount, FlightKey, ProposalId};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    AccessGuard,
    AirlineRegistry,
    FlightRegistry,
    InsurancePool,
    OracleConsensus,
}

/// Change record appended by a committed operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    OperationalChanged { operational: bool },

    AirlineProposed { sponsor: Address, candidate: Address, proposal_id: ProposalId },
    AirlineFunded { airline: Address, amount: Amount },
    AirlineVoted { voter: Address, candidate: Address, votes: usize },
    AirlineRegistered { airline: Address, registered_count: usize },

    FlightPublished { flight: FlightKey, airline: Address, designator: String, departure: u64 },

    InsurancePurchased { passenger: Address, flight: FlightKey, amount: Amount },
    PassengerCredited { passenger: Address, flight: FlightKey, amount: Amount },
    EscrowShortfall { airline: Address, flight: FlightKey, amount: Amount },
    Withdrawn { payee: Address, amount: Amount },

    OracleRegistered { oracle: Address, indexes: [u8; 3] },
    OracleRequest { flight: FlightKey, index: u8, requester: Address, opened_at: u64 },
    OracleReport { oracle: Address, flight: FlightKey, status: FlightStatus, index: u8 },
    FlightStatusFinalized { flight: FlightKey, status: FlightStatus },
}

impl LedgerEvent {
    pub fn component(&self) -> Component {
        match self {
            LedgerEvent::OperationalChanged { .. } => Component::AccessGuard,
            LedgerEvent::AirlineProposed { .. }
            | LedgerEvent::AirlineFunded { .. }
            | LedgerEvent::AirlineVoted { .. }
            | LedgerEvent::AirlineRegistered { .. } => Component::AirlineRegistry,
            LedgerEvent::FlightPublished { .. } => Component::FlightRegistry,
            LedgerEvent::InsurancePurchased { .. }
            | LedgerEvent::PassengerCredited { .. }
            | LedgerEvent::EscrowShortfall { .. }
            | LedgerEvent::Withdrawn { .. } => Component::InsurancePool,
            LedgerEvent::OracleRegistered { .. }
            | LedgerEvent::OracleRequest { .. }
            | LedgerEvent::OracleReport { .. }
            | LedgerEvent::FlightStatusFinalized { .. } => Component::OracleConsensus,
        }
    }
}

/// Append-only event log. Readers keep their own cursor (the number of records
/// already seen) and poll with [`EventLog::since`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: LedgerEvent) {
        self.records.push(event);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records appended after `cursor`. A cursor past the end yields nothing.
    pub fn since(&self, cursor: usize) -> &[LedgerEvent] {
        self.records.get(cursor..).unwrap_or(&[])
    }

    pub fn for_component(&self, component: Component) -> impl Iterator<Item = &LedgerEvent> {
        self.records
            .iter()
            .filter(move |event| event.component() == component)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_polling() {
        let mut log = EventLog::default();
        log.push(LedgerEvent::OperationalChanged { operational: false });
        log.push(LedgerEvent::AirlineFunded { airline: [1u8; 32], amount: 5 });

        assert_eq!(log.since(0).len(), 2);
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(2).is_empty());
        assert!(log.since(10).is_empty());

        let registry: Vec<_> = log.for_component(Component::AirlineRegistry).collect();
        assert_eq!(registry.len(), 1);
    }
}
