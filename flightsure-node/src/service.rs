//! Single-writer ledger service.
//!
//! All mutations go through one command queue and are applied one at a time
//! under the state write lock, so every transaction sees the committed result
//! of the one before it. Readers only ever take the read lock.

use flightsure_execution::{execute_transaction, ExecutionContext, Receipt, Settlement};
use flightsure_types::event::LedgerEvent;
use flightsure_types::{Address, Amount, FlightKey, FlightStatus, LedgerError, LedgerState, Transaction};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SubmitError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("ledger service stopped")]
    ServiceStopped,
}

struct Command {
    tx: Transaction,
    reply: oneshot::Sender<Result<Receipt, LedgerError>>,
}

pub struct LedgerService<S> {
    state: Arc<RwLock<LedgerState>>,
    settlement: S,
    command_rx: mpsc::Receiver<Command>,
    event_tx: broadcast::Sender<LedgerEvent>,
}

impl<S: Settlement + Send + 'static> LedgerService<S> {
    pub async fn run(mut self) {
        info!("Starting ledger service...");

        while let Some(Command { tx, reply }) = self.command_rx.recv().await {
            let timestamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);

            let result = {
                let mut guard = self.state.write().await;
                let cursor = guard.events.len();
                let mut ctx = ExecutionContext {
                    state: &mut *guard,
                    timestamp,
                    settlement: &mut self.settlement,
                };
                let result = execute_transaction(&tx, &mut ctx);

                // Lagging or absent subscribers never hold up the writer.
                for event in guard.events.since(cursor) {
                    let _ = self.event_tx.send(event.clone());
                }
                result
            };

            match &result {
                Ok(receipt) => debug!("Tx {} applied: {:?}", hex::encode(tx.id()), receipt),
                Err(e) => warn!("Tx {} rejected: {}", hex::encode(tx.id()), e),
            }
            let _ = reply.send(result);
        }

        info!("Ledger service stopped: all handles dropped");
    }
}

/// Cloneable front door to a running [`LedgerService`].
#[derive(Clone)]
pub struct LedgerHandle {
    state: Arc<RwLock<LedgerState>>,
    command_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<LedgerEvent>,
}

impl LedgerHandle {
    pub async fn submit(&self, tx: Transaction) -> Result<Receipt, SubmitError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(Command { tx, reply })
            .await
            .map_err(|_| SubmitError::ServiceStopped)?;
        let result = response.await.map_err(|_| SubmitError::ServiceStopped)?;
        Ok(result?)
    }

    /// Live feed of committed events. Records missed while lagging can be
    /// recovered with [`LedgerHandle::events_since`].
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.event_tx.subscribe()
    }

    pub async fn events_since(&self, cursor: usize) -> Vec<LedgerEvent> {
        self.state.read().await.events.since(cursor).to_vec()
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    pub async fn is_operational(&self) -> bool {
        self.state.read().await.operational
    }

    pub async fn registered_airline_count(&self) -> usize {
        self.state.read().await.registered_airline_count()
    }

    pub async fn balance_of(&self, address: &Address) -> Amount {
        self.state.read().await.balance_of(address)
    }

    pub async fn flight_status(&self, key: &FlightKey) -> FlightStatus {
        self.state.read().await.flight_status(key)
    }

    pub async fn flights(&self) -> Vec<FlightKey> {
        self.state.read().await.flight_keys().copied().collect()
    }

    pub async fn oracle_indexes(&self, oracle: &Address) -> Option<[u8; 3]> {
        self.state.read().await.oracle_indexes(oracle)
    }
}

pub fn channel<S: Settlement + Send + 'static>(
    state: LedgerState,
    settlement: S,
    queue_depth: usize,
) -> (LedgerService<S>, LedgerHandle) {
    let state = Arc::new(RwLock::new(state));
    let (command_tx, command_rx) = mpsc::channel(queue_depth);
    let (event_tx, _) = broadcast::channel(queue_depth.max(16));

    let service = LedgerService {
        state: state.clone(),
        settlement,
        command_rx,
        event_tx: event_tx.clone(),
    };
    let handle = LedgerHandle {
        state,
        command_tx,
        event_tx,
    };
    (service, handle)
}

/// Starts the service on the current runtime.
pub fn spawn<S: Settlement + Send + 'static>(
    state: LedgerState,
    settlement: S,
    queue_depth: usize,
) -> (LedgerHandle, JoinHandle<()>) {
    let (service, handle) = channel(state, settlement, queue_depth);
    let task = tokio::spawn(service.run());
    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::ChannelSettlement;
    use crate::wallet::Wallet;
    use flightsure_execution::RecordingSettlement;
    use flightsure_genesis::{create_genesis_state, GenesisConfig, DEV_ADMIN_SEED, DEV_FIRST_AIRLINE_SEED};
    use flightsure_types::instruction::LedgerInstruction;
    use flightsure_types::params::{INSURANCE_CAP, MIN_AIRLINE_FUNDING};

    fn dev_state() -> LedgerState {
        create_genesis_state(&GenesisConfig::dev()).unwrap()
    }

    #[tokio::test]
    async fn applies_transactions_in_order() {
        let (handle, _task) = spawn(dev_state(), RecordingSettlement::default(), 64);
        let mut airline = Wallet::from_seed(&DEV_FIRST_AIRLINE_SEED);

        let receipt = handle
            .submit(airline.sign(LedgerInstruction::FundAirline { amount: MIN_AIRLINE_FUNDING }))
            .await
            .unwrap();
        assert_eq!(receipt, Receipt::Done);

        let receipt = handle
            .submit(airline.sign(LedgerInstruction::PublishFlight {
                designator: "ND1309".to_string(),
                departure: 1_700_000_000,
            }))
            .await
            .unwrap();
        let key = match receipt {
            Receipt::FlightPublished(key) => key,
            other => panic!("unexpected receipt {other:?}"),
        };
        assert_eq!(handle.flights().await, vec![key]);
        assert_eq!(handle.flight_status(&key).await, FlightStatus::Unknown);
    }

    #[tokio::test]
    async fn rejected_transactions_report_the_ledger_error() {
        let (handle, _task) = spawn(dev_state(), RecordingSettlement::default(), 64);
        let mut stranger = Wallet::from_seed(&[0x33; 32]);

        let result = handle
            .submit(stranger.sign(LedgerInstruction::SetOperational { operational: false }))
            .await;
        assert_eq!(
            result,
            Err(SubmitError::Ledger(LedgerError::AccessDenied(stranger.address())))
        );
        assert!(handle.is_operational().await);
    }

    #[tokio::test]
    async fn subscribers_receive_committed_events() {
        let (handle, _task) = spawn(dev_state(), RecordingSettlement::default(), 64);
        let mut events = handle.subscribe();
        let mut admin = Wallet::from_seed(&DEV_ADMIN_SEED);

        handle
            .submit(admin.sign(LedgerInstruction::SetOperational { operational: false }))
            .await
            .unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            LedgerEvent::OperationalChanged { operational: false }
        );

        // Genesis registration plus the toggle.
        assert_eq!(handle.events_since(0).await.len(), 2);
    }

    #[tokio::test]
    async fn closed_settlement_restores_balance() {
        let mut state = dev_state();
        let mut passenger = Wallet::from_seed(&[0x44; 32]);
        state.payouts.insert(passenger.address(), INSURANCE_CAP);
        state.contract_balance = INSURANCE_CAP;

        let (settlement, payouts) = ChannelSettlement::new();
        drop(payouts);
        let (handle, _task) = spawn(state, settlement, 8);

        let result = handle.submit(passenger.sign(LedgerInstruction::Withdraw)).await;
        assert!(matches!(
            result,
            Err(SubmitError::Ledger(LedgerError::TransferFailure(_)))
        ));
        assert_eq!(handle.balance_of(&passenger.address()).await, INSURANCE_CAP);
    }

    #[tokio::test]
    async fn withdrawals_reach_the_settlement_task() {
        let mut state = dev_state();
        let mut passenger = Wallet::from_seed(&[0x44; 32]);
        state.payouts.insert(passenger.address(), INSURANCE_CAP);
        state.contract_balance = INSURANCE_CAP;

        let (settlement, mut payouts) = ChannelSettlement::new();
        let (handle, _task) = spawn(state, settlement, 8);

        let receipt = handle.submit(passenger.sign(LedgerInstruction::Withdraw)).await.unwrap();
        assert_eq!(receipt, Receipt::Withdrawn(INSURANCE_CAP));
        assert_eq!(
            payouts.recv().await.unwrap(),
            crate::settlement::Payout {
                payee: passenger.address(),
                amount: INSURANCE_CAP
            }
        );
        assert_eq!(handle.balance_of(&passenger.address()).await, 0);
    }

    #[tokio::test]
    async fn service_stops_when_handles_drop() {
        let (handle, task) = spawn(dev_state(), RecordingSettlement::default(), 8);
        drop(handle);
        task.await.unwrap();
    }
}
