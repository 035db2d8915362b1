use flightsure_execution::Settlement;
use flightsure_types::{Address, Amount};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub struct Payout {
    pub payee: Address,
    pub amount: Amount,
}

/// Hands withdrawals to an off-ledger payment task. A transfer fails only when
/// that task is gone.
pub struct ChannelSettlement {
    payouts: mpsc::UnboundedSender<Payout>,
}

impl ChannelSettlement {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Payout>) {
        let (payouts, rx) = mpsc::unbounded_channel();
        (Self { payouts }, rx)
    }
}

impl Settlement for ChannelSettlement {
    fn transfer(&mut self, payee: &Address, amount: Amount) -> Result<(), String> {
        self.payouts
            .send(Payout { payee: *payee, amount })
            .map_err(|_| "settlement channel closed".to_string())
    }
}
