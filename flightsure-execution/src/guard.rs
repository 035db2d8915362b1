use flightsure_types::event::LedgerEvent;
use flightsure_types::{Address, LedgerError, LedgerState};
use tracing::warn;

pub fn is_operational(state: &LedgerState) -> bool {
    state.operational
}

/// Circuit breaker consulted first by every mutating operation.
pub fn require_operational(state: &LedgerState) -> Result<(), LedgerError> {
    if !state.operational {
        return Err(LedgerError::NotOperational);
    }
    Ok(())
}

pub fn require_admin(state: &LedgerState, caller: &Address) -> Result<(), LedgerError> {
    if &state.admin != caller {
        return Err(LedgerError::AccessDenied(*caller));
    }
    Ok(())
}

/// Administrator-only. Not gated by the breaker itself, otherwise a paused
/// ledger could never resume.
pub fn set_operational(state: &mut LedgerState, caller: &Address, operational: bool) -> Result<(), LedgerError> {
    require_admin(state, caller)?;
    if state.operational == operational {
        return Ok(());
    }

    state.operational = operational;
    state.events.push(LedgerEvent::OperationalChanged { operational });
    warn!("Ledger operational status set to {}", operational);
    Ok(())
}
