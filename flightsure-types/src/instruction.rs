use crate::{Amount, FlightKey, LedgerError};
use serde::{Deserialize, Serialize};

/// Flight status codes as reported by oracles.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum FlightStatus {
    #[default]
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_final(self) -> bool {
        self != FlightStatus::Unknown
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = LedgerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FlightStatus::Unknown),
            10 => Ok(FlightStatus::OnTime),
            20 => Ok(FlightStatus::LateAirline),
            30 => Ok(FlightStatus::LateWeather),
            40 => Ok(FlightStatus::LateTechnical),
            50 => Ok(FlightStatus::LateOther),
            other => Err(LedgerError::InvalidStatusCode(other)),
        }
    }
}

/// Every state-changing operation the ledger accepts. The caller is always the
/// signed transaction sender.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LedgerInstruction {
    // ══════════════════════════════════════════════════════════════
    // Access Guard
    // ══════════════════════════════════════════════════════════════
    SetOperational { operational: bool },

    // ══════════════════════════════════════════════════════════════
    // Airline Registry
    // ══════════════════════════════════════════════════════════════
    ProposeAirline { candidate: [u8; 32], name: String },
    FundAirline { amount: Amount },
    VoteAirline { candidate: [u8; 32] },
    AdmitAirline { candidate: [u8; 32] },

    // ══════════════════════════════════════════════════════════════
    // Flight Registry
    // ══════════════════════════════════════════════════════════════
    PublishFlight { designator: String, departure: u64 },

    // ══════════════════════════════════════════════════════════════
    // Insurance Pool
    // ══════════════════════════════════════════════════════════════
    BuyInsurance { flight: FlightKey, amount: Amount },
    CreditInsurees { flight: FlightKey },
    Withdraw,

    // ══════════════════════════════════════════════════════════════
    // Oracle Consensus
    // ══════════════════════════════════════════════════════════════
    RegisterOracle { fee: Amount },
    RequestFlightStatus { flight: FlightKey },
    SubmitOracleResponse { flight: FlightKey, status: u8, index: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_parse() {
        for status in [
            FlightStatus::Unknown,
            FlightStatus::OnTime,
            FlightStatus::LateAirline,
            FlightStatus::LateWeather,
            FlightStatus::LateTechnical,
            FlightStatus::LateOther,
        ] {
            assert_eq!(FlightStatus::try_from(status.code()).unwrap(), status);
        }
        assert_eq!(
            FlightStatus::try_from(21),
            Err(LedgerError::InvalidStatusCode(21))
        );
    }
}
