use anyhow::{anyhow, Context, Result};
use flightsure_crypto::signatures::{address_of, keypair_from_seed};
use flightsure_types::event::LedgerEvent;
use flightsure_types::state::Airline;
use flightsure_types::{Address, LedgerState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Seeds of the development keys used when no genesis file is given.
pub const DEV_ADMIN_SEED: [u8; 32] = [0xAA; 32];
pub const DEV_FIRST_AIRLINE_SEED: [u8; 32] = [0x01; 32];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenesisConfig {
    /// Hex-encoded administrator identity.
    pub admin: String,
    /// Hex-encoded identity of the airline registered at genesis.
    pub first_airline: String,
    pub first_airline_name: String,
    #[serde(default = "default_operational")]
    pub operational: bool,
}

fn default_operational() -> bool {
    true
}

impl GenesisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read genesis file {}", path.display()))?;
        serde_json::from_str(&content).context("Invalid genesis file")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn dev() -> Self {
        Self {
            admin: hex::encode(address_of(&keypair_from_seed(&DEV_ADMIN_SEED))),
            first_airline: hex::encode(address_of(&keypair_from_seed(&DEV_FIRST_AIRLINE_SEED))),
            first_airline_name: "Genesis Air".to_string(),
            operational: true,
        }
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(value.trim_start_matches("0x"), &mut out)
        .map_err(|e| anyhow!("Invalid address {}: {}", value, e))?;
    Ok(out)
}

/// Ledger at genesis: the first airline is registered but not yet funded.
pub fn create_genesis_state(config: &GenesisConfig) -> Result<LedgerState> {
    let admin = parse_address(&config.admin).context("genesis admin")?;
    let first_airline = parse_address(&config.first_airline).context("genesis first_airline")?;

    let mut state = LedgerState::new(admin);
    state.operational = config.operational;
    state.airlines.insert(
        first_airline,
        Airline {
            name: config.first_airline_name.clone(),
            registered: true,
            ..Default::default()
        },
    );
    state.events.push(LedgerEvent::AirlineRegistered {
        airline: first_airline,
        registered_count: 1,
    });
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_genesis_registers_first_airline() {
        let config = GenesisConfig::dev();
        let state = create_genesis_state(&config).unwrap();
        let first = parse_address(&config.first_airline).unwrap();

        assert!(state.operational);
        assert_eq!(state.registered_airline_count(), 1);
        assert!(state.is_airline_registered(&first));
        assert!(!state.is_airline_funded(&first));
        assert_eq!(state.admin, parse_address(&config.admin).unwrap());
        assert_eq!(state.events.len(), 1);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address(&"zz".repeat(32)).is_err());
        assert_eq!(parse_address(&format!("0x{}", "01".repeat(32))).unwrap(), [1u8; 32]);

        let mut config = GenesisConfig::dev();
        config.admin = "nope".to_string();
        assert!(create_genesis_state(&config).is_err());
    }

    #[test]
    fn config_round_trips_through_a_file() {
        let path = std::env::temp_dir().join(format!("flightsure-genesis-{}.json", std::process::id()));
        let config = GenesisConfig::dev();
        config.save(&path).unwrap();
        assert_eq!(GenesisConfig::load(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn operational_defaults_to_true() {
        let json = format!(
            r#"{{"admin":"{}","first_airline":"{}","first_airline_name":"X"}}"#,
            "aa".repeat(32),
            "01".repeat(32)
        );
        let config: GenesisConfig = serde_json::from_str(&json).unwrap();
        assert!(config.operational);
    }
}
