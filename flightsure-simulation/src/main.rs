use anyhow::{bail, Context, Result};
use clap::Parser;
use flightsure_execution::Receipt;
use flightsure_genesis::{create_genesis_state, GenesisConfig, DEV_FIRST_AIRLINE_SEED};
use flightsure_node::{spawn, ChannelSettlement, LedgerHandle, SubmitError, Wallet};
use flightsure_types::event::LedgerEvent;
use flightsure_types::params::{
    CONSENSUS_THRESHOLD, MIN_AIRLINE_FUNDING, ORACLE_REGISTRATION_FEE, WEI_PER_ETHER,
};
use flightsure_types::{Amount, FlightKey, FlightStatus, LedgerInstruction};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about = "FlightSure end-to-end simulation runner")]
struct Args {
    /// Airlines taking part, including the one registered at genesis.
    #[arg(long, default_value_t = 6)]
    airlines: usize,
    /// Passengers buying one policy each on a random flight.
    #[arg(long, default_value_t = 24)]
    passengers: usize,
    /// Oracles registered with the ledger.
    #[arg(long, default_value_t = 40)]
    oracles: usize,
    /// Premium paid by every passenger, in thousandths of an ether.
    #[arg(long, default_value_t = 500)]
    premium_finney: u64,
    /// Genesis file. Written with the development identities if missing.
    #[arg(long)]
    genesis: Option<PathBuf>,
    /// Seconds to wait for oracles to settle every flight.
    #[arg(long, default_value_t = 10)]
    settle_timeout_secs: u64,
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Default)]
struct Summary {
    airlines: usize,
    flights: usize,
    policies: usize,
    rejected_purchases: usize,
    finalized: usize,
    late_airline: usize,
    oracle_reports: usize,
    credited_passengers: usize,
    payouts: usize,
    paid_out: Amount,
    contract_balance: Amount,
}

/// What the simulated fleet "observes" for a flight. Derived from the key so
/// every oracle agrees.
fn observed_status(flight: &FlightKey) -> FlightStatus {
    if flight[0] % 2 == 0 {
        FlightStatus::LateAirline
    } else {
        FlightStatus::OnTime
    }
}

fn load_genesis(path: Option<&Path>) -> Result<GenesisConfig> {
    let dev = GenesisConfig::dev();
    let Some(path) = path else {
        return Ok(dev);
    };
    if !path.exists() {
        dev.save(path)
            .with_context(|| format!("Failed to write genesis file {}", path.display()))?;
        info!("Wrote development genesis to {}", path.display());
        return Ok(dev);
    }

    let config = GenesisConfig::load(path)?;
    if config.admin != dev.admin || config.first_airline != dev.first_airline {
        bail!(
            "{} names identities the simulation holds no keys for",
            path.display()
        );
    }
    Ok(config)
}

/// Off-ledger oracle fleet: answers every status request with the oracles
/// that hold the requested index until the flight is finalized.
fn spawn_oracle_fleet(handle: LedgerHandle, mut oracles: Vec<(Wallet, [u8; 3])>) -> JoinHandle<()> {
    let mut requests = handle.subscribe();
    tokio::spawn(async move {
        loop {
            let (flight, index) = match requests.recv().await {
                Ok(LedgerEvent::OracleRequest { flight, index, .. }) => (flight, index),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!("Oracle fleet missed {} events", missed);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let status = observed_status(&flight);
            for entry in oracles.iter_mut().filter(|entry| entry.1.contains(&index)) {
                let tx = entry.0.sign(LedgerInstruction::SubmitOracleResponse {
                    flight,
                    status: status.code(),
                    index,
                });
                match handle.submit(tx).await {
                    Ok(Receipt::Response(Some(final_status))) => {
                        debug!("Flight {} settled as {:?}", hex::encode(flight), final_status);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Report from {} rejected: {}", hex::encode(entry.0.address()), e),
                }
            }
        }
    })
}

async fn run_simulation(args: &Args) -> Result<Summary> {
    if args.airlines == 0 {
        bail!("at least one airline is required");
    }
    let genesis = load_genesis(args.genesis.as_deref())?;
    let state = create_genesis_state(&genesis)?;

    let (settlement, mut payout_rx) = ChannelSettlement::new();
    let (handle, service) = spawn(state, settlement, 1024);
    let payout_task = tokio::spawn(async move {
        let mut count = 0usize;
        let mut total: Amount = 0;
        while let Some(payout) = payout_rx.recv().await {
            debug!("Paid {} wei to {}", payout.amount, hex::encode(payout.payee));
            count += 1;
            total = total.saturating_add(payout.amount);
        }
        (count, total)
    });

    let start = Instant::now();

    // === Airlines ===
    let mut founder = Wallet::from_seed(&DEV_FIRST_AIRLINE_SEED);
    handle
        .submit(founder.sign(LedgerInstruction::FundAirline { amount: MIN_AIRLINE_FUNDING }))
        .await?;
    let mut airlines = vec![founder];

    for n in 1..args.airlines {
        let mut candidate = Wallet::generate();
        let address = candidate.address();
        handle
            .submit(airlines[0].sign(LedgerInstruction::ProposeAirline {
                candidate: address,
                name: format!("Sim Air {n}"),
            }))
            .await?;
        handle
            .submit(candidate.sign(LedgerInstruction::FundAirline { amount: MIN_AIRLINE_FUNDING }))
            .await?;

        let registered = handle.registered_airline_count().await;
        if registered >= CONSENSUS_THRESHOLD {
            let needed = registered / 2 + 1;
            for voter in airlines.iter_mut().take(needed) {
                handle
                    .submit(voter.sign(LedgerInstruction::VoteAirline { candidate: address }))
                    .await?;
            }
        }
        handle
            .submit(airlines[0].sign(LedgerInstruction::AdmitAirline { candidate: address }))
            .await?;
        airlines.push(candidate);
    }
    info!("{} airlines active", airlines.len());

    // === Flights ===
    let mut flights = Vec::with_capacity(airlines.len());
    for (n, airline) in airlines.iter_mut().enumerate() {
        let receipt = handle
            .submit(airline.sign(LedgerInstruction::PublishFlight {
                designator: format!("FS{}", 100 + n),
                departure: 1_700_000_000 + 3_600 * n as u64,
            }))
            .await?;
        match receipt {
            Receipt::FlightPublished(key) => flights.push(key),
            other => bail!("unexpected receipt for flight publication: {:?}", other),
        }
    }

    // === Oracles ===
    let mut oracles = Vec::with_capacity(args.oracles);
    for _ in 0..args.oracles {
        let mut oracle = Wallet::generate();
        let receipt = handle
            .submit(oracle.sign(LedgerInstruction::RegisterOracle { fee: ORACLE_REGISTRATION_FEE }))
            .await?;
        match receipt {
            Receipt::OracleRegistered(indexes) => oracles.push((oracle, indexes)),
            other => bail!("unexpected receipt for oracle registration: {:?}", other),
        }
    }
    let fleet = spawn_oracle_fleet(handle.clone(), oracles);

    // === Insurance ===
    let premium = Amount::from(args.premium_finney) * WEI_PER_ETHER / 1_000;
    let choices: Vec<usize> = {
        let mut rng = rand::thread_rng();
        (0..args.passengers).map(|_| rng.gen_range(0..flights.len())).collect()
    };

    let mut summary = Summary {
        airlines: airlines.len(),
        flights: flights.len(),
        ..Default::default()
    };
    let mut passengers = Vec::with_capacity(args.passengers);
    for choice in choices {
        let mut passenger = Wallet::generate();
        let tx = passenger.sign(LedgerInstruction::BuyInsurance {
            flight: flights[choice],
            amount: premium,
        });
        match handle.submit(tx).await {
            Ok(_) => summary.policies += 1,
            Err(SubmitError::Ledger(e)) => {
                warn!("Purchase rejected: {}", e);
                summary.rejected_purchases += 1;
            }
            Err(e) => return Err(e.into()),
        }
        passengers.push(passenger);
    }

    // === Oracle consensus ===
    let mut settled = handle.subscribe();
    for flight in &flights {
        let receipt = handle
            .submit(airlines[0].sign(LedgerInstruction::RequestFlightStatus { flight: *flight }))
            .await?;
        debug!("Status requested for {}: {:?}", hex::encode(flight), receipt);
    }

    let mut pending = flights.len();
    let wait = tokio::time::timeout(Duration::from_secs(args.settle_timeout_secs), async {
        while pending > 0 {
            match settled.recv().await {
                Ok(LedgerEvent::FlightStatusFinalized { .. }) => pending -= 1,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await;
    if wait.is_err() {
        warn!("Timed out with {} flights still awaiting oracle consensus", pending);
    }

    // === Withdrawals ===
    for passenger in &mut passengers {
        if handle.balance_of(&passenger.address()).await == 0 {
            continue;
        }
        let receipt = handle.submit(passenger.sign(LedgerInstruction::Withdraw)).await?;
        debug!("Passenger {} withdrew: {:?}", hex::encode(passenger.address()), receipt);
    }

    fleet.abort();
    let _ = fleet.await;
    let snapshot = handle.snapshot().await;
    drop(handle);
    service.await.context("ledger service panicked")?;
    let (payouts, paid_out) = payout_task.await.context("payout task panicked")?;

    for flight in &flights {
        let status = snapshot.flight_status(flight);
        if status.is_final() {
            summary.finalized += 1;
        }
        if status == FlightStatus::LateAirline {
            summary.late_airline += 1;
        }
    }
    for event in snapshot.events.iter() {
        match event {
            LedgerEvent::OracleReport { .. } => summary.oracle_reports += 1,
            LedgerEvent::PassengerCredited { .. } => summary.credited_passengers += 1,
            _ => {}
        }
    }
    summary.payouts = payouts;
    summary.paid_out = paid_out;
    summary.contract_balance = snapshot.contract_balance;

    info!("Simulation finished in {:.2?}", start.elapsed());
    Ok(summary)
}

fn ether(amount: Amount) -> String {
    format!("{}.{:03}", amount / WEI_PER_ETHER, amount % WEI_PER_ETHER / (WEI_PER_ETHER / 1_000))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level: Level = args.log_level.parse().context("Invalid log level")?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")?;

    let summary = run_simulation(&args).await?;

    println!("=== FlightSure Simulation ===");
    println!("Airlines active: {}", summary.airlines);
    println!("Flights published: {}", summary.flights);
    println!("Policies sold: {}", summary.policies);
    println!("Purchases rejected: {}", summary.rejected_purchases);
    println!("Flights finalized: {} ({} late by airline)", summary.finalized, summary.late_airline);
    println!("Oracle reports: {}", summary.oracle_reports);
    println!("Passengers credited: {}", summary.credited_passengers);
    println!("Payouts settled: {} ({} ETH)", summary.payouts, ether(summary.paid_out));
    println!("Contract balance: {} ETH", ether(summary.contract_balance));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsure_types::params::credit_for;

    fn args(airlines: usize, passengers: usize, oracles: usize) -> Args {
        Args {
            airlines,
            passengers,
            oracles,
            premium_finney: 500,
            genesis: None,
            settle_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }

    #[tokio::test]
    async fn full_lifecycle_settles_every_flight() {
        let summary = run_simulation(&args(6, 12, 60)).await.unwrap();
        let premium = WEI_PER_ETHER / 2;

        assert_eq!(summary.airlines, 6);
        assert_eq!(summary.flights, 6);
        assert_eq!(summary.policies, 12);
        assert_eq!(summary.finalized, 6);
        assert!(summary.oracle_reports >= 6 * 3);

        assert_eq!(summary.payouts, summary.credited_passengers);
        assert_eq!(summary.paid_out, credit_for(premium) * summary.credited_passengers as Amount);
        assert_eq!(
            summary.contract_balance,
            6 * MIN_AIRLINE_FUNDING + 60 * ORACLE_REGISTRATION_FEE + 12 * premium - summary.paid_out
        );
    }

    #[tokio::test]
    async fn premiums_above_the_cap_are_rejected() {
        let mut args = args(1, 3, 0);
        args.premium_finney = 1_500;
        // Nobody can answer the status request without oracles.
        args.settle_timeout_secs = 1;
        let summary = run_simulation(&args).await.unwrap();

        assert_eq!(summary.policies, 0);
        assert_eq!(summary.rejected_purchases, 3);
        assert_eq!(summary.contract_balance, MIN_AIRLINE_FUNDING);
    }

    #[test]
    fn observed_status_is_stable_per_flight() {
        let mut flight = [0u8; 32];
        assert_eq!(observed_status(&flight), FlightStatus::LateAirline);
        flight[0] = 1;
        assert_eq!(observed_status(&flight), FlightStatus::OnTime);
    }

    #[test]
    fn formats_ether_amounts() {
        assert_eq!(ether(WEI_PER_ETHER * 3 / 2), "1.500");
        assert_eq!(ether(0), "0.000");
    }
}
