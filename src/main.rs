//! `pedigree-pal` command line client.
//!
//! Signs with keys from the environment and talks to the registry through
//! the same runtime a graphical front end would drive.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use pedigree_pal::app::{AppState, Dapp, DappHandle, Intent};
use pedigree_pal::config::{load_config, PedigreeConfig};
use pedigree_pal::observability::{logging, metrics};
use pedigree_pal::orchestrator::TxOutcome;
use pedigree_pal::registry::{ContractRegistry, DogForm, PedigreeClient};
use pedigree_pal::types::{ChainId, DogId};
use pedigree_pal::wallet::{LocalWallet, WalletConnector, WalletProvider};

#[derive(Parser)]
#[command(name = "pedigree-pal")]
#[command(about = "Register and look up dogs in the on-chain pedigree registry", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults target a local Hardhat node.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index of the configured key to sign with.
    #[arg(short, long, default_value_t = 0)]
    account: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and make sure the wallet is on the registry's network
    Network,
    /// Register a dog
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        breed: String,
        /// M or F
        #[arg(long)]
        sex: String,
        #[arg(long)]
        age: String,
        /// Mother id, 0 when unknown
        #[arg(long, default_value = "0")]
        mother: String,
        /// Father id, 0 when unknown
        #[arg(long, default_value = "0")]
        father: String,
    },
    /// Look up one dog
    Retrieve { id: u64 },
    /// Print the ancestry of a dog
    Pedigree {
        id: u64,
        #[arg(short, long, default_value_t = 3)]
        generations: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PedigreeConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("pedigree-pal v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let networks = config.effective_networks();
    let wallet = Arc::new(LocalWallet::from_env(&config.wallet, &networks)?);
    let address = wallet
        .select_account(cli.account)
        .ok_or_else(|| format!("no key configured at index {}", cli.account))?;
    tracing::info!(address = %address, chain_id = %wallet.current_chain(), "Signer ready");

    let contract: Address = config.registry.contract_address.parse()?;
    let registry = ContractRegistry::new(
        Arc::clone(&wallet),
        contract,
        Duration::from_millis(config.registry.confirmation_poll_ms),
    );
    let client = PedigreeClient::new(Arc::new(registry), config.registry.validate_pedigree);

    if let Commands::Pedigree { id, generations } = cli.command {
        let pedigree = client.retrieve_pedigree(DogId(id), generations).await?;
        print!("{pedigree}");
        return Ok(());
    }

    let provider: Arc<dyn WalletProvider> = wallet;
    let connector = WalletConnector::new(Some(provider));
    let dapp = Dapp::new(ChainId(config.registry.required_chain_id), connector, client);
    let handle = dapp.spawn();

    let result = run(&handle, cli.command).await;
    handle.shutdown().await;
    result
}

async fn run(handle: &DappHandle, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let state = connect(handle).await?;
    tracing::debug!(session = ?state.session, "Session ready");

    match command {
        Commands::Network => {
            if let Some(identity) = state.session.identity() {
                println!("Connected as {} on chain {}", identity.address, identity.chain_id);
            }
        }

        Commands::Register {
            name,
            breed,
            sex,
            age,
            mother,
            father,
        } => {
            let form = DogForm {
                name: Some(name),
                breed: Some(breed),
                sex: Some(sex),
                age: Some(age),
                mother: Some(mother),
                father: Some(father),
            };
            handle.dispatch(Intent::RegisterDog(form)).await;
            let state = handle
                .wait_for(|s| {
                    s.transaction.is_idle()
                        && (s.last_outcome.is_some() || s.transaction_error.is_some() || s.network_error.is_some())
                })
                .await
                .ok_or("runtime stopped")?;
            fail_on_error(&state)?;

            match state.last_outcome {
                Some(TxOutcome::Confirmed {
                    hash,
                    block_number,
                    dog_id,
                }) => {
                    let id = dog_id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
                    let block = block_number.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
                    println!("Registered dog #{id} in block {block} (tx {hash})");
                }
                Some(TxOutcome::UserCancelled) => println!("Registration cancelled"),
                _ => {}
            }
        }

        Commands::Retrieve { id } => {
            handle.dispatch(Intent::CheckDog(DogId(id))).await;
            let state = handle
                .wait_for(|s| s.last_dog.is_some() || s.notice.is_some() || s.transaction_error.is_some())
                .await
                .ok_or("runtime stopped")?;
            fail_on_error(&state)?;

            match (&state.last_dog, &state.notice) {
                (Some(dog), _) => println!("{}", serde_json::to_string_pretty(dog)?),
                (None, Some(notice)) => println!("{notice}"),
                (None, None) => {}
            }
        }

        Commands::Pedigree { .. } => {}
    }
    Ok(())
}

/// Connect and wait until the wallet is on the required network.
async fn connect(handle: &DappHandle) -> Result<AppState, Box<dyn std::error::Error>> {
    handle.dispatch(Intent::Connect).await;
    let state = handle
        .wait_for(|s| {
            s.transaction_error.is_some()
                || s.network_error.is_some()
                || (s.session.connected && s.on_required_chain())
        })
        .await
        .ok_or("runtime stopped")?;
    fail_on_error(&state)?;
    Ok(state)
}

fn fail_on_error(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    match state.network_error.as_ref().or(state.transaction_error.as_ref()) {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}
