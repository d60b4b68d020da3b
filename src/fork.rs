//! Fork lifecycle: create a Tenderly fork through their REST API,
//! register an external fork (a local Anvil, typically), and hand out
//! native ETH on whichever fork the config points at.

use alloy::primitives::{Address, U256, utils::parse_units};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use crate::chain::{self, Network};
use crate::cli::ForkCommand;
use crate::config::{DEFAULT_SIGNER_KEY, ForkBackend, ForkConfig};

const TENDERLY_API_BASE: &str = "https://api.tenderly.co/api/v1";

// ── Tenderly API types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateForkResponse {
    simulation_fork: SimulationFork,
}

#[derive(Debug, Deserialize)]
struct SimulationFork {
    id: String,
}

struct TenderlyCreds {
    access_key: String,
    account_id: String,
    project: String,
}

impl TenderlyCreds {
    fn from_env() -> Result<Self> {
        Ok(TenderlyCreds {
            access_key: std::env::var("TENDERLY_ACCESS_KEY")
                .context("TENDERLY_ACCESS_KEY not set")?,
            account_id: std::env::var("TENDERLY_ACCOUNT_ID")
                .context("TENDERLY_ACCOUNT_ID not set")?,
            project: std::env::var("TENDERLY_PROJECT").context("TENDERLY_PROJECT not set")?,
        })
    }
}

// ── Fork creation ────────────────────────────────────────────────────

/// Ask Tenderly for a fresh fork of `network` and return the config
/// describing it.
pub async fn create_tenderly_fork(network: Network) -> Result<ForkConfig> {
    let creds = TenderlyCreds::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent("forkooor/0.1")
        .build()
        .context("creating Tenderly HTTP client")?;

    let url = format!(
        "{TENDERLY_API_BASE}/account/{}/project/{}/fork",
        creds.account_id, creds.project
    );
    let response = client
        .post(&url)
        .header("X-Access-Key", &creds.access_key)
        .json(&json!({ "network_id": network.chain_id().to_string() }))
        .send()
        .await
        .context("Tenderly fork request")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Tenderly fork creation failed ({status}): {body}");
    }

    let parsed: CreateForkResponse = response
        .json()
        .await
        .context("decoding Tenderly fork response")?;
    let fork_id = parsed.simulation_fork.id;

    Ok(ForkConfig {
        network,
        backend: ForkBackend::Tenderly,
        rpc_url: format!("https://rpc.tenderly.co/fork/{fork_id}"),
        fork_id: Some(fork_id),
        signer_key: DEFAULT_SIGNER_KEY.to_string(),
    })
}

fn parse_eth(amount: &str) -> Result<U256> {
    Ok(parse_units(amount, 18)
        .with_context(|| format!("parsing ETH amount '{amount}'"))?
        .get_absolute())
}

pub async fn run(config_path: &Path, cmd: ForkCommand) -> Result<()> {
    match cmd {
        ForkCommand::New { network, account } => {
            let network = Network::from_name(&network)?;
            let config = create_tenderly_fork(network).await?;
            config.save(config_path)?;
            println!("Forked {network} -> {}", config.rpc_url);

            // The default signer and any requested accounts start rich.
            let top_up = parse_eth("100")?;
            let signer = config.signer_address()?;
            chain::set_balance(&config.rpc_url, signer, top_up, config.is_anvil()).await?;
            println!("Topped up signer {signer} with 100 ETH");
            for acct in account {
                let acct: Address = acct.parse().context("invalid --account address")?;
                chain::set_balance(&config.rpc_url, acct, top_up, config.is_anvil()).await?;
                println!("Topped up {acct} with 100 ETH");
            }
            Ok(())
        }
        ForkCommand::Use { rpc_url, network } => {
            let config = ForkConfig {
                network: Network::from_name(&network)?,
                backend: ForkBackend::Anvil,
                fork_id: None,
                rpc_url,
                signer_key: DEFAULT_SIGNER_KEY.to_string(),
            };
            config.save(config_path)?;
            println!("Using fork at {}", config.rpc_url);
            Ok(())
        }
        ForkCommand::TopUp { account, amount } => {
            let config = ForkConfig::load(config_path)?;
            let account: Address = account.parse().context("invalid --account address")?;
            let wei = parse_eth(&amount)?;
            chain::set_balance(&config.rpc_url, account, wei, config.is_anvil()).await?;
            println!("Topped up {account} with {amount} ETH");
            Ok(())
        }
    }
}
