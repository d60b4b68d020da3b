use std::path::Path;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chain::Network;

/// Anvil's well-known first dev account key. Tenderly forks don't care
/// what key signs as long as the derived address is funded.
pub const DEFAULT_SIGNER_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

// ── Fork backend ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkBackend {
    Tenderly,
    Anvil,
}

// ── Persistent fork config ───────────────────────────────────────────

/// State shared between harness invocations, saved as JSON by
/// `fork new` / `fork use` and loaded by every other command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkConfig {
    pub network: Network,
    pub backend: ForkBackend,
    /// Tenderly fork id, when the fork was created through their API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_id: Option<String>,
    pub rpc_url: String,
    /// Hex private key of the default signer.
    pub signer_key: String,
}

impl ForkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| {
            format!(
                "reading fork config {} — run `forkooor fork new` or `fork use` first",
                path.display()
            )
        })?;
        let config: ForkConfig =
            serde_json::from_str(&contents).context("parsing fork config")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).context("writing fork config")?;
        Ok(())
    }

    pub fn is_anvil(&self) -> bool {
        self.backend == ForkBackend::Anvil
    }

    /// Address of the configured default signer.
    pub fn signer_address(&self) -> Result<Address> {
        let signer: PrivateKeySigner = self
            .signer_key
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid signer key in config: {e}"))?;
        Ok(signer.address())
    }
}

// ── Sending identity ─────────────────────────────────────────────────

/// Who signs (or pretends to sign) the transactions of one command run.
#[derive(Debug, Clone)]
pub enum Sender {
    /// Sign locally with the configured key.
    Local { private_key: String, address: Address },
    /// Send as an impersonated fork account.
    Impersonated(Address),
}

impl Sender {
    pub fn address(&self) -> Address {
        match self {
            Sender::Local { address, .. } => *address,
            Sender::Impersonated(addr) => *addr,
        }
    }
}

// ── Per-command context ──────────────────────────────────────────────

/// Everything a command needs: the loaded fork config plus the resolved
/// sending identity from the global `--sender` flag.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub config: ForkConfig,
    pub sender: Sender,
}

impl Ctx {
    pub fn load(config_path: &Path, sender_flag: Option<&str>) -> Result<Self> {
        let config = ForkConfig::load(config_path)?;
        let sender = match sender_flag {
            Some(s) => {
                let address: Address = s.parse().context("invalid --sender address")?;
                Sender::Impersonated(address)
            }
            None => Sender::Local {
                private_key: config.signer_key.clone(),
                address: config.signer_address()?,
            },
        };
        Ok(Ctx { config, sender })
    }

    pub fn rpc_url(&self) -> &str {
        &self.config.rpc_url
    }

    /// Provider for this command run. Local senders get a wallet provider;
    /// impersonated senders get unlocked on the fork and send unsigned.
    pub async fn provider(&self) -> Result<alloy::providers::DynProvider> {
        use alloy::providers::Provider;
        match &self.sender {
            Sender::Local { private_key, .. } => {
                Ok(crate::chain::write_provider(self.rpc_url(), private_key)?.erased())
            }
            Sender::Impersonated(address) => {
                crate::chain::impersonate(self.rpc_url(), *address, self.config.is_anvil())
                    .await?;
                Ok(crate::chain::read_provider(self.rpc_url())?.erased())
            }
        }
    }

    pub fn network(&self) -> Network {
        self.config.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json() {
        let config = ForkConfig {
            network: Network::Mainnet,
            backend: ForkBackend::Anvil,
            fork_id: None,
            rpc_url: "http://127.0.0.1:8545".into(),
            signer_key: DEFAULT_SIGNER_KEY.into(),
        };

        let path = std::env::temp_dir().join("forkooor-config-test.json");
        config.save(&path).unwrap();
        let loaded = ForkConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.network, Network::Mainnet);
        assert_eq!(loaded.backend, ForkBackend::Anvil);
        assert_eq!(loaded.rpc_url, config.rpc_url);
    }

    #[test]
    fn default_key_derives_first_anvil_account() {
        let config = ForkConfig {
            network: Network::Mainnet,
            backend: ForkBackend::Anvil,
            fork_id: None,
            rpc_url: "http://127.0.0.1:8545".into(),
            signer_key: DEFAULT_SIGNER_KEY.into(),
        };
        assert_eq!(
            config.signer_address().unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn sender_flag_overrides_signer() {
        let sender = Sender::Impersonated(Address::ZERO);
        assert_eq!(sender.address(), Address::ZERO);
    }
}
