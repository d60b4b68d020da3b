#![allow(dead_code)]

use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::sol;

use forkooor::chain::{self, Network};
use forkooor::config::{Ctx, ForkBackend, ForkConfig, Sender};

sol! {
    #[sol(rpc)]
    contract IERC20Test {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

pub struct ForkContext {
    pub _anvil: AnvilInstance,
    pub rpc_url: String,
    pub wallet_address: Address,
    pub private_key: String,
}

impl ForkContext {
    /// Command context pointing at this fork, signing with the fork's
    /// first unlocked account.
    pub fn ctx(&self) -> Ctx {
        Ctx {
            config: ForkConfig {
                network: Network::Mainnet,
                backend: ForkBackend::Anvil,
                fork_id: None,
                rpc_url: self.rpc_url.clone(),
                signer_key: self.private_key.clone(),
            },
            sender: Sender::Local {
                private_key: self.private_key.clone(),
                address: self.wallet_address,
            },
        }
    }
}

/// Spawn an Anvil fork of mainnet. Override the upstream RPC with
/// MAINNET_RPC_URL when the default public endpoint rate-limits.
pub fn spawn_mainnet_fork() -> ForkContext {
    let fork_url = std::env::var("MAINNET_RPC_URL")
        .unwrap_or_else(|_| "https://eth.llamarpc.com".to_string());
    let anvil = Anvil::new().fork(fork_url).chain_id(1).spawn();

    ForkContext {
        rpc_url: anvil.endpoint(),
        wallet_address: anvil.addresses()[0],
        private_key: hex::encode(anvil.keys()[0].to_bytes()),
        _anvil: anvil,
    }
}

pub fn eth(amount: u128) -> U256 {
    U256::from(amount) * U256::from(10u128.pow(18))
}

pub async fn fund_eth(rpc_url: &str, account: Address, amount: U256) {
    chain::set_balance(rpc_url, account, amount, true)
        .await
        .expect("set_balance failed");
}

/// Hand `recipient` ERC20 tokens by impersonating a whale account and
/// transferring out of it.
pub async fn fund_erc20(
    rpc_url: &str,
    token: Address,
    whale: Address,
    recipient: Address,
    amount: U256,
) {
    fund_eth(rpc_url, whale, eth(10)).await;
    chain::impersonate(rpc_url, whale, true)
        .await
        .expect("impersonate failed");

    let provider = ProviderBuilder::new().connect_http(rpc_url.parse().unwrap());
    IERC20Test::new(token, &provider)
        .transfer(recipient, amount)
        .from(whale)
        .send()
        .await
        .expect("whale transfer failed")
        .get_receipt()
        .await
        .expect("whale transfer receipt failed");

    let _: () = provider
        .raw_request("anvil_stopImpersonatingAccount".into(), [whale])
        .await
        .expect("anvil_stopImpersonatingAccount failed");
}

pub async fn balance_of(rpc_url: &str, token: Address, account: Address) -> U256 {
    let provider = ProviderBuilder::new().connect_http(rpc_url.parse().unwrap());
    IERC20Test::new(token, &provider)
        .balanceOf(account)
        .call()
        .await
        .expect("balanceOf failed")
}
