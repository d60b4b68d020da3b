use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use anyhow::{Context, Result, bail};

use crate::chain;
use crate::config::Ctx;

// ── DSProxy interfaces ───────────────────────────────────────────────

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IDSProxy {
        function execute(address _target, bytes memory _data) external payable returns (bytes32 response);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IProxyRegistry {
        function proxies(address owner) external view returns (address);
        function build(address owner) external returns (address proxy);
    }
}

// ── Proxy resolution ─────────────────────────────────────────────────

/// Fetch the sender's DSProxy from the proxy registry, building one if
/// the account has none yet.
pub async fn get_or_build(ctx: &Ctx, provider: &DynProvider) -> Result<Address> {
    let owner = ctx.sender.address();
    let registry = IProxyRegistry::new(chain::proxy_registry_addr(), provider);

    let existing = registry
        .proxies(owner)
        .call()
        .await
        .context("proxy registry read")?;
    if existing != Address::ZERO {
        return Ok(existing);
    }

    println!("No proxy for {}, building one", chain::short_addr(&owner));
    let receipt = registry
        .build(owner)
        .from(owner)
        .send()
        .await
        .context("proxy build send")?
        .get_receipt()
        .await
        .context("proxy build receipt")?;
    require_success(&receipt, "proxy build")?;

    let built = registry
        .proxies(owner)
        .call()
        .await
        .context("proxy registry re-read")?;
    if built == Address::ZERO {
        bail!("proxy registry still has no proxy for {owner} after build");
    }
    Ok(built)
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Relay an encoded call through the sender's DSProxy. Every mutating
/// interaction with the automation stack goes through here.
pub async fn execute(
    ctx: &Ctx,
    provider: &DynProvider,
    proxy: Address,
    target: Address,
    data: Bytes,
    value: U256,
) -> Result<TransactionReceipt> {
    let ds_proxy = IDSProxy::new(proxy, provider);

    let pending = ds_proxy
        .execute(target, data)
        .from(ctx.sender.address())
        .value(value)
        .gas(5_000_000)
        .send()
        .await
        .context("proxy execute send")?;
    let receipt = pending
        .get_receipt()
        .await
        .context("proxy execute receipt")?;
    require_success(&receipt, "proxy execute")?;
    Ok(receipt)
}

pub fn require_success(receipt: &TransactionReceipt, label: &str) -> Result<()> {
    if !receipt.status() {
        bail!(
            "{} tx reverted (hash: {:?}, gas_used: {:?})",
            label,
            receipt.transaction_hash,
            receipt.gas_used,
        );
    }
    Ok(())
}
