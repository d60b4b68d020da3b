pub mod builders;
pub mod encoding;
pub mod triggers;

use alloy::primitives::{Address, B256, Bytes, U256, aliases::U80};
use alloy::providers::DynProvider;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::{Context, Result};
use thiserror::Error;

use crate::chain;
use crate::cli::SubCommand;
use crate::config::Ctx;
use crate::positions::savings::SavingsProtocol;
use crate::proxy;
use crate::registry;

use encoding::{ISubProxy, ISubStorage, StrategySub, sub_hash};
use triggers::RatioState;

sol! {
    #[sol(rpc)]
    contract IFeedRegistry {
        function latestRoundData(address base, address quote)
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }
}

// ── Workflow errors ──────────────────────────────────────────────────

/// The two ways a subscription write can fail, kept apart so an operator
/// can tell "the transaction reverted" from "the transaction landed but
/// produced unexpected state". Neither is retried.
#[derive(Debug, Error)]
pub enum SubError {
    /// The relayed call reverted. Verification never ran.
    #[error("dispatch through proxy failed: {0:#}")]
    Dispatch(anyhow::Error),

    /// The relay succeeded but the stored hash is not the one we computed.
    #[error("sub {sub_id}: stored hash {stored} does not match expected {expected}")]
    HashMismatch {
        sub_id: u64,
        expected: B256,
        stored: B256,
    },

    /// The relay succeeded but the enabled flag did not flip.
    #[error("sub {sub_id}: isEnabled is {stored}, expected {expected}")]
    ToggleMismatch {
        sub_id: u64,
        expected: bool,
        stored: bool,
    },

    /// Failures around the workflow itself: registry lookups, reads.
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

// ── Sub client ───────────────────────────────────────────────────────

/// One command run's view of the subscription system: the sender's
/// proxy plus the registry-resolved SubProxy / SubStorage pair.
pub struct SubClient {
    provider: DynProvider,
    user_proxy: Address,
    sub_proxy: Address,
    sub_storage: Address,
}

impl SubClient {
    pub async fn new(ctx: &Ctx) -> Result<SubClient> {
        let provider = ctx.provider().await?;
        let user_proxy = proxy::get_or_build(ctx, &provider).await?;
        let sub_proxy = registry::get_addr(ctx.rpc_url(), ctx.network(), "SubProxy").await?;
        let sub_storage = registry::get_addr(ctx.rpc_url(), ctx.network(), "SubStorage").await?;
        Ok(SubClient {
            provider,
            user_proxy,
            sub_proxy,
            sub_storage,
        })
    }

    pub fn user_proxy(&self) -> Address {
        self.user_proxy
    }

    /// Latest round of the asset's USD price feed. A trailing stop starts
    /// tracking the peak from this round.
    pub async fn latest_feed_round(&self, asset: Address) -> Result<U80> {
        let registry = IFeedRegistry::new(chain::chainlink_feed_registry(), &self.provider);
        let round = registry
            .latestRoundData(
                builders::oracle_lookup_token(asset)?,
                chain::chainlink_usd_quote(),
            )
            .call()
            .await
            .context("latestRoundData")?;
        Ok(round.roundId)
    }

    /// Read a stored subscription record.
    pub async fn get(&self, sub_id: u64) -> Result<ISubStorage::StoredSubData> {
        let storage = ISubStorage::new(self.sub_storage, &self.provider);
        storage
            .getSub(U256::from(sub_id))
            .call()
            .await
            .with_context(|| format!("getSub({sub_id})"))
    }

    /// Create a new subscription. Returns the id assigned by storage,
    /// verified by reading the record back and comparing hashes.
    pub async fn subscribe(&self, ctx: &Ctx, sub: &StrategySub) -> Result<u64, SubError> {
        let expected = sub_hash(sub);

        let storage = ISubStorage::new(self.sub_storage, &self.provider);
        let count_before = storage
            .getSubsCount()
            .call()
            .await
            .context("getSubsCount")?;

        let data = ISubProxy::subscribeToStrategyCall { _sub: sub.clone() }.abi_encode();
        self.dispatch(ctx, data.into()).await?;

        // ids are dense: the new sub lands at the old count
        let sub_id = count_before.to::<u64>();
        self.verify_hash(sub_id, expected).await?;
        Ok(sub_id)
    }

    /// Re-submit a subscription's data. The stored hash must come back
    /// equal to the locally computed one or the update did not apply.
    pub async fn update(&self, ctx: &Ctx, sub_id: u64, sub: &StrategySub) -> Result<B256, SubError> {
        let expected = sub_hash(sub);

        let data = ISubProxy::updateSubDataCall {
            _subId: U256::from(sub_id),
            _sub: sub.clone(),
        }
        .abi_encode();
        self.dispatch(ctx, data.into()).await?;

        self.verify_hash(sub_id, expected).await?;
        Ok(expected)
    }

    /// Flip the enabled flag on. Leaves the stored data and hash alone.
    pub async fn activate(&self, ctx: &Ctx, sub_id: u64) -> Result<(), SubError> {
        let data = ISubProxy::activateSubCall {
            _subId: U256::from(sub_id),
        }
        .abi_encode();
        self.dispatch(ctx, data.into()).await?;
        self.verify_enabled(sub_id, true).await
    }

    /// Flip the enabled flag off. The record itself stays.
    pub async fn deactivate(&self, ctx: &Ctx, sub_id: u64) -> Result<(), SubError> {
        let data = ISubProxy::deactivateSubCall {
            _subId: U256::from(sub_id),
        }
        .abi_encode();
        self.dispatch(ctx, data.into()).await?;
        self.verify_enabled(sub_id, false).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn dispatch(&self, ctx: &Ctx, data: Bytes) -> Result<(), SubError> {
        proxy::execute(
            ctx,
            &self.provider,
            self.user_proxy,
            self.sub_proxy,
            data,
            U256::ZERO,
        )
        .await
        .map(|_| ())
        .map_err(SubError::Dispatch)
    }

    async fn verify_hash(&self, sub_id: u64, expected: B256) -> Result<(), SubError> {
        let stored = self.get(sub_id).await?;
        if stored.strategySubHash != expected {
            return Err(SubError::HashMismatch {
                sub_id,
                expected,
                stored: stored.strategySubHash,
            });
        }
        Ok(())
    }

    async fn verify_enabled(&self, sub_id: u64, expected: bool) -> Result<(), SubError> {
        let stored = self.get(sub_id).await?;
        if stored.isEnabled != expected {
            return Err(SubError::ToggleMismatch {
                sub_id,
                expected,
                stored: stored.isEnabled,
            });
        }
        Ok(())
    }
}

// ── CLI entry points ─────────────────────────────────────────────────

pub async fn run(ctx: &Ctx, cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Savings {
            vault_id,
            protocol,
            min_ratio,
            target_ratio,
        } => {
            let protocol = SavingsProtocol::from_name(&protocol)?;
            let sub = builders::repay_from_savings(
                protocol.bundle_id(),
                vault_id,
                builders::parse_ratio_percent(&min_ratio)?,
                builders::parse_ratio_percent(&target_ratio)?,
            )?;

            let client = SubClient::new(ctx).await?;
            let sub_id = client.subscribe(ctx, &sub).await?;
            println!("Subscribed to {protocol} repay bundle with sub id #{sub_id}");
        }

        SubCommand::McdClose {
            vault_id,
            ilk,
            price,
            price_state,
            to_coll,
        } => {
            let sub = build_mcd_close(vault_id, &ilk, &price, &price_state, to_coll)?;

            let client = SubClient::new(ctx).await?;
            let sub_id = client.subscribe(ctx, &sub).await?;
            let kind = if to_coll { "close-to-coll" } else { "close-to-dai" };
            println!("Subscribed to mcd {kind} strategy with sub id #{sub_id}");
        }

        SubCommand::McdTrailingClose {
            vault_id,
            ilk,
            percentage,
            to_coll,
        } => {
            let ilk = chain::ilk(&ilk)?;
            let coll = chain::token(ilk.asset_symbol)?.address;
            let percentage = builders::parse_trailing_percentage(&percentage)?;

            let client = SubClient::new(ctx).await?;
            let round_id = client.latest_feed_round(coll).await?;
            let sub = if to_coll {
                builders::mcd_trailing_close_to_coll(vault_id, coll, percentage, round_id)?
            } else {
                builders::mcd_trailing_close_to_dai(vault_id, coll, percentage, round_id)?
            };

            let sub_id = client.subscribe(ctx, &sub).await?;
            let kind = if to_coll { "close-to-coll" } else { "close-to-dai" };
            println!("Subscribed to trailing mcd {kind} strategy with sub id #{sub_id}");
        }

        SubCommand::UpdateSavings {
            sub_id,
            vault_id,
            protocol,
            min_ratio,
            target_ratio,
        } => {
            let protocol = SavingsProtocol::from_name(&protocol)?;
            let sub = builders::repay_from_savings(
                protocol.bundle_id(),
                vault_id,
                builders::parse_ratio_percent(&min_ratio)?,
                builders::parse_ratio_percent(&target_ratio)?,
            )?;

            let client = SubClient::new(ctx).await?;
            let hash = client.update(ctx, sub_id, &sub).await?;
            println!("Updated sub id {sub_id}, hash: {hash}");
        }

        SubCommand::UpdateMcdClose {
            sub_id,
            vault_id,
            ilk,
            price,
            price_state,
            to_coll,
        } => {
            let sub = build_mcd_close(vault_id, &ilk, &price, &price_state, to_coll)?;

            let client = SubClient::new(ctx).await?;
            let hash = client.update(ctx, sub_id, &sub).await?;
            println!("Updated sub id {sub_id}, hash: {hash}");
        }

        SubCommand::Activate { sub_id } => {
            let client = SubClient::new(ctx).await?;
            client.activate(ctx, sub_id).await?;
            println!("Sub id {sub_id} activated!");
        }

        SubCommand::Deactivate { sub_id } => {
            let client = SubClient::new(ctx).await?;
            client.deactivate(ctx, sub_id).await?;
            println!("Sub id {sub_id} deactivated!");
        }

        SubCommand::Get { sub_id } => {
            let client = SubClient::new(ctx).await?;
            let stored = client.get(sub_id).await?;
            let owner = Address::from_word(stored.userProxy);
            println!("Sub id:    #{sub_id}");
            println!("Proxy:     {owner}");
            println!("Enabled:   {}", stored.isEnabled);
            println!("Sub hash:  {}", stored.strategySubHash);
        }
    }
    Ok(())
}

fn build_mcd_close(
    vault_id: u64,
    ilk: &str,
    price: &str,
    price_state: &str,
    to_coll: bool,
) -> Result<StrategySub> {
    let ilk = chain::ilk(ilk)?;
    let coll = chain::token(ilk.asset_symbol)?.address;
    let price = builders::parse_price(price)?;
    let state = RatioState::from_name(price_state)?;

    if to_coll {
        builders::mcd_close_to_coll(vault_id, coll, price, state)
    } else {
        builders::mcd_close_to_dai(vault_id, coll, price, state)
    }
}
