use alloy::primitives::{Address, B256, U256, utils::format_units};
use alloy::providers::DynProvider;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::{Context, Result, bail};

use crate::chain::{self, IlkInfo, maker};
use crate::config::Ctx;
use crate::proxy;
use crate::tokens;

sol! {
    #[allow(missing_docs)]
    interface IDssProxyActions {
        function openLockETHAndDraw(address manager, address jug, address ethJoin, address daiJoin, bytes32 ilk, uint256 wadD) external payable returns (uint256 cdp);
        function openLockGemAndDraw(address manager, address jug, address gemJoin, address daiJoin, bytes32 ilk, uint256 amtC, uint256 wadD, bool transferFrom) external returns (uint256 cdp);
        function lockETH(address manager, address ethJoin, uint256 cdp) external payable;
        function lockGem(address manager, address gemJoin, uint256 cdp, uint256 amt, bool transferFrom) external;
        function freeETH(address manager, address ethJoin, uint256 cdp, uint256 wad) external;
        function freeGem(address manager, address gemJoin, uint256 cdp, uint256 amt) external;
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IGetCdps {
        function getCdpsAsc(address manager, address guy) external view returns (uint256[] memory ids, address[] memory urns, bytes32[] memory ilks);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ICdpManager {
        function urns(uint256 cdp) external view returns (address);
        function ilks(uint256 cdp) external view returns (bytes32);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IVat {
        function urns(bytes32 ilk, address urn) external view returns (uint256 ink, uint256 art);
        function ilks(bytes32 ilk) external view returns (uint256 Art, uint256 rate, uint256 spot, uint256 line, uint256 dust);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ISpotter {
        function ilks(bytes32 ilk) external view returns (address pip, uint256 mat);
    }
}

// ── Vault creation ───────────────────────────────────────────────────

/// Open a vault through DssProxyActions: lock collateral, draw DAI.
/// ETH collateral rides along as call value; ERC20 collateral must sit
/// on the sender and gets pulled by the proxy.
pub async fn open_vault(
    ctx: &Ctx,
    provider: &DynProvider,
    ilk: IlkInfo,
    coll_amount: U256,
    debt_wad: U256,
) -> Result<()> {
    let user_proxy = proxy::get_or_build(ctx, provider).await?;
    let gem = chain::token(ilk.asset_symbol)?;

    let (data, value) = if ilk.asset_symbol == "WETH" {
        let call = IDssProxyActions::openLockETHAndDrawCall {
            manager: maker::cdp_manager(),
            jug: maker::jug(),
            ethJoin: ilk.join,
            daiJoin: maker::dai_join(),
            ilk: ilk.ilk_bytes(),
            wadD: debt_wad,
        };
        (call.abi_encode(), coll_amount)
    } else {
        tokens::approve(ctx, provider, gem.address, user_proxy, coll_amount).await?;
        let call = IDssProxyActions::openLockGemAndDrawCall {
            manager: maker::cdp_manager(),
            jug: maker::jug(),
            gemJoin: ilk.join,
            daiJoin: maker::dai_join(),
            ilk: ilk.ilk_bytes(),
            amtC: coll_amount,
            wadD: debt_wad,
            transferFrom: true,
        };
        (call.abi_encode(), U256::ZERO)
    };

    proxy::execute(
        ctx,
        provider,
        user_proxy,
        maker::proxy_actions(),
        data.into(),
        value,
    )
    .await
    .context("opening vault")?;

    let vault_id = latest_vault_for(provider, user_proxy)
        .await?
        .context("no vault found for proxy after open")?;
    println!("Vault #{vault_id} created");

    print_vault(ctx, vault_id).await
}

/// Lock additional collateral in an existing vault.
pub async fn supply_collateral(
    ctx: &Ctx,
    provider: &DynProvider,
    ilk: IlkInfo,
    vault_id: u64,
    amount: U256,
) -> Result<()> {
    let user_proxy = proxy::get_or_build(ctx, provider).await?;
    let gem = chain::token(ilk.asset_symbol)?;

    let (data, value) = if ilk.asset_symbol == "WETH" {
        let call = IDssProxyActions::lockETHCall {
            manager: maker::cdp_manager(),
            ethJoin: ilk.join,
            cdp: U256::from(vault_id),
        };
        (call.abi_encode(), amount)
    } else {
        tokens::approve(ctx, provider, gem.address, user_proxy, amount).await?;
        let call = IDssProxyActions::lockGemCall {
            manager: maker::cdp_manager(),
            gemJoin: ilk.join,
            cdp: U256::from(vault_id),
            amt: amount,
            transferFrom: true,
        };
        (call.abi_encode(), U256::ZERO)
    };

    proxy::execute(
        ctx,
        provider,
        user_proxy,
        maker::proxy_actions(),
        data.into(),
        value,
    )
    .await
    .with_context(|| format!("supplying to vault #{vault_id}"))?;

    println!("Supplied to vault #{vault_id}");
    print_vault(ctx, vault_id).await
}

/// Free collateral from an existing vault back to the sender's proxy
/// owner.
pub async fn withdraw_collateral(
    ctx: &Ctx,
    provider: &DynProvider,
    ilk: IlkInfo,
    vault_id: u64,
    amount: U256,
) -> Result<()> {
    let user_proxy = proxy::get_or_build(ctx, provider).await?;

    let data = if ilk.asset_symbol == "WETH" {
        IDssProxyActions::freeETHCall {
            manager: maker::cdp_manager(),
            ethJoin: ilk.join,
            cdp: U256::from(vault_id),
            wad: amount,
        }
        .abi_encode()
    } else {
        IDssProxyActions::freeGemCall {
            manager: maker::cdp_manager(),
            gemJoin: ilk.join,
            cdp: U256::from(vault_id),
            amt: amount,
        }
        .abi_encode()
    };

    proxy::execute(
        ctx,
        provider,
        user_proxy,
        maker::proxy_actions(),
        data.into(),
        U256::ZERO,
    )
    .await
    .with_context(|| format!("withdrawing from vault #{vault_id}"))?;

    println!("Withdrew from vault #{vault_id}");
    print_vault(ctx, vault_id).await
}

/// Newest vault id owned by the given proxy, if any.
pub async fn latest_vault_for(provider: &DynProvider, owner: Address) -> Result<Option<u64>> {
    let get_cdps = IGetCdps::new(maker::get_cdps(), provider);
    let cdps = get_cdps
        .getCdpsAsc(maker::cdp_manager(), owner)
        .call()
        .await
        .context("getCdpsAsc")?;
    Ok(cdps.ids.last().map(|id| id.to::<u64>()))
}

// ── Vault inspection ─────────────────────────────────────────────────

#[derive(Debug)]
pub struct VaultState {
    pub ilk_label: String,
    pub coll: f64,
    pub debt: f64,
    /// Collateralization in percent; infinite for debt-free vaults.
    pub ratio_pct: f64,
}

/// Read a vault's urn from the Vat and derive collateral, debt and the
/// current collateralization ratio.
pub async fn vault_state(rpc_url: &str, vault_id: u64) -> Result<VaultState> {
    let provider = chain::read_provider(rpc_url)?;

    let manager = ICdpManager::new(maker::cdp_manager(), &provider);
    let urn = manager
        .urns(U256::from(vault_id))
        .call()
        .await
        .context("manager.urns")?;
    if urn == Address::ZERO {
        bail!("vault #{vault_id} does not exist");
    }
    let ilk = manager
        .ilks(U256::from(vault_id))
        .call()
        .await
        .context("manager.ilks")?;

    let vat = IVat::new(maker::vat(), &provider);
    let urn_state = vat.urns(ilk, urn).call().await.context("vat.urns")?;
    let ilk_state = vat.ilks(ilk).call().await.context("vat.ilks")?;

    let spotter = ISpotter::new(maker::spotter(), &provider);
    let spot_ilk = spotter.ilks(ilk).call().await.context("spotter.ilks")?;

    let ink = wad_f64(urn_state.ink)?;
    let art = wad_f64(urn_state.art)?;
    let rate = ray_f64(ilk_state.rate)?;
    let spot = ray_f64(ilk_state.spot)?;
    let mat = ray_f64(spot_ilk.mat)?;

    // spot = price / mat (par is 1), so price = spot * mat
    let debt = art * rate;
    let coll_value = ink * spot * mat;
    let ratio_pct = if debt > 0.0 {
        coll_value / debt * 100.0
    } else {
        f64::INFINITY
    };

    Ok(VaultState {
        ilk_label: ilk_label(ilk),
        coll: ink,
        debt,
        ratio_pct,
    })
}

pub async fn print_vault(ctx: &Ctx, vault_id: u64) -> Result<()> {
    let state = vault_state(ctx.rpc_url(), vault_id).await?;
    println!("Vault id: #{vault_id} ({})", state.ilk_label);
    println!("Coll:  {:.4}", state.coll);
    println!("Debt:  {:.2} DAI", state.debt);
    println!("Ratio: {:.1}%", state.ratio_pct);
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn wad_f64(value: U256) -> Result<f64> {
    Ok(format_units(value, 18)?.parse::<f64>()?)
}

fn ray_f64(value: U256) -> Result<f64> {
    Ok(format_units(value, 27)?.parse::<f64>()?)
}

fn ilk_label(ilk: B256) -> String {
    let bytes: Vec<u8> = ilk.iter().copied().take_while(|b| *b != 0).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilk_label_round_trips() {
        let ilk = chain::ilk("ETH-A").unwrap();
        assert_eq!(ilk_label(ilk.ilk_bytes()), "ETH-A");
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(wad_f64(U256::from(10u128.pow(18))).unwrap(), 1.0);
        assert_eq!(
            ray_f64(U256::from(10u128.pow(27)) * U256::from(3u8)).unwrap(),
            3.0
        );
    }
}
