use alloy::primitives::{Address, U256, utils::format_units};
use alloy::providers::DynProvider;
use alloy::sol;
use anyhow::{Context, Result};

use crate::chain;
use crate::config::Ctx;
use crate::proxy::require_success;
use crate::tokens;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IComet {
        function supply(address asset, uint256 amount) external;
        function withdraw(address asset, uint256 amount) external;
        function baseToken() external view returns (address);
        function borrowBalanceOf(address account) external view returns (uint256);
        function collateralBalanceOf(address account, address asset) external view returns (uint128);
    }
}

/// Supply collateral to the USDC Comet and borrow base USDC against it.
/// Borrowing on Comet is a withdrawal of base token beyond the supplied
/// balance.
pub async fn create_position(
    ctx: &Ctx,
    provider: &DynProvider,
    coll_asset: Address,
    coll_amount: U256,
    borrow_amount: U256,
) -> Result<()> {
    let from = ctx.sender.address();
    let comet_addr = chain::comet_usdc_addr();
    let comet = IComet::new(comet_addr, provider);

    tokens::approve(ctx, provider, coll_asset, comet_addr, coll_amount).await?;
    let receipt = comet
        .supply(coll_asset, coll_amount)
        .from(from)
        .send()
        .await
        .context("comet supply send")?
        .get_receipt()
        .await
        .context("comet supply receipt")?;
    require_success(&receipt, "comet supply")?;
    println!("Supplied {} units of collateral", coll_amount);

    let base = comet.baseToken().call().await.context("comet.baseToken")?;
    let receipt = comet
        .withdraw(base, borrow_amount)
        .from(from)
        .gas(500_000)
        .send()
        .await
        .context("comet withdraw send")?
        .get_receipt()
        .await
        .context("comet withdraw receipt")?;
    require_success(&receipt, "comet withdraw")?;
    println!("Borrowed {} units of USDC", borrow_amount);

    print_position(ctx, Some(from), Some(coll_asset)).await
}

/// Print an account's Comet borrow balance and, when a collateral asset
/// is given, its collateral balance.
pub async fn print_position(
    ctx: &Ctx,
    owner: Option<Address>,
    coll_asset: Option<Address>,
) -> Result<()> {
    let owner = owner.unwrap_or_else(|| ctx.sender.address());
    let provider = chain::read_provider(ctx.rpc_url())?;
    let comet = IComet::new(chain::comet_usdc_addr(), &provider);

    let debt = comet
        .borrowBalanceOf(owner)
        .call()
        .await
        .context("borrowBalanceOf")?;
    println!("User: {owner}");
    println!("USDC debt: {}", format_units(debt, 6)?);
    if let Some(asset) = coll_asset {
        let coll = comet
            .collateralBalanceOf(owner, asset)
            .call()
            .await
            .context("collateralBalanceOf")?;
        println!("Collateral ({asset}): {coll}");
    }
    Ok(())
}
