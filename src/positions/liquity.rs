use alloy::primitives::{Address, U256, utils::format_units, utils::parse_units};
use alloy::providers::DynProvider;
use alloy::sol;
use anyhow::{Context, Result};

use crate::chain::{self, liquity};
use crate::config::Ctx;
use crate::proxy::require_success;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IBorrowerOperations {
        function openTrove(uint256 _maxFeePercentage, uint256 _LUSDAmount, address _upperHint, address _lowerHint) external payable;
        function withdrawColl(uint256 _collWithdrawal, address _upperHint, address _lowerHint) external;
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ITroveManager {
        function getTroveColl(address _borrower) external view returns (uint256);
        function getTroveDebt(address _borrower) external view returns (uint256);
        function getTroveStatus(address _borrower) external view returns (uint256);
    }
}

const TROVE_STATUS_ACTIVE: u64 = 1;

/// Open a trove owned by the sender: ETH collateral in, LUSD debt out.
pub async fn open_trove(
    ctx: &Ctx,
    provider: &DynProvider,
    coll_wei: U256,
    debt_wad: U256,
) -> Result<()> {
    let owner = ctx.sender.address();

    let trove_manager = ITroveManager::new(liquity::trove_manager(), provider);
    let status = trove_manager
        .getTroveStatus(owner)
        .call()
        .await
        .context("getTroveStatus")?;
    if status == U256::from(TROVE_STATUS_ACTIVE) {
        println!("Trove already open for {owner}");
        return print_trove(ctx, Some(owner)).await;
    }

    // zero hints make the sorted-list insert walk the list; fine on a fork
    let max_fee = parse_units("5", 16)?.get_absolute();
    let borrower_ops = IBorrowerOperations::new(liquity::borrower_operations(), provider);
    let receipt = borrower_ops
        .openTrove(max_fee, debt_wad, Address::ZERO, Address::ZERO)
        .from(owner)
        .value(coll_wei)
        .gas(8_000_000)
        .send()
        .await
        .context("openTrove send")?
        .get_receipt()
        .await
        .context("openTrove receipt")?;
    require_success(&receipt, "openTrove")?;

    println!("Trove created for {owner}");
    print_trove(ctx, Some(owner)).await
}

/// Pull ETH collateral out of the sender's trove.
pub async fn withdraw_coll(ctx: &Ctx, provider: &DynProvider, coll_wei: U256) -> Result<()> {
    let owner = ctx.sender.address();

    let borrower_ops = IBorrowerOperations::new(liquity::borrower_operations(), provider);
    let receipt = borrower_ops
        .withdrawColl(coll_wei, Address::ZERO, Address::ZERO)
        .from(owner)
        .gas(8_000_000)
        .send()
        .await
        .context("withdrawColl send")?
        .get_receipt()
        .await
        .context("withdrawColl receipt")?;
    require_success(&receipt, "withdrawColl")?;

    println!("Withdrew {} ETH from trove", format_units(coll_wei, 18)?);
    print_trove(ctx, Some(owner)).await
}

/// Print the trove held by `owner` (the configured sender by default).
pub async fn print_trove(ctx: &Ctx, owner: Option<Address>) -> Result<()> {
    let owner = owner.unwrap_or_else(|| ctx.sender.address());
    let provider = chain::read_provider(ctx.rpc_url())?;
    let trove_manager = ITroveManager::new(liquity::trove_manager(), &provider);

    let status = trove_manager
        .getTroveStatus(owner)
        .call()
        .await
        .context("getTroveStatus")?;
    if status != U256::from(TROVE_STATUS_ACTIVE) {
        println!("No active trove for {owner}");
        return Ok(());
    }

    let coll = trove_manager
        .getTroveColl(owner)
        .call()
        .await
        .context("getTroveColl")?;
    let debt = trove_manager
        .getTroveDebt(owner)
        .call()
        .await
        .context("getTroveDebt")?;

    println!("Trove owner: {owner}");
    println!("Coll amount: {} ETH", format_units(coll, 18)?);
    println!("Debt amount: {} LUSD", format_units(debt, 18)?);
    Ok(())
}
