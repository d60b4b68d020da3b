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
    contract IPoolAddressesProvider {
        function getPool() external view returns (address);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IAavePool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralBase,
            uint256 totalDebtBase,
            uint256 availableBorrowsBase,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );
    }
}

const VARIABLE_RATE_MODE: u64 = 2;

async fn pool_addr(ctx: &Ctx, provider: &DynProvider) -> Result<Address> {
    let market = IPoolAddressesProvider::new(chain::aave_market_addr(ctx.network()), provider);
    market.getPool().call().await.context("market.getPool")
}

/// Supply collateral and draw variable-rate debt against it, both for
/// the sender account directly.
pub async fn create_position(
    ctx: &Ctx,
    provider: &DynProvider,
    coll_asset: Address,
    coll_amount: U256,
    debt_asset: Address,
    debt_amount: U256,
) -> Result<()> {
    let from = ctx.sender.address();
    let pool_addr = pool_addr(ctx, provider).await?;
    let pool = IAavePool::new(pool_addr, provider);

    tokens::approve(ctx, provider, coll_asset, pool_addr, coll_amount).await?;
    let receipt = pool
        .supply(coll_asset, coll_amount, from, 0)
        .from(from)
        .send()
        .await
        .context("aave supply send")?
        .get_receipt()
        .await
        .context("aave supply receipt")?;
    require_success(&receipt, "aave supply")?;
    println!("Supplied {} units of collateral", coll_amount);

    let receipt = pool
        .borrow(debt_asset, debt_amount, U256::from(VARIABLE_RATE_MODE), 0, from)
        .from(from)
        .gas(500_000)
        .send()
        .await
        .context("aave borrow send")?
        .get_receipt()
        .await
        .context("aave borrow receipt")?;
    require_success(&receipt, "aave borrow")?;
    println!("Borrowed {} units of debt", debt_amount);

    print_position(ctx, Some(from)).await
}

/// Print an account's aggregate Aave V3 loan data (base-currency terms).
pub async fn print_position(ctx: &Ctx, owner: Option<Address>) -> Result<()> {
    let owner = owner.unwrap_or_else(|| ctx.sender.address());
    let provider = chain::read_provider(ctx.rpc_url())?;

    let market =
        IPoolAddressesProvider::new(chain::aave_market_addr(ctx.network()), &provider);
    let pool_addr = market.getPool().call().await.context("market.getPool")?;
    let pool = IAavePool::new(pool_addr, &provider);

    let data = pool
        .getUserAccountData(owner)
        .call()
        .await
        .context("getUserAccountData")?;

    println!("User: {owner}");
    println!(
        "Collateral: ${}",
        format_units(data.totalCollateralBase, 8)?
    );
    println!("Debt:       ${}", format_units(data.totalDebtBase, 8)?);
    if data.totalDebtBase > U256::ZERO {
        let hf = format_units(data.healthFactor, 18)?.parse::<f64>()?;
        println!("Health factor: {hf:.3}");
    } else {
        println!("Health factor: no debt");
    }
    Ok(())
}
