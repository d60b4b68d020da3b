use alloy::primitives::{U256, utils::parse_units};
use alloy::providers::{DynProvider, Provider};
use alloy::sol;
use anyhow::{Context, Result};
use chrono::Utc;

use crate::chain;
use crate::config::Ctx;
use crate::proxy::require_success;
use crate::tokens;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IUniswapV2Router02 {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] path,
            address to,
            uint256 deadline
        ) external returns (uint256[] amounts);

        function swapETHForExactTokens(
            uint256 amountOut,
            address[] path,
            address to,
            uint256 deadline
        ) external payable returns (uint256[] amounts);
    }
}

fn deadline() -> U256 {
    U256::from(Utc::now().timestamp() as u64 + 1200)
}

/// Market-sell `amount` of `src` for `dest` through the V2 router. Min
/// out is zero; on a private fork there's nobody to sandwich.
pub async fn sell(
    ctx: &Ctx,
    provider: &DynProvider,
    src_symbol: &str,
    dest_symbol: &str,
    amount: &str,
) -> Result<()> {
    let src = chain::token(src_symbol)?;
    let dest = chain::token(dest_symbol)?;
    let amount_in = tokens::parse_amount(amount, src.decimals)?;
    let from = ctx.sender.address();

    tokens::approve(ctx, provider, src.address, chain::uniswap_v2_router(), amount_in).await?;

    let router = IUniswapV2Router02::new(chain::uniswap_v2_router(), provider);
    let receipt = router
        .swapExactTokensForTokens(
            amount_in,
            U256::ZERO,
            vec![src.address, dest.address],
            from,
            deadline(),
        )
        .from(from)
        .gas(600_000)
        .send()
        .await
        .context("swap send")?
        .get_receipt()
        .await
        .context("swap receipt")?;
    require_success(&receipt, "uniswap sell")?;

    println!("Sold {amount} {src_symbol} for {dest_symbol}");
    tokens::print_balance(ctx, src_symbol, None).await?;
    tokens::print_balance(ctx, dest_symbol, None).await?;
    Ok(())
}

/// Best-effort purchase of an exact token amount, paid in the sender's
/// native ETH (which `fork top-up` hands out freely). A thin or missing
/// V2 pool is reported but does not abort the surrounding flow; the
/// position open that follows will fail loudly on its own if the
/// collateral really is missing.
pub async fn acquire(
    ctx: &Ctx,
    provider: &DynProvider,
    symbol: &str,
    amount: U256,
) -> Result<()> {
    let token = chain::token(symbol)?;
    let from = ctx.sender.address();

    let eth_balance = provider.get_balance(from).await.context("get_balance")?;
    let gas_reserve: U256 = parse_units("1", 18)?.get_absolute();
    if eth_balance <= gas_reserve {
        eprintln!("Warning: not enough ETH to buy {symbol}, skipping acquisition");
        return Ok(());
    }
    let budget = eth_balance - gas_reserve;

    let weth = chain::token("WETH")?;
    let router = IUniswapV2Router02::new(chain::uniswap_v2_router(), provider);
    let result = async {
        let receipt = router
            .swapETHForExactTokens(amount, vec![weth.address, token.address], from, deadline())
            .from(from)
            .value(budget)
            .gas(600_000)
            .send()
            .await
            .context("swap send")?
            .get_receipt()
            .await
            .context("swap receipt")?;
        require_success(&receipt, "uniswap buy")
    }
    .await;

    match result {
        Ok(()) => {
            println!("Bought {} units of {symbol} for ETH", amount);
            Ok(())
        }
        Err(err) => {
            eprintln!("Warning: could not buy {symbol} through Uniswap: {err:#}");
            Ok(())
        }
    }
}

/// Top up the sender with WETH (wrap) or an arbitrary token (buy) so a
/// position open has collateral to pull.
pub async fn ensure_token_balance(
    ctx: &Ctx,
    provider: &DynProvider,
    symbol: &str,
    amount: U256,
) -> Result<()> {
    let token = chain::token(symbol)?;
    let held = tokens::balance_of(provider, token.address, ctx.sender.address()).await?;
    if held >= amount {
        return Ok(());
    }
    let missing = amount - held;

    let weth = chain::token("WETH")?;
    if token.address == weth.address {
        tokens::deposit_to_weth(ctx, provider, missing).await
    } else {
        acquire(ctx, provider, symbol, missing).await
    }
}
