use alloy::primitives::{Address, U256, utils::format_units, utils::parse_units};
use alloy::providers::DynProvider;
use alloy::sol;
use anyhow::{Context, Result};

use crate::chain::{self, TokenInfo};
use crate::config::Ctx;
use crate::proxy::require_success;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IWETH {
        function deposit() external payable;
    }
}

// ── Amount parsing ───────────────────────────────────────────────────

/// Parse a whole-token decimal string ("1.5") into base units.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let parsed = parse_units(amount, decimals)
        .with_context(|| format!("parsing amount '{amount}'"))?;
    Ok(parsed.get_absolute())
}

// ── ERC20 helpers ────────────────────────────────────────────────────

pub async fn approve(
    ctx: &Ctx,
    provider: &DynProvider,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<()> {
    let erc20 = IERC20::new(token, provider);
    let receipt = erc20
        .approve(spender, amount)
        .from(ctx.sender.address())
        .send()
        .await
        .context("ERC20 approve send")?
        .get_receipt()
        .await
        .context("ERC20 approve receipt")?;
    require_success(&receipt, "approve")
}

pub async fn balance_of(provider: &DynProvider, token: Address, account: Address) -> Result<U256> {
    let erc20 = IERC20::new(token, provider);
    erc20
        .balanceOf(account)
        .call()
        .await
        .context("ERC20 balanceOf")
}

/// Wrap native ETH into WETH for the sender.
pub async fn deposit_to_weth(ctx: &Ctx, provider: &DynProvider, amount: U256) -> Result<()> {
    let weth = chain::token("WETH")?;
    let contract = IWETH::new(weth.address, provider);
    let receipt = contract
        .deposit()
        .from(ctx.sender.address())
        .value(amount)
        .send()
        .await
        .context("WETH deposit send")?
        .get_receipt()
        .await
        .context("WETH deposit receipt")?;
    require_success(&receipt, "weth deposit")
}

// ── Balance printing ─────────────────────────────────────────────────

pub async fn print_balance(ctx: &Ctx, symbol: &str, account: Option<&str>) -> Result<()> {
    let token: TokenInfo = chain::token(symbol)?;
    let account: Address = match account {
        Some(a) => a.parse().context("invalid --account address")?,
        None => ctx.sender.address(),
    };

    let provider = chain::read_provider(ctx.rpc_url())?;
    let erc20 = IERC20::new(token.address, &provider);
    let balance = erc20
        .balanceOf(account)
        .call()
        .await
        .context("ERC20 balanceOf")?;

    println!(
        "Balance: {} | {} {}",
        balance,
        format_units(balance, token.decimals)?,
        symbol.to_uppercase(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_scales_by_decimals() {
        assert_eq!(
            parse_amount("1", 18).unwrap(),
            U256::from(10u128.pow(18))
        );
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert!(parse_amount("ten", 18).is_err());
    }
}
