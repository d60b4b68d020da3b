//! Position creation on the fork: Maker vaults, Liquity troves, Aave
//! and Compound loans, plus savings deposits. Each flow tops the sender
//! up with collateral first so a fresh fork account can open straight
//! away.

pub mod aave;
pub mod compound;
pub mod liquity;
pub mod maker;
pub mod savings;

use anyhow::{Context, Result};

use crate::chain;
use crate::cli::{InfoCommand, PositionCommand};
use crate::config::Ctx;
use crate::swap;
use crate::tokens;

pub async fn run(ctx: &Ctx, cmd: PositionCommand) -> Result<()> {
    let provider = ctx.provider().await?;

    match cmd {
        PositionCommand::Maker { ilk, coll, debt } => {
            let ilk = chain::ilk(&ilk)?;
            let gem = chain::token(ilk.asset_symbol)?;
            let coll_amount = tokens::parse_amount(&coll, gem.decimals)?;
            let debt_wad = tokens::parse_amount(&debt, 18)?;
            // ETH collateral rides along as call value, anything else
            // has to sit on the sender before the proxy pulls it.
            if ilk.asset_symbol != "WETH" {
                swap::acquire(ctx, &provider, ilk.asset_symbol, coll_amount).await?;
            }
            maker::open_vault(ctx, &provider, ilk, coll_amount, debt_wad).await
        }
        PositionCommand::MakerSupply {
            ilk,
            vault_id,
            amount,
        } => {
            let ilk = chain::ilk(&ilk)?;
            let gem = chain::token(ilk.asset_symbol)?;
            let amount = tokens::parse_amount(&amount, gem.decimals)?;
            if ilk.asset_symbol != "WETH" {
                swap::acquire(ctx, &provider, ilk.asset_symbol, amount).await?;
            }
            maker::supply_collateral(ctx, &provider, ilk, vault_id, amount).await
        }
        PositionCommand::MakerWithdraw {
            ilk,
            vault_id,
            amount,
        } => {
            let ilk = chain::ilk(&ilk)?;
            let gem = chain::token(ilk.asset_symbol)?;
            let amount = tokens::parse_amount(&amount, gem.decimals)?;
            maker::withdraw_collateral(ctx, &provider, ilk, vault_id, amount).await
        }
        PositionCommand::Liquity { coll, debt } => {
            let coll_wei = tokens::parse_amount(&coll, 18)?;
            let debt_wad = tokens::parse_amount(&debt, 18)?;
            liquity::open_trove(ctx, &provider, coll_wei, debt_wad).await
        }
        PositionCommand::LiquityWithdraw { amount } => {
            let coll_wei = tokens::parse_amount(&amount, 18)?;
            liquity::withdraw_coll(ctx, &provider, coll_wei).await
        }
        PositionCommand::Aave {
            coll_symbol,
            coll_amount,
            debt_symbol,
            debt_amount,
        } => {
            let coll = chain::token(&coll_symbol)?;
            let debt = chain::token(&debt_symbol)?;
            let coll_amount = tokens::parse_amount(&coll_amount, coll.decimals)?;
            let debt_amount = tokens::parse_amount(&debt_amount, debt.decimals)?;
            swap::ensure_token_balance(ctx, &provider, &coll_symbol, coll_amount).await?;
            aave::create_position(ctx, &provider, coll.address, coll_amount, debt.address, debt_amount)
                .await
        }
        PositionCommand::Compound {
            coll_symbol,
            coll_amount,
            borrow_amount,
        } => {
            let coll = chain::token(&coll_symbol)?;
            let usdc = chain::token("USDC")?;
            let coll_amount = tokens::parse_amount(&coll_amount, coll.decimals)?;
            let borrow_amount = tokens::parse_amount(&borrow_amount, usdc.decimals)?;
            swap::ensure_token_balance(ctx, &provider, &coll_symbol, coll_amount).await?;
            compound::create_position(ctx, &provider, coll.address, coll_amount, borrow_amount).await
        }
    }
}

/// Deposit DAI into a savings protocol, buying the DAI first if needed.
pub async fn deposit_savings(ctx: &Ctx, protocol: &str, amount: &str) -> Result<()> {
    let provider = ctx.provider().await?;
    let protocol = savings::SavingsProtocol::from_name(protocol)?;
    let dai_amount = tokens::parse_amount(amount, 18)?;
    swap::ensure_token_balance(ctx, &provider, "DAI", dai_amount).await?;
    savings::deposit(ctx, &provider, protocol, dai_amount).await
}

pub async fn info(ctx: &Ctx, cmd: InfoCommand) -> Result<()> {
    match cmd {
        InfoCommand::Balance { token, account } => {
            tokens::print_balance(ctx, &token, account.as_deref()).await
        }
        InfoCommand::Vault { vault_id } => maker::print_vault(ctx, vault_id).await,
        InfoCommand::Trove { owner } => {
            let owner = owner
                .map(|o| o.parse().context("invalid --owner address"))
                .transpose()?;
            liquity::print_trove(ctx, owner).await
        }
        InfoCommand::Aave { owner } => {
            let owner = owner
                .map(|o| o.parse().context("invalid --owner address"))
                .transpose()?;
            aave::print_position(ctx, owner).await
        }
    }
}
