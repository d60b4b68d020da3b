use anyhow::{Context, Result};
use clap::Parser;

use forkooor::cli::{Cli, Command};
use forkooor::config::Ctx;
use forkooor::{fork, positions, subs, swap};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    // Install rustls crypto provider (required by reqwest's TLS)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    match cli.command {
        // Fork commands manage the config file itself; everything else
        // loads it.
        Command::Fork(cmd) => fork::run(&cli.config, cmd).await,
        Command::Position(cmd) => {
            let ctx = Ctx::load(&cli.config, cli.sender.as_deref())?;
            positions::run(&ctx, cmd).await
        }
        Command::Savings { protocol, amount } => {
            let ctx = Ctx::load(&cli.config, cli.sender.as_deref())?;
            positions::deposit_savings(&ctx, &protocol, &amount).await
        }
        Command::Sell { src, dest, amount } => {
            let ctx = Ctx::load(&cli.config, cli.sender.as_deref())?;
            let provider = ctx.provider().await?;
            swap::sell(&ctx, &provider, &src, &dest, &amount).await
        }
        Command::Sub(cmd) => {
            let ctx = Ctx::load(&cli.config, cli.sender.as_deref())?;
            subs::run(&ctx, cmd).await
        }
        Command::Info(cmd) => {
            let ctx = Ctx::load(&cli.config, cli.sender.as_deref())?;
            positions::info(&ctx, cmd).await
        }
    }
}
