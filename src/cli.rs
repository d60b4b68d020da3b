use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fork harness for the DeFi automation stack — spin up a forked chain,
/// open positions, and drive strategy subscriptions through the on-chain
/// subscription registry.
#[derive(Parser)]
#[command(name = "forkooor", version, about)]
pub struct Cli {
    /// Path to the fork config file (written by `fork new` / `fork use`)
    #[arg(long, global = true, default_value = "forkooor.json")]
    pub config: PathBuf,

    /// Act as this account instead of the configured signer.
    /// On a fork the account is impersonated, no key needed.
    #[arg(long, global = true)]
    pub sender: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the forked chain the harness runs against
    #[command(subcommand)]
    Fork(ForkCommand),

    /// Open leveraged positions on the fork
    #[command(subcommand)]
    Position(PositionCommand),

    /// Deposit into a savings protocol
    Savings {
        /// Savings protocol: yearn, rari, or mstable
        #[arg(long)]
        protocol: String,

        /// DAI amount to deposit (whole tokens)
        #[arg(long)]
        amount: String,
    },

    /// Sell one token for another through Uniswap V2
    Sell {
        /// Token symbol to sell
        #[arg(long)]
        src: String,

        /// Token symbol to buy
        #[arg(long)]
        dest: String,

        /// Amount of src token to sell (whole tokens)
        #[arg(long)]
        amount: String,
    },

    /// Create, update and toggle strategy subscriptions
    #[command(subcommand)]
    Sub(SubCommand),

    /// Inspect balances and position state
    #[command(subcommand)]
    Info(InfoCommand),
}

#[derive(Subcommand)]
pub enum ForkCommand {
    /// Create a new Tenderly fork and save it to the config file
    New {
        /// Network to fork: mainnet, optimism, or arbitrum
        #[arg(long, default_value = "mainnet")]
        network: String,

        /// Accounts to top up with ETH after forking
        #[arg(long)]
        account: Vec<String>,
    },

    /// Register an already-running fork (e.g. a local Anvil) by RPC URL
    Use {
        /// RPC endpoint of the fork
        #[arg(long)]
        rpc_url: String,

        /// Network the fork was created from
        #[arg(long, default_value = "mainnet")]
        network: String,
    },

    /// Top up an account with native ETH on the fork
    TopUp {
        /// Account to fund
        #[arg(long)]
        account: String,

        /// ETH amount (whole tokens)
        #[arg(long, default_value = "100")]
        amount: String,
    },
}

#[derive(Subcommand)]
pub enum PositionCommand {
    /// Open a Maker vault (lock collateral, draw DAI)
    Maker {
        /// Collateral type, e.g. ETH-A or WBTC-A
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// Collateral amount (whole tokens)
        #[arg(long)]
        coll: String,

        /// DAI debt to draw (whole tokens)
        #[arg(long)]
        debt: String,
    },

    /// Supply more collateral to an existing Maker vault
    MakerSupply {
        /// Collateral type of the vault
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// Vault id
        #[arg(long)]
        vault_id: u64,

        /// Collateral amount to add (whole tokens)
        #[arg(long)]
        amount: String,
    },

    /// Withdraw collateral from an existing Maker vault
    MakerWithdraw {
        /// Collateral type of the vault
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// Vault id
        #[arg(long)]
        vault_id: u64,

        /// Collateral amount to free (whole tokens)
        #[arg(long)]
        amount: String,
    },

    /// Open a Liquity trove (ETH collateral, LUSD debt)
    Liquity {
        /// ETH collateral amount (whole tokens)
        #[arg(long)]
        coll: String,

        /// LUSD debt to draw (whole tokens)
        #[arg(long)]
        debt: String,
    },

    /// Withdraw ETH collateral from the sender's Liquity trove
    LiquityWithdraw {
        /// ETH amount to withdraw (whole tokens)
        #[arg(long)]
        amount: String,
    },

    /// Create an Aave V3 supply + borrow position
    Aave {
        /// Collateral token symbol
        #[arg(long, default_value = "WETH")]
        coll_symbol: String,

        /// Collateral amount (whole tokens)
        #[arg(long)]
        coll_amount: String,

        /// Debt token symbol
        #[arg(long, default_value = "DAI")]
        debt_symbol: String,

        /// Debt amount (whole tokens)
        #[arg(long)]
        debt_amount: String,
    },

    /// Create a Compound V3 (Comet) supply + borrow position
    Compound {
        /// Collateral token symbol
        #[arg(long, default_value = "WETH")]
        coll_symbol: String,

        /// Collateral amount (whole tokens)
        #[arg(long)]
        coll_amount: String,

        /// USDC amount to borrow (whole tokens)
        #[arg(long)]
        borrow_amount: String,
    },
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Subscribe a Maker vault to the repay-from-savings bundle
    Savings {
        /// Vault id to protect
        #[arg(long)]
        vault_id: u64,

        /// Savings protocol backing the repay: yearn, rari, or mstable
        #[arg(long)]
        protocol: String,

        /// Ratio (in percent, e.g. "200") under which the repay triggers
        #[arg(long)]
        min_ratio: String,

        /// Ratio (in percent) the repay aims for
        #[arg(long)]
        target_ratio: String,
    },

    /// Subscribe a Maker vault to a close-at-price strategy
    McdClose {
        /// Vault id to close
        #[arg(long)]
        vault_id: u64,

        /// Collateral type of the vault, e.g. ETH-A
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// Trigger price in USD (e.g. "1800")
        #[arg(long)]
        price: String,

        /// Trigger when price goes "over" or "under"
        #[arg(long)]
        price_state: String,

        /// Close to collateral instead of DAI
        #[arg(long)]
        to_coll: bool,
    },

    /// Subscribe a Maker vault to a trailing-stop close strategy
    McdTrailingClose {
        /// Vault id to close
        #[arg(long)]
        vault_id: u64,

        /// Collateral type of the vault, e.g. ETH-A
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// Drawdown from peak (in percent, e.g. "5") that triggers the close
        #[arg(long)]
        percentage: String,

        /// Close to collateral instead of DAI
        #[arg(long)]
        to_coll: bool,
    },

    /// Re-encode and update an existing repay-from-savings subscription
    UpdateSavings {
        /// Subscription id to update
        #[arg(long)]
        sub_id: u64,

        /// Vault id the subscription protects
        #[arg(long)]
        vault_id: u64,

        /// Savings protocol: yearn, rari, or mstable
        #[arg(long)]
        protocol: String,

        /// New minimum ratio (percent)
        #[arg(long)]
        min_ratio: String,

        /// New target ratio (percent)
        #[arg(long)]
        target_ratio: String,
    },

    /// Re-encode and update an existing close-at-price subscription
    UpdateMcdClose {
        /// Subscription id to update
        #[arg(long)]
        sub_id: u64,

        /// Vault id the subscription closes
        #[arg(long)]
        vault_id: u64,

        /// Collateral type of the vault
        #[arg(long, default_value = "ETH-A")]
        ilk: String,

        /// New trigger price in USD
        #[arg(long)]
        price: String,

        /// Trigger when price goes "over" or "under"
        #[arg(long)]
        price_state: String,

        /// Close to collateral instead of DAI
        #[arg(long)]
        to_coll: bool,
    },

    /// Enable an existing subscription
    Activate {
        #[arg(long)]
        sub_id: u64,
    },

    /// Disable an existing subscription (record stays, flag flips)
    Deactivate {
        #[arg(long)]
        sub_id: u64,
    },

    /// Print a stored subscription record
    Get {
        #[arg(long)]
        sub_id: u64,
    },
}

#[derive(Subcommand)]
pub enum InfoCommand {
    /// Print an account's token balance
    Balance {
        /// Token symbol, e.g. DAI
        #[arg(long)]
        token: String,

        /// Account to query (defaults to the configured signer)
        #[arg(long)]
        account: Option<String>,
    },

    /// Print a Maker vault's collateral, debt and ratio
    Vault {
        #[arg(long)]
        vault_id: u64,
    },

    /// Print the Liquity trove held by an account
    Trove {
        /// Trove owner (defaults to the configured signer)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Print an account's Aave V3 loan data
    Aave {
        /// Position owner (defaults to the configured signer)
        #[arg(long)]
        owner: Option<String>,
    },
}
