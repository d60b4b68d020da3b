use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use alloy::sol;
use anyhow::{Context, Result, bail};

use crate::chain;
use crate::config::Ctx;
use crate::proxy::require_success;
use crate::tokens;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IYVault {
        function deposit(uint256 amount) external returns (uint256);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IRariFundManager {
        function deposit(string calldata currencyCode, uint256 amount) external;
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IMasset {
        function mint(address _input, uint256 _inputQuantity, uint256 _minOutputQuantity, address _recipient) external returns (uint256 mintOutput);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ISavingsContract {
        function depositSavings(uint256 _underlying, address _beneficiary) external returns (uint256 creditsIssued);
    }
}

// ── Savings protocols ────────────────────────────────────────────────

/// Savings protocols the repay bundle can pull from. Each variant knows
/// its own deposit route and its bundle id in the strategy storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsProtocol {
    Yearn,
    Rari,
    MStable,
}

/// Typed deposit parameters per protocol — the contracts a DAI deposit
/// flows through.
#[derive(Debug, Clone, Copy)]
pub enum DepositRoute {
    Yearn { vault: Address },
    Rari { fund_manager: Address },
    MStable { musd: Address, imusd: Address },
}

impl SavingsProtocol {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "yearn" => Ok(SavingsProtocol::Yearn),
            "rari" => Ok(SavingsProtocol::Rari),
            "mstable" => Ok(SavingsProtocol::MStable),
            other => bail!("Unknown savings protocol '{other}'. Use yearn, rari or mstable."),
        }
    }

    /// Bundle id of the repay-from-savings strategy bundle backed by
    /// this protocol.
    pub fn bundle_id(&self) -> u64 {
        match self {
            SavingsProtocol::Yearn => 0,
            SavingsProtocol::MStable => 1,
            SavingsProtocol::Rari => 2,
        }
    }

    pub fn deposit_route(&self) -> DepositRoute {
        fn addr(s: &str) -> Address {
            s.parse().expect("hardcoded address")
        }
        match self {
            SavingsProtocol::Yearn => DepositRoute::Yearn {
                vault: addr("0xdA816459F1AB5631232FE5e97a05BBBb94970c95"),
            },
            SavingsProtocol::Rari => DepositRoute::Rari {
                fund_manager: addr("0xB465BAF04C087Ce3ed1C266F96CA43f4847D9635"),
            },
            SavingsProtocol::MStable => DepositRoute::MStable {
                musd: addr("0xe2f2a5C287993345a840Db3B0845fbC70f5935a5"),
                imusd: addr("0x30647a72Dc82d7Fbb1123EA74716aB8A317Eac19"),
            },
        }
    }
}

impl std::fmt::Display for SavingsProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SavingsProtocol::Yearn => "yearn",
            SavingsProtocol::Rari => "rari",
            SavingsProtocol::MStable => "mstable",
        };
        f.write_str(name)
    }
}

// ── Deposit ──────────────────────────────────────────────────────────

/// Deposit DAI into the given savings protocol from the sender account.
pub async fn deposit(
    ctx: &Ctx,
    provider: &DynProvider,
    protocol: SavingsProtocol,
    dai_amount: U256,
) -> Result<()> {
    let dai = chain::token("DAI")?.address;
    let from = ctx.sender.address();

    match protocol.deposit_route() {
        DepositRoute::Yearn { vault } => {
            tokens::approve(ctx, provider, dai, vault, dai_amount).await?;
            let yvault = IYVault::new(vault, provider);
            let receipt = yvault
                .deposit(dai_amount)
                .from(from)
                .send()
                .await
                .context("yearn deposit send")?
                .get_receipt()
                .await
                .context("yearn deposit receipt")?;
            require_success(&receipt, "yearn deposit")?;
        }

        DepositRoute::Rari { fund_manager } => {
            tokens::approve(ctx, provider, dai, fund_manager, dai_amount).await?;
            let fund = IRariFundManager::new(fund_manager, provider);
            let receipt = fund
                .deposit("DAI".to_string(), dai_amount)
                .from(from)
                .send()
                .await
                .context("rari deposit send")?
                .get_receipt()
                .await
                .context("rari deposit receipt")?;
            require_success(&receipt, "rari deposit")?;
        }

        DepositRoute::MStable { musd, imusd } => {
            // DAI -> mUSD mint, then park the mUSD in the save contract
            tokens::approve(ctx, provider, dai, musd, dai_amount).await?;
            let masset = IMasset::new(musd, provider);
            let receipt = masset
                .mint(dai, dai_amount, U256::ZERO, from)
                .from(from)
                .send()
                .await
                .context("mUSD mint send")?
                .get_receipt()
                .await
                .context("mUSD mint receipt")?;
            require_success(&receipt, "mUSD mint")?;

            let musd_balance = tokens::balance_of(provider, musd, from).await?;
            tokens::approve(ctx, provider, musd, imusd, musd_balance).await?;
            let save = ISavingsContract::new(imusd, provider);
            let receipt = save
                .depositSavings(musd_balance, from)
                .from(from)
                .send()
                .await
                .context("imUSD deposit send")?
                .get_receipt()
                .await
                .context("imUSD deposit receipt")?;
            require_success(&receipt, "imUSD deposit")?;
        }
    }

    println!(
        "Deposited {} DAI into {protocol}",
        alloy::primitives::utils::format_units(dai_amount, 18)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!(
            SavingsProtocol::from_name("Yearn").unwrap(),
            SavingsProtocol::Yearn
        );
        assert_eq!(
            SavingsProtocol::from_name("MSTABLE").unwrap(),
            SavingsProtocol::MStable
        );
        assert!(SavingsProtocol::from_name("aave").is_err());
    }

    #[test]
    fn bundle_ids_match_deployment_order() {
        assert_eq!(SavingsProtocol::Yearn.bundle_id(), 0);
        assert_eq!(SavingsProtocol::MStable.bundle_id(), 1);
        assert_eq!(SavingsProtocol::Rari.bundle_id(), 2);
    }

    #[test]
    fn each_protocol_has_its_own_route() {
        assert!(matches!(
            SavingsProtocol::Yearn.deposit_route(),
            DepositRoute::Yearn { .. }
        ));
        assert!(matches!(
            SavingsProtocol::Rari.deposit_route(),
            DepositRoute::Rari { .. }
        ));
        assert!(matches!(
            SavingsProtocol::MStable.deposit_route(),
            DepositRoute::MStable { .. }
        ));
    }
}
