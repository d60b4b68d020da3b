use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

// ── Networks ─────────────────────────────────────────────────────────

/// Networks the automation stack is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Optimism,
    Arbitrum,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Optimism => 10,
            Network::Arbitrum => 42161,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Network::Mainnet),
            "optimism" => Ok(Network::Optimism),
            "arbitrum" => Ok(Network::Arbitrum),
            other => bail!("Unknown network '{other}'. Use mainnet, optimism or arbitrum."),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Optimism => "optimism",
            Network::Arbitrum => "arbitrum",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Deployed contract addresses ──────────────────────────────────────

fn addr(s: &str) -> Address {
    s.parse().expect("hardcoded address")
}

/// Address of the automation stack's name registry on each network.
/// Everything else in the stack is resolved through it at runtime.
pub fn registry_addr(network: Network) -> Address {
    match network {
        Network::Mainnet => addr("0x287778F121F134C66212FB16c9b53eC991D32f5b"),
        Network::Optimism => addr("0xAf707Ee480204Ed6e2640B53cE86F680D28Afcbd"),
        Network::Arbitrum => addr("0xBF1CaC12DB60819Bfa71A328282ecbc1D40443aA"),
    }
}

/// MakerDAO proxy registry — maps owners to their DSProxy.
pub fn proxy_registry_addr() -> Address {
    addr("0x4678f0a6958e4D2Bc4F1BAF7Bc52E8F3564f3fE4")
}

/// Maker protocol core (mainnet only — vault commands are mainnet-scoped).
pub mod maker {
    use super::{Address, addr};

    pub fn cdp_manager() -> Address {
        addr("0x5ef30b9986345249bc32d8928B7ee64DE9435E39")
    }
    pub fn vat() -> Address {
        addr("0x35D1b3F3D7966A1DFe207aa4514C12a259A0492B")
    }
    pub fn spotter() -> Address {
        addr("0x65C79fcb50Ca1594B025960e539eD7A9a6D434A3")
    }
    pub fn jug() -> Address {
        addr("0x19c0976f590D67707E62397C87829d896Dc0f1F1")
    }
    pub fn dai_join() -> Address {
        addr("0x9759A6Ac90977b93B58547b4A71c78317f391A28")
    }
    pub fn proxy_actions() -> Address {
        addr("0x82ecD135Dce65Fbc6DbdD0e4237E0AF93FFD5038")
    }
    pub fn get_cdps() -> Address {
        addr("0x36a724Bd100c39f0Ea4D3A20F7097eE01A8Ff573")
    }
}

/// Liquity protocol core (mainnet).
pub mod liquity {
    use super::{Address, addr};

    pub fn borrower_operations() -> Address {
        addr("0x24179CD81c9e782A4096035f7eC97fB8B783e007")
    }
    pub fn trove_manager() -> Address {
        addr("0xA39739EF8b0231DbFA0DcdA07d7e29faAbCf4bb2")
    }
}

/// Aave V3 PoolAddressesProvider (the "market").
pub fn aave_market_addr(network: Network) -> Address {
    match network {
        Network::Mainnet => addr("0x2f39d218133AFaB8F2B819B1066c7E434Ad94E9e"),
        Network::Optimism | Network::Arbitrum => {
            addr("0xa97684ead0e402dC232d5A977953DF7ECBaB3CDb")
        }
    }
}

/// Compound V3 USDC market (mainnet).
pub fn comet_usdc_addr() -> Address {
    addr("0xc3d688B66703497DAA19211EEdff47f25384cdc3")
}

/// Uniswap V2 router (mainnet).
pub fn uniswap_v2_router() -> Address {
    addr("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D")
}

/// Chainlink feed registry BTC denomination. Price triggers on WBTC
/// collateral are quoted against this, not the WBTC token address.
pub fn btc_denomination() -> Address {
    addr("0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB")
}

/// Chainlink feed registry ETH denomination. Feed lookups for WETH
/// collateral go through this, not the WETH token address.
pub fn eth_denomination() -> Address {
    addr("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE")
}

/// Chainlink on-chain feed registry (mainnet).
pub fn chainlink_feed_registry() -> Address {
    addr("0x47Fb2585D2C56Fe188D0E6ec628a38b74fCeeeDf")
}

/// USD quote denomination in the Chainlink feed registry.
pub fn chainlink_usd_quote() -> Address {
    addr("0x0000000000000000000000000000000000000348")
}

// ── Token registry ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub address: Address,
    pub decimals: u8,
}

/// Resolve a token symbol to its mainnet address and decimals.
pub fn token(symbol: &str) -> Result<TokenInfo> {
    let (address, decimals) = match symbol.to_uppercase().as_str() {
        "WETH" | "ETH" => ("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
        "DAI" => ("0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
        "USDC" => ("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
        "WBTC" => ("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", 8),
        "WSTETH" => ("0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0", 18),
        "LUSD" => ("0x5f98805A4E8be255a32880FDeC7F6728C6568bA0", 18),
        "MUSD" => ("0xe2f2a5C287993345a840Db3B0845fbC70f5935a5", 18),
        other => bail!("Unknown token symbol '{other}'"),
    };
    Ok(TokenInfo {
        address: addr(address),
        decimals,
    })
}

// ── Ilk registry ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct IlkInfo {
    pub label: &'static str,
    pub asset_symbol: &'static str,
    /// Gem join adapter for this collateral type.
    pub join: Address,
}

impl IlkInfo {
    /// The ilk identifier as Maker stores it: ascii label, right-padded.
    pub fn ilk_bytes(&self) -> B256 {
        let mut out = [0u8; 32];
        out[..self.label.len()].copy_from_slice(self.label.as_bytes());
        B256::from(out)
    }
}

/// Supported Maker collateral types.
pub fn ilk(label: &str) -> Result<IlkInfo> {
    let info = match label.to_uppercase().as_str() {
        "ETH-A" => IlkInfo {
            label: "ETH-A",
            asset_symbol: "WETH",
            join: addr("0x2F0b23f53734252Bda2277357e97e1517d6B042A"),
        },
        "WBTC-A" => IlkInfo {
            label: "WBTC-A",
            asset_symbol: "WBTC",
            join: addr("0xBF72Da2Bd84c5170618Fbe5914B0ECA9638d5eb5"),
        },
        "WSTETH-A" => IlkInfo {
            label: "WSTETH-A",
            asset_symbol: "WSTETH",
            join: addr("0x10CD5fbe1b404B7E19Ef964B63939907bdaf42E2"),
        },
        other => bail!("Unsupported ilk '{other}'. Use ETH-A, WBTC-A or WSTETH-A."),
    };
    Ok(info)
}

// ── Providers ────────────────────────────────────────────────────────

/// Read-only provider for view calls.
pub fn read_provider(rpc_url: &str) -> Result<impl Provider + Clone + use<>> {
    Ok(ProviderBuilder::new().connect_http(rpc_url.parse().context("invalid RPC URL")?))
}

/// Provider with a local signer attached.
pub fn write_provider(rpc_url: &str, private_key: &str) -> Result<impl Provider + Clone + use<>> {
    let signer: PrivateKeySigner = private_key
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid private key: {e}"))?;
    let wallet = EthereumWallet::from(signer);
    Ok(ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(rpc_url.parse().context("invalid RPC URL")?))
}

// ── Fork admin RPC ───────────────────────────────────────────────────

/// Set an account's native balance on the fork. Tenderly and Anvil expose
/// the same facility under different method names.
pub async fn set_balance(rpc_url: &str, account: Address, amount: U256, anvil: bool) -> Result<()> {
    let provider = read_provider(rpc_url)?;
    if anvil {
        let _: () = provider
            .raw_request("anvil_setBalance".into(), (account, amount))
            .await
            .context("anvil_setBalance failed")?;
    } else {
        let _: () = provider
            .raw_request(
                "tenderly_setBalance".into(),
                (vec![account], format!("0x{amount:x}")),
            )
            .await
            .context("tenderly_setBalance failed")?;
    }
    Ok(())
}

/// Unlock an account for impersonated sends. No-op on Tenderly, which
/// accepts any `from` out of the box.
pub async fn impersonate(rpc_url: &str, account: Address, anvil: bool) -> Result<()> {
    if !anvil {
        return Ok(());
    }
    let provider = read_provider(rpc_url)?;
    let _: () = provider
        .raw_request("anvil_impersonateAccount".into(), [account])
        .await
        .context("anvil_impersonateAccount failed")?;
    Ok(())
}

// ── Formatting helpers ───────────────────────────────────────────────

pub fn short_addr(addr: &Address) -> String {
    let s = format!("{addr}");
    if s.len() > 10 {
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_do_not_borrow_the_rpc_url() {
        // must keep compiling: erased() needs 'static, so the returned
        // provider cannot capture the url slice
        let provider = {
            let rpc = String::from("http://127.0.0.1:8545");
            read_provider(&rpc).unwrap()
        };
        let _erased = provider.erased();

        let signed = {
            let rpc = String::from("http://127.0.0.1:8545");
            let key = String::from(crate::config::DEFAULT_SIGNER_KEY);
            write_provider(&rpc, &key).unwrap()
        };
        let _erased = signed.erased();
    }

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!(Network::from_name("Mainnet").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_name("ARBITRUM").unwrap(), Network::Arbitrum);
        assert!(Network::from_name("goerli").is_err());
    }

    #[test]
    fn ilk_bytes_is_ascii_right_padded() {
        let eth_a = ilk("ETH-A").unwrap();
        let bytes = eth_a.ilk_bytes();
        assert_eq!(&bytes[..5], b"ETH-A");
        assert!(bytes[5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn eth_aliases_to_weth() {
        assert_eq!(
            token("ETH").unwrap().address,
            token("WETH").unwrap().address
        );
    }

    #[test]
    fn unknown_token_is_an_error() {
        assert!(token("SHIB").is_err());
    }
}
