use alloy::primitives::{Address, FixedBytes, keccak256};
use alloy::sol;
use anyhow::{Context, Result, bail};

use crate::chain::{self, Network};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract IDFSRegistry {
        function getAddr(bytes4 _id) external view returns (address);
    }
}

/// Registry ids are the first four bytes of the keccak of the contract name.
pub fn name_id(name: &str) -> FixedBytes<4> {
    let hash = keccak256(name.as_bytes());
    FixedBytes::<4>::from_slice(&hash[..4])
}

/// Resolve a contract name (`SubProxy`, `SubStorage`, ...) through the
/// on-chain name registry.
pub async fn get_addr(rpc_url: &str, network: Network, name: &str) -> Result<Address> {
    let provider = chain::read_provider(rpc_url)?;
    let registry = IDFSRegistry::new(chain::registry_addr(network), &provider);

    let resolved = registry
        .getAddr(name_id(name))
        .call()
        .await
        .with_context(|| format!("registry lookup for '{name}'"))?;

    if resolved == Address::ZERO {
        bail!("'{name}' is not registered in the {network} registry");
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_id_is_four_bytes_of_keccak() {
        let id = name_id("SubProxy");
        assert_eq!(id.as_slice(), &keccak256(b"SubProxy")[..4]);
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        assert_ne!(name_id("SubProxy"), name_id("SubStorage"));
        assert_ne!(name_id("SubStorage"), name_id("RecipeExecutor"));
    }
}
