use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::sol;
use alloy::sol_types::SolValue;

sol! {
    /// Canonical form of a strategy subscription, exactly as SubStorage
    /// hashes it: `keccak256(abi.encode(sub))`. Array ordering is
    /// positional parameter binding and must be preserved.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    struct StrategySub {
        uint64 strategyOrBundleId;
        bool isBundle;
        bytes[] triggerData;
        bytes32[] subData;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ISubProxy {
        function subscribeToStrategy(StrategySub memory _sub) external;
        function updateSubData(uint256 _subId, StrategySub memory _sub) external;
        function activateSub(uint256 _subId) external;
        function deactivateSub(uint256 _subId) external;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ISubStorage {
        struct StoredSubData {
            bytes32 userProxy;
            bool isEnabled;
            bytes32 strategySubHash;
        }

        function getSub(uint256 _subId) external view returns (StoredSubData memory);
        function getSubsCount() external view returns (uint256);
    }
}

/// Content hash of a subscription. Must equal the `strategySubHash` the
/// storage contract computes on write, byte for byte.
pub fn sub_hash(sub: &StrategySub) -> B256 {
    keccak256(sub.abi_encode())
}

// ── subData words ────────────────────────────────────────────────────
//
// subData entries are single abi-encoded words (bytes32 on the wire).

pub fn uint_word(value: U256) -> B256 {
    B256::from(value)
}

pub fn addr_word(address: Address) -> B256 {
    address.into_word()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;

    fn dai() -> Address {
        "0x6B175474E89094C44Da98b954EedeAC495271d0F"
            .parse()
            .unwrap()
    }

    fn mcd_manager() -> Address {
        "0x5ef30b9986345249bc32d8928B7ee64DE9435E39"
            .parse()
            .unwrap()
    }

    fn example_sub() -> StrategySub {
        // id=5, price-under trigger, subData=[vaultId=12, DAI, MCD_MANAGER]
        let trigger = crate::subs::triggers::Trigger::ChainlinkPrice {
            token: dai(),
            price: U256::from(1800u64) * U256::from(100_000_000u64),
            state: crate::subs::triggers::RatioState::Under,
        };
        StrategySub {
            strategyOrBundleId: 5,
            isBundle: false,
            triggerData: vec![trigger.encode()],
            subData: vec![
                uint_word(U256::from(12u64)),
                addr_word(dai()),
                addr_word(mcd_manager()),
            ],
        }
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(sub_hash(&example_sub()), sub_hash(&example_sub()));
    }

    #[test]
    fn sub_data_order_changes_hash() {
        let sub = example_sub();
        let mut swapped = example_sub();
        swapped.subData.swap(1, 2);
        assert_ne!(sub_hash(&sub), sub_hash(&swapped));
    }

    #[test]
    fn trigger_order_changes_hash() {
        let mut sub = example_sub();
        sub.triggerData.push(Bytes::from(vec![0xaa; 96]));
        let mut swapped = StrategySub {
            strategyOrBundleId: sub.strategyOrBundleId,
            isBundle: sub.isBundle,
            triggerData: sub.triggerData.clone(),
            subData: sub.subData.clone(),
        };
        swapped.triggerData.swap(0, 1);
        assert_ne!(sub_hash(&sub), sub_hash(&swapped));
    }

    #[test]
    fn bundle_flag_changes_hash() {
        let sub = example_sub();
        let mut bundled = example_sub();
        bundled.isBundle = true;
        assert_ne!(sub_hash(&sub), sub_hash(&bundled));
    }

    #[test]
    fn encoding_wraps_struct_like_solidity_abi_encode() {
        // abi.encode(sub) of a dynamic struct starts with the 0x20 head
        // offset — SubStorage hashes that exact layout.
        let encoded = example_sub().abi_encode();
        assert_eq!(&encoded[..32], U256::from(32u64).to_be_bytes::<32>());
    }

    #[test]
    fn words_are_left_padded() {
        assert_eq!(
            uint_word(U256::from(12u64)).as_slice()[31],
            12u8,
        );
        let word = addr_word(dai());
        assert!(word.as_slice()[..12].iter().all(|b| *b == 0));
        assert_eq!(&word.as_slice()[12..], dai().as_slice());
    }
}
