use alloy::primitives::{Address, Bytes, U256, aliases::U80};
use alloy::sol;
use alloy::sol_types::SolValue;
use anyhow::{Result, bail};

// Subscription-time parameters of the trigger contracts. Each trigger
// treats its blob as opaque until execution, so layout must match the
// deployed contracts exactly.
sol! {
    #[allow(missing_docs)]
    struct ChainlinkPriceSubParams {
        address tokenAddr;
        uint256 price;
        uint8 state;
    }

    #[allow(missing_docs)]
    struct McdRatioSubParams {
        uint256 vaultId;
        uint256 ratio;
        uint8 state;
    }

    #[allow(missing_docs)]
    struct TimestampSubParams {
        uint256 lastTimestamp;
        uint256 interval;
    }

    #[allow(missing_docs)]
    struct TrailingStopSubParams {
        address tokenAddr;
        uint256 percentage;
        uint80 startRoundId;
    }
}

// ── Ratio / price direction ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioState {
    Over,
    Under,
}

impl RatioState {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "over" => Ok(RatioState::Over),
            "under" => Ok(RatioState::Under),
            other => bail!("Invalid price state '{other}'. Use 'over' or 'under'."),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RatioState::Over => 0,
            RatioState::Under => 1,
        }
    }
}

// ── Triggers ─────────────────────────────────────────────────────────

/// Conditions a subscription can be armed with. `encode` produces the
/// opaque blob that goes into `StrategySub.triggerData`.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Chainlink price crosses `price` (scaled 1e8) in the given direction.
    ChainlinkPrice {
        token: Address,
        price: U256,
        state: RatioState,
    },
    /// Maker vault collateral ratio (scaled 1e16) crosses in the given direction.
    McdRatio {
        vault_id: u64,
        ratio: U256,
        state: RatioState,
    },
    /// At least `interval` seconds elapsed since `last_timestamp`.
    Timestamp { last_timestamp: u64, interval: u64 },
    /// Price fell `percentage` (scaled 1e8) below its peak since `start_round_id`.
    /// Round ids carry the feed phase in the high bits, so they need the
    /// full uint80 range.
    TrailingStop {
        token: Address,
        percentage: U256,
        start_round_id: U80,
    },
}

impl Trigger {
    pub fn encode(&self) -> Bytes {
        let encoded = match *self {
            Trigger::ChainlinkPrice { token, price, state } => ChainlinkPriceSubParams {
                tokenAddr: token,
                price,
                state: state.as_u8(),
            }
            .abi_encode(),
            Trigger::McdRatio { vault_id, ratio, state } => McdRatioSubParams {
                vaultId: U256::from(vault_id),
                ratio,
                state: state.as_u8(),
            }
            .abi_encode(),
            Trigger::Timestamp { last_timestamp, interval } => TimestampSubParams {
                lastTimestamp: U256::from(last_timestamp),
                interval: U256::from(interval),
            }
            .abi_encode(),
            Trigger::TrailingStop { token, percentage, start_round_id } => {
                TrailingStopSubParams {
                    tokenAddr: token,
                    percentage,
                    startRoundId: start_round_id,
                }
                .abi_encode()
            }
        };
        Bytes::from(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weth() -> Address {
        "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            .parse()
            .unwrap()
    }

    #[test]
    fn ratio_state_parses() {
        assert_eq!(RatioState::from_name("Over").unwrap(), RatioState::Over);
        assert_eq!(RatioState::from_name("UNDER").unwrap(), RatioState::Under);
        assert!(RatioState::from_name("sideways").is_err());
    }

    #[test]
    fn price_trigger_is_three_static_words() {
        let blob = Trigger::ChainlinkPrice {
            token: weth(),
            price: U256::from(1800_0000_0000u64),
            state: RatioState::Under,
        }
        .encode();
        assert_eq!(blob.len(), 96);
        // last word carries the state flag
        assert_eq!(blob[95], 1);
        // first word is the left-padded token address
        assert_eq!(&blob[12..32], weth().as_slice());
    }

    #[test]
    fn direction_changes_encoding() {
        let over = Trigger::McdRatio {
            vault_id: 12,
            ratio: U256::from(2u8),
            state: RatioState::Over,
        }
        .encode();
        let under = Trigger::McdRatio {
            vault_id: 12,
            ratio: U256::from(2u8),
            state: RatioState::Under,
        }
        .encode();
        assert_ne!(over, under);
    }

    #[test]
    fn trailing_stop_keeps_round_phase_bits() {
        // phase 2, aggregator round 0x853
        let round = (U80::from(2u64) << 64) | U80::from(0x853u64);
        let blob = Trigger::TrailingStop {
            token: weth(),
            percentage: U256::from(500_000_000u64),
            start_round_id: round,
        }
        .encode();
        assert_eq!(blob.len(), 96);
        // last word carries the round id, right-aligned
        assert_eq!(&blob[96 - 10..], &round.to_be_bytes::<10>()[..]);
    }

    #[test]
    fn timestamp_trigger_is_two_words() {
        let blob = Trigger::Timestamp {
            last_timestamp: 1_630_489_138,
            interval: 2 * 24 * 60 * 60,
        }
        .encode();
        assert_eq!(blob.len(), 64);
    }
}
