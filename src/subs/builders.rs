use alloy::primitives::{Address, U256, aliases::U80, utils::parse_units};
use anyhow::{Context, Result};

use crate::chain;
use crate::subs::encoding::{StrategySub, addr_word, uint_word};
use crate::subs::triggers::{RatioState, Trigger};

// Strategy ids as deployed in the strategy storage. Bundle ids for the
// repay-from-savings family live on SavingsProtocol.
pub const MCD_CLOSE_TO_DAI_STRATEGY_ID: u64 = 7;
pub const MCD_CLOSE_TO_COLL_STRATEGY_ID: u64 = 9;
pub const MCD_TRAILING_CLOSE_TO_COLL_STRATEGY_ID: u64 = 11;
pub const MCD_TRAILING_CLOSE_TO_DAI_STRATEGY_ID: u64 = 12;

/// Chainlink-style USD price, scaled 1e8.
pub fn parse_price(price: &str) -> Result<U256> {
    Ok(parse_units(price, 8)
        .with_context(|| format!("parsing price '{price}'"))?
        .get_absolute())
}

/// Collateral ratio in percent points, scaled 1e16 (so "200" = 200%).
pub fn parse_ratio_percent(ratio: &str) -> Result<U256> {
    Ok(parse_units(ratio, 16)
        .with_context(|| format!("parsing ratio '{ratio}'"))?
        .get_absolute())
}

/// Trailing-stop drawdown in percent points, scaled 1e8 (so "5" = 5%).
pub fn parse_trailing_percentage(pct: &str) -> Result<U256> {
    Ok(parse_units(pct, 8)
        .with_context(|| format!("parsing percentage '{pct}'"))?
        .get_absolute())
}

/// Chainlink feed address for a trigger's asset — BTC-denominated
/// collateral is quoted under the BTC denomination address.
pub fn trigger_feed_token(asset: Address) -> Address {
    let wbtc = chain::token("WBTC").expect("WBTC is a known token").address;
    if asset == wbtc {
        chain::btc_denomination()
    } else {
        asset
    }
}

/// Base address for reading a feed out of the Chainlink registry. The
/// registry keys ETH and BTC under denomination addresses, not under
/// WETH / WBTC.
pub fn oracle_lookup_token(asset: Address) -> Result<Address> {
    let weth = chain::token("WETH")?.address;
    let wbtc = chain::token("WBTC")?.address;
    if asset == weth {
        Ok(chain::eth_denomination())
    } else if asset == wbtc {
        Ok(chain::btc_denomination())
    } else {
        Ok(asset)
    }
}

/// Repay-from-savings bundle sub: when the vault ratio drops under
/// `min_ratio`, repay from the savings protocol up to `target_ratio`.
pub fn repay_from_savings(
    bundle_id: u64,
    vault_id: u64,
    min_ratio: U256,
    target_ratio: U256,
) -> Result<StrategySub> {
    let dai = chain::token("DAI")?.address;
    let mcd_manager = chain::maker::cdp_manager();

    let trigger = Trigger::McdRatio {
        vault_id,
        ratio: min_ratio,
        state: RatioState::Under,
    };

    Ok(StrategySub {
        strategyOrBundleId: bundle_id,
        isBundle: true,
        triggerData: vec![trigger.encode()],
        subData: vec![
            uint_word(U256::from(vault_id)),
            uint_word(target_ratio),
            addr_word(dai),
            addr_word(mcd_manager),
        ],
    })
}

/// Close-to-DAI sub: sell the vault's collateral into DAI once the
/// collateral's Chainlink price crosses `price` in `state` direction.
pub fn mcd_close_to_dai(
    vault_id: u64,
    coll_asset: Address,
    price: U256,
    state: RatioState,
) -> Result<StrategySub> {
    let dai = chain::token("DAI")?.address;
    let mcd_manager = chain::maker::cdp_manager();

    let trigger = Trigger::ChainlinkPrice {
        token: trigger_feed_token(coll_asset),
        price,
        state,
    };

    Ok(StrategySub {
        strategyOrBundleId: MCD_CLOSE_TO_DAI_STRATEGY_ID,
        isBundle: false,
        triggerData: vec![trigger.encode()],
        subData: vec![
            uint_word(U256::from(vault_id)),
            addr_word(dai),
            addr_word(mcd_manager),
        ],
    })
}

/// Close-to-collateral sub: same trigger, but the payout stays in the
/// collateral asset (which rides along in subData).
pub fn mcd_close_to_coll(
    vault_id: u64,
    coll_asset: Address,
    price: U256,
    state: RatioState,
) -> Result<StrategySub> {
    let dai = chain::token("DAI")?.address;
    let mcd_manager = chain::maker::cdp_manager();

    let trigger = Trigger::ChainlinkPrice {
        token: trigger_feed_token(coll_asset),
        price,
        state,
    };

    Ok(StrategySub {
        strategyOrBundleId: MCD_CLOSE_TO_COLL_STRATEGY_ID,
        isBundle: false,
        triggerData: vec![trigger.encode()],
        subData: vec![
            uint_word(U256::from(vault_id)),
            addr_word(coll_asset),
            addr_word(dai),
            addr_word(mcd_manager),
        ],
    })
}

/// Trailing close-to-DAI sub: once the collateral price falls
/// `percentage` below its peak since `start_round_id`, sell into DAI.
pub fn mcd_trailing_close_to_dai(
    vault_id: u64,
    coll_asset: Address,
    percentage: U256,
    start_round_id: U80,
) -> Result<StrategySub> {
    let dai = chain::token("DAI")?.address;
    let mcd_manager = chain::maker::cdp_manager();

    let trigger = Trigger::TrailingStop {
        token: trigger_feed_token(coll_asset),
        percentage,
        start_round_id,
    };

    Ok(StrategySub {
        strategyOrBundleId: MCD_TRAILING_CLOSE_TO_DAI_STRATEGY_ID,
        isBundle: false,
        triggerData: vec![trigger.encode()],
        subData: vec![
            uint_word(U256::from(vault_id)),
            addr_word(dai),
            addr_word(mcd_manager),
        ],
    })
}

/// Trailing close-to-collateral sub: same trigger, payout in collateral.
pub fn mcd_trailing_close_to_coll(
    vault_id: u64,
    coll_asset: Address,
    percentage: U256,
    start_round_id: U80,
) -> Result<StrategySub> {
    let dai = chain::token("DAI")?.address;
    let mcd_manager = chain::maker::cdp_manager();

    let trigger = Trigger::TrailingStop {
        token: trigger_feed_token(coll_asset),
        percentage,
        start_round_id,
    };

    Ok(StrategySub {
        strategyOrBundleId: MCD_TRAILING_CLOSE_TO_COLL_STRATEGY_ID,
        isBundle: false,
        triggerData: vec![trigger.encode()],
        subData: vec![
            uint_word(U256::from(vault_id)),
            addr_word(coll_asset),
            addr_word(dai),
            addr_word(mcd_manager),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subs::encoding::sub_hash;

    #[test]
    fn price_scales_1e8() {
        assert_eq!(parse_price("1800").unwrap(), U256::from(180_000_000_000u64));
        assert_eq!(parse_price("0.5").unwrap(), U256::from(50_000_000u64));
    }

    #[test]
    fn ratio_scales_1e16() {
        assert_eq!(
            parse_ratio_percent("200").unwrap(),
            U256::from(2u8) * U256::from(10u64).pow(U256::from(18u8))
        );
    }

    #[test]
    fn wbtc_feeds_under_btc_denomination() {
        let wbtc = chain::token("WBTC").unwrap().address;
        let weth = chain::token("WETH").unwrap().address;
        assert_eq!(trigger_feed_token(wbtc), chain::btc_denomination());
        assert_eq!(trigger_feed_token(weth), weth);
    }

    #[test]
    fn close_to_coll_carries_the_collateral_word() {
        let weth = chain::token("WETH").unwrap().address;
        let price = parse_price("1800").unwrap();

        let to_dai = mcd_close_to_dai(12, weth, price, RatioState::Under).unwrap();
        let to_coll = mcd_close_to_coll(12, weth, price, RatioState::Under).unwrap();

        assert_eq!(to_dai.subData.len(), 3);
        assert_eq!(to_coll.subData.len(), 4);
        assert_eq!(to_coll.subData[1], addr_word(weth));
        assert_ne!(sub_hash(&to_dai), sub_hash(&to_coll));
    }

    #[test]
    fn trailing_percentage_scales_1e8() {
        assert_eq!(
            parse_trailing_percentage("5").unwrap(),
            U256::from(500_000_000u64)
        );
    }

    #[test]
    fn trailing_close_follows_the_close_sub_layout() {
        let weth = chain::token("WETH").unwrap().address;
        let pct = parse_trailing_percentage("5").unwrap();
        let round = U80::from(1u64) << 64;

        let to_dai = mcd_trailing_close_to_dai(12, weth, pct, round).unwrap();
        let to_coll = mcd_trailing_close_to_coll(12, weth, pct, round).unwrap();

        assert_eq!(
            to_dai.strategyOrBundleId,
            MCD_TRAILING_CLOSE_TO_DAI_STRATEGY_ID
        );
        assert!(!to_dai.isBundle);
        assert_eq!(to_dai.subData.len(), 3);
        assert_eq!(to_coll.subData.len(), 4);
        assert_eq!(to_coll.subData[1], addr_word(weth));
        assert_ne!(sub_hash(&to_dai), sub_hash(&to_coll));
    }

    #[test]
    fn oracle_lookups_go_through_denomination_addresses() {
        let weth = chain::token("WETH").unwrap().address;
        let wbtc = chain::token("WBTC").unwrap().address;
        let dai = chain::token("DAI").unwrap().address;
        assert_eq!(oracle_lookup_token(weth).unwrap(), chain::eth_denomination());
        assert_eq!(oracle_lookup_token(wbtc).unwrap(), chain::btc_denomination());
        assert_eq!(oracle_lookup_token(dai).unwrap(), dai);
    }

    #[test]
    fn rebuilding_the_same_sub_hashes_identically() {
        let weth = chain::token("WETH").unwrap().address;
        let price = parse_price("1800").unwrap();
        let a = mcd_close_to_dai(5, weth, price, RatioState::Under).unwrap();
        let b = mcd_close_to_dai(5, weth, price, RatioState::Under).unwrap();
        assert_eq!(sub_hash(&a), sub_hash(&b));
    }

    #[test]
    fn savings_sub_binds_params_positionally() {
        let min = parse_ratio_percent("200").unwrap();
        let target = parse_ratio_percent("250").unwrap();
        let sub = repay_from_savings(1, 12, min, target).unwrap();

        assert!(sub.isBundle);
        assert_eq!(sub.subData[0], uint_word(U256::from(12u64)));
        assert_eq!(sub.subData[1], uint_word(target));

        // swapping vaultId and targetRatio is detectable by hash
        let mut corrupted = repay_from_savings(1, 12, min, target).unwrap();
        corrupted.subData.swap(0, 1);
        assert_ne!(sub_hash(&sub), sub_hash(&corrupted));
    }
}
