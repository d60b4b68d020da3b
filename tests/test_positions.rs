mod fork_common;

use alloy::primitives::U256;

use forkooor::positions::maker;
use forkooor::{chain, swap, tokens};

use fork_common::*;

#[tokio::test]
#[ignore] // Requires Anvil + network access
async fn open_eth_vault_and_read_state() {
    let fork = spawn_mainnet_fork();
    fund_eth(&fork.rpc_url, fork.wallet_address, eth(200)).await;
    let ctx = fork.ctx();
    let provider = ctx.provider().await.unwrap();

    // 10 ETH collateral, 15k DAI debt — comfortably over the ETH-A floor
    let ilk = chain::ilk("ETH-A").unwrap();
    let coll = eth(10);
    let debt = eth(15_000);
    maker::open_vault(&ctx, &provider, ilk, coll, debt)
        .await
        .expect("open vault");

    let proxy = forkooor::proxy::get_or_build(&ctx, &provider).await.unwrap();
    let vault_id = maker::latest_vault_for(&provider, proxy)
        .await
        .unwrap()
        .expect("vault should exist");

    let state = maker::vault_state(ctx.rpc_url(), vault_id)
        .await
        .unwrap();
    assert_eq!(state.ilk_label, "ETH-A");
    assert!((state.coll - 10.0).abs() < 1e-6, "coll={}", state.coll);
    assert!(state.debt >= 15_000.0, "debt={}", state.debt);
    assert!(state.ratio_pct > 100.0, "ratio={}", state.ratio_pct);

    // The drawn DAI lands on the sender
    let dai = chain::token("DAI").unwrap().address;
    let dai_balance = balance_of(&fork.rpc_url, dai, fork.wallet_address).await;
    assert!(dai_balance >= eth(15_000), "dai_balance={dai_balance}");
}

#[tokio::test]
#[ignore] // Requires Anvil + network access
async fn wrap_and_sell_weth_for_dai() {
    let fork = spawn_mainnet_fork();
    fund_eth(&fork.rpc_url, fork.wallet_address, eth(50)).await;
    let ctx = fork.ctx();
    let provider = ctx.provider().await.unwrap();

    tokens::deposit_to_weth(&ctx, &provider, eth(5)).await.unwrap();

    let weth = chain::token("WETH").unwrap().address;
    let weth_balance = balance_of(&fork.rpc_url, weth, fork.wallet_address).await;
    assert_eq!(weth_balance, eth(5));

    swap::sell(&ctx, &provider, "WETH", "DAI", "5")
        .await
        .expect("sell");

    let dai = chain::token("DAI").unwrap().address;
    let dai_balance = balance_of(&fork.rpc_url, dai, fork.wallet_address).await;
    assert!(dai_balance > U256::ZERO, "sell produced no DAI");
    assert_eq!(
        balance_of(&fork.rpc_url, weth, fork.wallet_address).await,
        U256::ZERO
    );
}
