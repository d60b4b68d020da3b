mod fork_common;

use forkooor::positions::savings::SavingsProtocol;
use forkooor::subs::builders::{self, repay_from_savings};
use forkooor::subs::encoding::sub_hash;
use forkooor::subs::{SubClient, SubError};

use fork_common::*;

const VAULT_ID: u64 = 30_000;

#[tokio::test]
#[ignore] // Requires Anvil + network access
async fn subscribe_update_and_toggle() {
    let fork = spawn_mainnet_fork();
    fund_eth(&fork.rpc_url, fork.wallet_address, eth(100)).await;
    let ctx = fork.ctx();

    let client = SubClient::new(&ctx).await.expect("sub client");

    // 1. Subscribe a repay-from-savings bundle sub
    let min = builders::parse_ratio_percent("200").unwrap();
    let target = builders::parse_ratio_percent("220").unwrap();
    let sub =
        repay_from_savings(SavingsProtocol::Yearn.bundle_id(), VAULT_ID, min, target).unwrap();

    let sub_id = client.subscribe(&ctx, &sub).await.expect("subscribe");
    println!("  Subscribed as sub id {sub_id}");

    let stored = client.get(sub_id).await.unwrap();
    assert!(stored.isEnabled, "fresh sub should start enabled");
    assert_eq!(
        stored.userProxy,
        client.user_proxy().into_word(),
        "stored proxy should be the sender's DSProxy"
    );
    assert_eq!(stored.strategySubHash, sub_hash(&sub));

    // 2. Update with a higher target ratio; the stored hash must follow
    let new_target = builders::parse_ratio_percent("240").unwrap();
    let updated =
        repay_from_savings(SavingsProtocol::Yearn.bundle_id(), VAULT_ID, min, new_target).unwrap();

    let new_hash = client.update(&ctx, sub_id, &updated).await.expect("update");
    assert_ne!(new_hash, sub_hash(&sub), "update should change the hash");
    assert_eq!(client.get(sub_id).await.unwrap().strategySubHash, new_hash);

    // 3. Toggle the enabled flag both ways
    client.deactivate(&ctx, sub_id).await.expect("deactivate");
    assert!(!client.get(sub_id).await.unwrap().isEnabled);

    client.activate(&ctx, sub_id).await.expect("activate");
    assert!(client.get(sub_id).await.unwrap().isEnabled);
}

#[tokio::test]
#[ignore] // Requires Anvil + network access
async fn reverted_update_leaves_stored_sub_untouched() {
    let fork = spawn_mainnet_fork();
    fund_eth(&fork.rpc_url, fork.wallet_address, eth(100)).await;
    let ctx = fork.ctx();

    let client = SubClient::new(&ctx).await.expect("sub client");

    // a long-lived sub owned by somebody else's proxy
    const FOREIGN_SUB_ID: u64 = 0;
    let before = client.get(FOREIGN_SUB_ID).await.expect("getSub");
    assert_ne!(
        before.userProxy,
        client.user_proxy().into_word(),
        "sub 0 should not belong to the fresh test proxy"
    );

    let min = builders::parse_ratio_percent("200").unwrap();
    let target = builders::parse_ratio_percent("220").unwrap();
    let sub =
        repay_from_savings(SavingsProtocol::Yearn.bundle_id(), VAULT_ID, min, target).unwrap();

    // storage only lets the owning proxy update, so the relayed call reverts
    let err = client
        .update(&ctx, FOREIGN_SUB_ID, &sub)
        .await
        .expect_err("updating a foreign sub must fail");
    assert!(
        matches!(err, SubError::Dispatch(_)),
        "expected a dispatch failure, got {err}"
    );

    // the reverted dispatch must not have touched the stored record
    let after = client.get(FOREIGN_SUB_ID).await.expect("getSub");
    assert_eq!(after.strategySubHash, before.strategySubHash);
    assert_eq!(after.isEnabled, before.isEnabled);
    assert_eq!(after.userProxy, before.userProxy);
}

#[tokio::test]
#[ignore] // Requires Anvil + network access
async fn subscribe_close_at_price() {
    let fork = spawn_mainnet_fork();
    fund_eth(&fork.rpc_url, fork.wallet_address, eth(100)).await;
    let ctx = fork.ctx();

    let client = SubClient::new(&ctx).await.expect("sub client");

    let weth = forkooor::chain::token("WETH").unwrap().address;
    let price = builders::parse_price("1200").unwrap();
    let sub = builders::mcd_close_to_dai(
        VAULT_ID,
        weth,
        price,
        forkooor::subs::triggers::RatioState::Under,
    )
    .unwrap();

    let sub_id = client.subscribe(&ctx, &sub).await.expect("subscribe");
    let stored = client.get(sub_id).await.unwrap();
    assert_eq!(stored.strategySubHash, sub_hash(&sub));
}
