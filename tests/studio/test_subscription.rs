// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the mock upgrade flow and order ledger

use portrait_banana::entitlement::{
    EntitlementViolation, SubscriptionManager, UpgradeError, UpgradePhase, PRO_CURRENCY,
    PRO_PRICE, REDEMPTION_CODE,
};
use portrait_banana::storage::records::list_orders;
use portrait_banana::storage::{
    InMemoryStore, KeyValueStore, OrderProvider, OrderStatus, OrderType, KEY_SUBSCRIPTION,
};
use std::sync::Arc;
use std::time::Duration;

fn store() -> Arc<dyn KeyValueStore> {
    Arc::new(InMemoryStore::new())
}

#[test]
fn test_valid_code_activates_pro() {
    let store = store();
    let manager = SubscriptionManager::load(store.clone()).unwrap();
    assert_eq!(manager.phase(), UpgradePhase::Free);

    let state = manager.redeem_code(REDEMPTION_CODE).unwrap();
    assert!(state.is_pro);
    assert_eq!(state.expire_at, None);
    assert!(manager.is_subscribed());
    assert_eq!(manager.phase(), UpgradePhase::Pro);
    assert!(store.get(KEY_SUBSCRIPTION).unwrap().unwrap().contains("\"isPro\":true"));
}

#[test]
fn test_redeemed_code_records_pro_price() {
    let store = store();
    let manager = SubscriptionManager::load(store.clone()).unwrap();
    manager.redeem_code(REDEMPTION_CODE).unwrap();

    let orders = list_orders(store.as_ref()).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_type, OrderType::Subscription);
    assert_eq!(orders[0].status, OrderStatus::Paid);
    assert_eq!(orders[0].currency, PRO_CURRENCY);
    assert!((orders[0].amount - PRO_PRICE).abs() < f64::EPSILON);
}

#[test]
fn test_code_match_is_case_sensitive() {
    let manager = SubscriptionManager::load(store()).unwrap();

    for code in ["banana2024", "BANANA2024 ", " BANANA2024", ""] {
        let err = manager.redeem_code(code).unwrap_err();
        assert!(
            matches!(
                err,
                UpgradeError::Rejected(EntitlementViolation::InvalidRedemptionCode)
            ),
            "{:?} should be rejected",
            code
        );
        assert_eq!(manager.phase(), UpgradePhase::Free);
    }
    assert!(!manager.is_subscribed());
}

#[tokio::test]
async fn test_mock_payment_records_order() {
    let store = store();
    let manager = SubscriptionManager::load(store.clone())
        .unwrap()
        .with_payment_delay(Duration::from_millis(10));

    let state = manager.complete_mock_payment().await.unwrap();
    assert!(state.is_pro);
    let expire_at = state.expire_at.unwrap();
    let week_ms = 7 * 24 * 3600 * 1000;
    let now = chrono::Utc::now().timestamp_millis();
    assert!(expire_at > now + week_ms - 60_000 && expire_at <= now + week_ms);

    let orders = list_orders(store.as_ref()).unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.order_type, OrderType::Subscription);
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.provider, OrderProvider::Mock);
    assert_eq!(order.currency, PRO_CURRENCY);
    assert!((order.amount - PRO_PRICE).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_upgrade_when_already_pro_is_noop() {
    let store = store();
    let manager = SubscriptionManager::load(store.clone())
        .unwrap()
        .with_payment_delay(Duration::from_millis(1));

    manager.complete_mock_payment().await.unwrap();
    manager.complete_mock_payment().await.unwrap();
    manager.redeem_code(REDEMPTION_CODE).unwrap();

    assert_eq!(list_orders(store.as_ref()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_upgrade_rejected_while_pending() {
    let manager = Arc::new(
        SubscriptionManager::load(store())
            .unwrap()
            .with_payment_delay(Duration::from_millis(100)),
    );

    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.complete_mock_payment().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.phase(), UpgradePhase::Pending);

    let second = manager.redeem_code(REDEMPTION_CODE);
    assert!(matches!(second, Err(UpgradeError::InProgress)));

    pending.await.unwrap().unwrap();
    assert_eq!(manager.phase(), UpgradePhase::Pro);
}

#[tokio::test]
async fn test_abandoned_payment_returns_to_free() {
    let store = store();
    let manager = SubscriptionManager::load(store.clone())
        .unwrap()
        .with_payment_delay(Duration::from_millis(200));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), manager.complete_mock_payment()).await;
    assert!(abandoned.is_err());
    assert_eq!(manager.phase(), UpgradePhase::Free);
    assert!(!manager.is_subscribed());
    assert!(list_orders(store.as_ref()).unwrap().is_empty());

    manager.redeem_code(REDEMPTION_CODE).unwrap();
    assert_eq!(manager.phase(), UpgradePhase::Pro);
    assert!(manager.is_subscribed());
}

#[test]
fn test_state_survives_reload() {
    let store = store();
    SubscriptionManager::load(store.clone())
        .unwrap()
        .redeem_code(REDEMPTION_CODE)
        .unwrap();

    let reloaded = SubscriptionManager::load(store).unwrap();
    assert!(reloaded.is_subscribed());
    assert_eq!(reloaded.phase(), UpgradePhase::Pro);
}

#[test]
fn test_expired_subscription_loads_as_free() {
    let store = store();
    store
        .set(KEY_SUBSCRIPTION, r#"{"isPro":true,"expireAt":1000}"#)
        .unwrap();
    let manager = SubscriptionManager::load(store).unwrap();
    assert!(!manager.is_subscribed());
    assert_eq!(manager.phase(), UpgradePhase::Free);
}
