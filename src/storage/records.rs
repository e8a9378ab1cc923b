// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Typed records persisted through the key-value store

use serde::{Deserialize, Serialize};

use super::{
    KeyValueStore, KeyValueStoreExt, StoreError, KEY_GENERATIONS, KEY_ORDERS, KEY_TICKETS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Subscription,
    Oneoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderProvider {
    Stripe,
    Wechat,
    Mock,
}

/// Mock order ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub amount: f64,
    pub currency: String,
    pub status: OrderStatus,
    pub provider: OrderProvider,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl OrderRecord {
    /// A paid mock subscription order stamped at `created_at`
    pub fn mock_subscription(amount: f64, currency: &str, created_at: i64) -> Self {
        Self {
            id: format!("ord-{}", created_at),
            order_type: OrderType::Subscription,
            amount,
            currency: currency.to_string(),
            status: OrderStatus::Paid,
            provider: OrderProvider::Mock,
            created_at,
        }
    }
}

/// Contact form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactTicket {
    pub email: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Queued,
    Running,
    Success,
    Failed,
}

/// History entry for one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub id: String,
    pub created_at: i64,
    pub style_count: usize,
    pub status: GenerationStatus,
    #[serde(default)]
    pub succeeded: usize,
}

pub fn record_order(store: &dyn KeyValueStore, order: OrderRecord) -> Result<(), StoreError> {
    store.append_json(KEY_ORDERS, order)
}

/// All orders, newest first
pub fn list_orders(store: &dyn KeyValueStore) -> Result<Vec<OrderRecord>, StoreError> {
    let mut orders: Vec<OrderRecord> = store.get_json(KEY_ORDERS)?.unwrap_or_default();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
}

pub fn submit_ticket(store: &dyn KeyValueStore, ticket: ContactTicket) -> Result<(), StoreError> {
    store.append_json(KEY_TICKETS, ticket)
}

pub fn list_tickets(store: &dyn KeyValueStore) -> Result<Vec<ContactTicket>, StoreError> {
    Ok(store.get_json(KEY_TICKETS)?.unwrap_or_default())
}

/// Insert or replace a history entry by id
pub fn upsert_generation(
    store: &dyn KeyValueStore,
    summary: GenerationSummary,
) -> Result<(), StoreError> {
    let mut items: Vec<GenerationSummary> = store.get_json(KEY_GENERATIONS)?.unwrap_or_default();
    match items.iter_mut().find(|g| g.id == summary.id) {
        Some(existing) => *existing = summary,
        None => items.push(summary),
    }
    store.set_json(KEY_GENERATIONS, &items)
}

/// Generation history, newest first
pub fn list_generations(store: &dyn KeyValueStore) -> Result<Vec<GenerationSummary>, StoreError> {
    let mut items: Vec<GenerationSummary> = store.get_json(KEY_GENERATIONS)?.unwrap_or_default();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(items)
}
