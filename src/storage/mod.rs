// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key-value persistence for subscription state, orders, tickets and history
//!
//! Components never touch a storage engine directly; they receive an
//! `Arc<dyn KeyValueStore>` and go through the typed helpers in
//! [`KeyValueStoreExt`] and [`records`].

pub mod json_file;
pub mod memory;
pub mod records;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use records::{
    ContactTicket, GenerationStatus, GenerationSummary, OrderProvider, OrderRecord, OrderStatus,
    OrderType,
};

pub const KEY_SUBSCRIPTION: &str = "pb.sub";
pub const KEY_USED_TODAY: &str = "pb.usedToday";
pub const KEY_USED_TODAY_AT: &str = "pb.usedTodayAt";
pub const KEY_ORDERS: &str = "pb.orders";
pub const KEY_TICKETS: &str = "pb.tickets";
pub const KEY_GENERATIONS: &str = "pb.generations";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error for key '{key}': {message}")]
    Serialization { key: String, message: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Minimal string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed JSON helpers layered over any [`KeyValueStore`]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and deserialize a value; missing keys yield `None`
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Serialization {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set(key, &raw)
    }

    /// Append one item to a JSON array stored under `key`
    fn append_json<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        item: T,
    ) -> Result<(), StoreError> {
        let mut list: Vec<T> = self.get_json(key)?.unwrap_or_default();
        list.push(item);
        self.set_json(key, &list)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
