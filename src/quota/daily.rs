// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-day generation quota for free users

use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::storage::{
    KeyValueStore, KeyValueStoreExt, StoreError, KEY_USED_TODAY, KEY_USED_TODAY_AT,
};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Outcome of asking the daily quota for one more run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyAdmission {
    /// Counted against the quota; `used` includes this run
    Admitted { used: u32 },
    /// Quota already spent for today
    Exhausted { used: u32, quota: u32 },
    /// Subscribers are not metered
    Unmetered,
}

#[derive(Debug)]
struct UsageState {
    used: u32,
    day: String,
}

/// Daily usage counter persisted through the store, reset on day change
pub struct DailyUsage {
    store: Arc<dyn KeyValueStore>,
    quota: u32,
    state: Mutex<UsageState>,
}

impl DailyUsage {
    pub fn load(store: Arc<dyn KeyValueStore>, quota: u32) -> Result<Self, StoreError> {
        Self::load_for(store, quota, Local::now().date_naive())
    }

    /// Load the counter as of `today`, resetting it when the stored day differs
    pub fn load_for(
        store: Arc<dyn KeyValueStore>,
        quota: u32,
        today: NaiveDate,
    ) -> Result<Self, StoreError> {
        let day = today.format(DAY_FORMAT).to_string();
        let stored_day = store.get(KEY_USED_TODAY_AT)?;
        let used = if stored_day.as_deref() == Some(day.as_str()) {
            store.get_json::<u32>(KEY_USED_TODAY).unwrap_or(None).unwrap_or(0)
        } else {
            store.set(KEY_USED_TODAY_AT, &day)?;
            store.set_json(KEY_USED_TODAY, &0u32)?;
            0
        };
        debug!(used, quota, day = %day, "Loaded daily usage");
        Ok(Self {
            store,
            quota,
            state: Mutex::new(UsageState { used, day }),
        })
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn used_today(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).used
    }

    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.used_today())
    }

    pub fn try_record(&self, is_pro: bool) -> Result<DailyAdmission, StoreError> {
        self.try_record_on(Local::now().date_naive(), is_pro)
    }

    /// Count one run on `today` unless the quota is spent or the user is Pro
    pub fn try_record_on(
        &self,
        today: NaiveDate,
        is_pro: bool,
    ) -> Result<DailyAdmission, StoreError> {
        if is_pro {
            return Ok(DailyAdmission::Unmetered);
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let day = today.format(DAY_FORMAT).to_string();
        if state.day != day {
            info!(previous = %state.day, day = %day, "Daily usage reset");
            state.day = day;
            state.used = 0;
        }

        if state.used >= self.quota {
            return Ok(DailyAdmission::Exhausted {
                used: state.used,
                quota: self.quota,
            });
        }

        let used = state.used + 1;
        self.store.set_json(KEY_USED_TODAY, &used)?;
        self.store.set(KEY_USED_TODAY_AT, &state.day)?;
        state.used = used;
        Ok(DailyAdmission::Admitted { used })
    }
}
