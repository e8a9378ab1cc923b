// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mock subscription upgrade flow
//!
//! `Free -> Pending -> Pro`, or back to `Free` when a code is rejected.
//! No real payment is processed; the redemption code is a placeholder
//! policy, not a security mechanism.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use super::{EntitlementViolation, UpgradeError};
use crate::storage::records::{record_order, OrderRecord};
use crate::storage::{KeyValueStore, KeyValueStoreExt, StoreError, KEY_SUBSCRIPTION};

/// Exact, case-sensitive test code that activates Pro
pub const REDEMPTION_CODE: &str = "BANANA2024";
pub const PRO_PRICE: f64 = 9.99;
pub const PRO_CURRENCY: &str = "USD";
/// Validity of a paid mock subscription
pub const PRO_PERIOD: Duration = Duration::from_secs(7 * 24 * 3600);
/// Simulated payment processing time
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub is_pro: bool,
    /// Epoch milliseconds; `None` means no expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

impl SubscriptionState {
    pub fn free() -> Self {
        Self::default()
    }

    /// Pro and not past `expire_at`
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        self.is_pro && self.expire_at.map_or(true, |exp| now_ms < exp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradePhase {
    Free,
    /// A code check or mock payment is being processed
    Pending,
    Pro,
}

pub struct SubscriptionManager {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SubscriptionState>,
    phase: Mutex<UpgradePhase>,
    payment_delay: Duration,
}

impl SubscriptionManager {
    /// Load persisted subscription state; unreadable state falls back to Free
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let state = match store.get_json::<SubscriptionState>(KEY_SUBSCRIPTION) {
            Ok(state) => state.unwrap_or_default(),
            Err(StoreError::Serialization { message, .. }) => {
                warn!("Ignoring unreadable subscription state: {}", message);
                SubscriptionState::free()
            }
            Err(e) => return Err(e),
        };
        let phase = if state.is_active_at(now_ms()) {
            UpgradePhase::Pro
        } else {
            UpgradePhase::Free
        };
        Ok(Self {
            store,
            state: Mutex::new(state),
            phase: Mutex::new(phase),
            payment_delay: DEFAULT_PAYMENT_DELAY,
        })
    }

    pub fn with_payment_delay(mut self, delay: Duration) -> Self {
        self.payment_delay = delay;
        self
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn phase(&self) -> UpgradePhase {
        self.phase.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state().is_active_at(now_ms())
    }

    /// Redeem a test code. Exact string match; no expiry on success.
    pub fn redeem_code(&self, code: &str) -> Result<SubscriptionState, UpgradeError> {
        self.redeem_code_at(code, now_ms())
    }

    pub fn redeem_code_at(&self, code: &str, now_ms: i64) -> Result<SubscriptionState, UpgradeError> {
        if let Some(current) = self.already_pro(now_ms) {
            return Ok(current);
        }
        let pending = self.enter_pending()?;

        if code != REDEMPTION_CODE {
            info!("Redemption code rejected");
            return Err(EntitlementViolation::InvalidRedemptionCode.into());
        }

        let state = SubscriptionState {
            is_pro: true,
            expire_at: None,
        };
        self.activate(
            pending,
            state,
            OrderRecord::mock_subscription(PRO_PRICE, PRO_CURRENCY, now_ms),
        )
    }

    /// Simulate an out-of-band payment, then activate Pro for [`PRO_PERIOD`]
    pub async fn complete_mock_payment(&self) -> Result<SubscriptionState, UpgradeError> {
        if let Some(current) = self.already_pro(now_ms()) {
            return Ok(current);
        }
        let pending = self.enter_pending()?;

        tokio::time::sleep(self.payment_delay).await;

        let now = now_ms();
        let state = SubscriptionState {
            is_pro: true,
            expire_at: Some(now + PRO_PERIOD.as_millis() as i64),
        };
        let order = OrderRecord::mock_subscription(PRO_PRICE, PRO_CURRENCY, now);
        self.activate(pending, state, order)
    }

    fn already_pro(&self, now_ms: i64) -> Option<SubscriptionState> {
        let state = self.state();
        state.is_active_at(now_ms).then_some(state)
    }

    fn enter_pending(&self) -> Result<PendingUpgrade<'_>, UpgradeError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase == UpgradePhase::Pending {
            return Err(UpgradeError::InProgress);
        }
        *phase = UpgradePhase::Pending;
        Ok(PendingUpgrade {
            phase: &self.phase,
            armed: true,
        })
    }

    fn activate(
        &self,
        mut pending: PendingUpgrade<'_>,
        state: SubscriptionState,
        order: OrderRecord,
    ) -> Result<SubscriptionState, UpgradeError> {
        self.store
            .set_json(KEY_SUBSCRIPTION, &state)
            .and_then(|_| record_order(self.store.as_ref(), order))?;

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        pending.complete();
        info!(expire_at = ?state.expire_at, "Pro subscription activated");
        Ok(state)
    }
}

/// Holds the `Pending` phase; reverts to `Free` unless completed
struct PendingUpgrade<'a> {
    phase: &'a Mutex<UpgradePhase>,
    armed: bool,
}

impl PendingUpgrade<'_> {
    fn complete(&mut self) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = UpgradePhase::Pro;
        self.armed = false;
    }
}

impl Drop for PendingUpgrade<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = UpgradePhase::Free;
        }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
