// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application context
//!
//! Owns everything one user session needs: the backend, throttling and
//! quota state, the current run's gallery and selection, and the
//! subscription. Nothing here is global; every dependency is injected.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::StyleDescriptor;
use crate::config::StudioConfig;
use crate::entitlement::{
    authorize_download, plan_downloads, DownloadDecision, DownloadPlan, EntitlementViolation,
    SelectionSet, SubscriptionManager, SubscriptionState, ToggleOutcome, UpgradeError,
};
use crate::generation::{
    Gallery, GeminiClient, GeneratedImage, GenerationError, GenerationPipeline, GenerationReport,
    ImageBackend, InputImage,
};
use crate::quota::{DailyAdmission, DailyUsage, GenerationRateLimiter};
use crate::storage::records::{
    list_generations, list_orders, submit_ticket, upsert_generation, ContactTicket,
    GenerationStatus, GenerationSummary, OrderRecord,
};
use crate::storage::{KeyValueStore, StoreError};

pub struct Studio {
    config: StudioConfig,
    pipeline: Option<GenerationPipeline>,
    limiter: Arc<GenerationRateLimiter>,
    usage: DailyUsage,
    store: Arc<dyn KeyValueStore>,
    gallery: Gallery,
    selection: Mutex<SelectionSet>,
    subscription: SubscriptionManager,
}

impl Studio {
    /// Build a studio talking to the Gemini service.
    ///
    /// A missing credential is not an error here: the studio starts with
    /// generation disabled and `start_generation` reports it.
    pub fn new(config: StudioConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, GenerationError> {
        let backend: Option<Arc<dyn ImageBackend>> = if config.has_credential() {
            Some(Arc::new(GeminiClient::from_config(&config)?))
        } else {
            warn!("No API key configured; portrait generation is disabled");
            None
        };
        Self::assemble(config, backend, store)
    }

    /// Build a studio around an arbitrary backend
    pub fn with_backend(
        config: StudioConfig,
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, GenerationError> {
        Self::assemble(config, Some(backend), store)
    }

    fn assemble(
        config: StudioConfig,
        backend: Option<Arc<dyn ImageBackend>>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, GenerationError> {
        config.validate().map_err(GenerationError::Configuration)?;

        let pipeline = backend
            .map(|b| GenerationPipeline::from_config(b, &config))
            .transpose()?;
        let limiter = Arc::new(GenerationRateLimiter::new(
            config.rate_limit_capacity,
            config.refill_interval(),
        ));
        let usage = DailyUsage::load(store.clone(), config.daily_free_quota)?;
        let subscription = SubscriptionManager::load(store.clone())?;

        Ok(Self {
            config,
            pipeline,
            limiter,
            usage,
            store,
            gallery: Gallery::new(),
            selection: Mutex::new(SelectionSet::new()),
            subscription,
        })
    }

    /// Replace the subscription manager (e.g. to shorten the mock payment delay)
    pub fn with_subscription(mut self, subscription: SubscriptionManager) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<GenerationRateLimiter> {
        &self.limiter
    }

    pub fn usage(&self) -> &DailyUsage {
        &self.usage
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Keep the token count fresh in the background until `cancel` fires
    pub fn spawn_refill_ticker(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let tick = std::time::Duration::from_millis(self.config.rate_limit_tick_ms.max(1));
        self.limiter.clone().spawn_refill_ticker(tick, cancel)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_subscribed()
    }

    pub fn subscription(&self) -> SubscriptionState {
        self.subscription.state()
    }

    /// Start a run over `styles`, replacing whatever the gallery holds.
    ///
    /// Rejections happen before any limit is charged or anything is cleared,
    /// in this order: missing credential, empty style list, unreadable
    /// photo, empty token bucket, spent daily quota.
    pub async fn start_generation(
        &self,
        input: &InputImage,
        styles: &[StyleDescriptor],
    ) -> Result<GenerationReport, GenerationError> {
        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            GenerationError::Configuration("API_KEY is not set".to_string())
        })?;

        if styles.is_empty() {
            return Err(GenerationError::EmptyCatalog);
        }
        let encoded = input.encode()?;

        let outcome = self.limiter.try_consume();
        if !outcome.ok {
            return Err(GenerationError::RateLimited {
                cooldown_ms: outcome.cooldown_ms.unwrap_or_default(),
            });
        }

        match self.usage.try_record(self.is_subscribed())? {
            DailyAdmission::Exhausted { used, quota } => {
                return Err(GenerationError::QuotaExhausted { used, quota });
            }
            DailyAdmission::Admitted { used } => {
                info!(used, quota = self.usage.quota(), "Free generation admitted");
            }
            DailyAdmission::Unmetered => {}
        }

        let ticket = self.gallery.begin_run();
        self.lock_selection().clear();

        let mut summary = GenerationSummary {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().timestamp_millis(),
            style_count: styles.len(),
            status: GenerationStatus::Running,
            succeeded: 0,
        };
        self.record_history(&summary);

        let result = pipeline
            .generate_encoded(&encoded, styles, &ticket.cancel, |image| {
                self.gallery.deliver(ticket.id, image);
            })
            .await;
        self.gallery.finish(ticket.id);

        match &result {
            Ok(report) => {
                summary.succeeded = report.succeeded;
                summary.status = if report.succeeded > 0 {
                    GenerationStatus::Success
                } else {
                    GenerationStatus::Failed
                };
            }
            Err(e) => {
                warn!(code = e.error_code(), "Generation run failed: {}", e);
                summary.status = GenerationStatus::Failed;
            }
        }
        self.record_history(&summary);
        result
    }

    fn record_history(&self, summary: &GenerationSummary) {
        if let Err(e) = upsert_generation(self.store.as_ref(), summary.clone()) {
            warn!(id = %summary.id, "Failed to record generation history: {}", e);
        }
    }

    /// Stop the current run; images already delivered stay in the gallery
    pub fn cancel_generation(&self) {
        self.gallery.cancel_current();
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.gallery.images()
    }

    pub fn selection(&self) -> SelectionSet {
        self.lock_selection().clone()
    }

    fn lock_selection(&self) -> std::sync::MutexGuard<'_, SelectionSet> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn toggle_select(&self, image_id: Uuid) -> ToggleOutcome {
        let images = self.gallery.images();
        let is_subscribed = self.is_subscribed();
        self.lock_selection().toggle(
            image_id,
            &images,
            is_subscribed,
            self.config.free_selection_limit,
        )
    }

    pub fn authorize_download(&self) -> DownloadDecision {
        let images = self.gallery.images();
        authorize_download(&self.lock_selection(), &images, self.is_subscribed())
    }

    /// Release schedule for the current selection
    pub fn download_plan(&self) -> Result<DownloadPlan, EntitlementViolation> {
        let images = self.gallery.images();
        plan_downloads(
            &self.lock_selection(),
            &images,
            self.is_subscribed(),
            self.config.download_stagger(),
        )
    }

    pub fn redeem_code(&self, code: &str) -> Result<SubscriptionState, UpgradeError> {
        self.subscription.redeem_code(code)
    }

    pub async fn complete_mock_payment(&self) -> Result<SubscriptionState, UpgradeError> {
        self.subscription.complete_mock_payment().await
    }

    pub fn submit_contact(&self, email: &str, message: &str) -> Result<(), StoreError> {
        submit_ticket(
            self.store.as_ref(),
            ContactTicket {
                email: email.to_string(),
                content: message.to_string(),
                created_at: Utc::now().timestamp_millis(),
            },
        )
    }

    pub fn orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        list_orders(self.store.as_ref())
    }

    pub fn generation_history(&self) -> Result<Vec<GenerationSummary>, StoreError> {
        list_generations(self.store.as_ref())
    }
}
