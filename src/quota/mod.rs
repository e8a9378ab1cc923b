// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client-side throttling: token bucket and daily usage quota

pub mod daily;
pub mod token_bucket;

pub use daily::{DailyAdmission, DailyUsage};
pub use token_bucket::{ConsumeOutcome, GenerationRateLimiter, TokenBucket};
