// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use chrono::{Local, TimeZone};
use clap::Args;

use crate::entitlement::{UpgradeError, PRO_CURRENCY, PRO_PRICE};
use crate::studio::Studio;

/// Arguments for the redeem command
#[derive(Args, Debug)]
pub struct RedeemArgs {
    /// Test code, matched exactly
    pub code: String,
}

/// Arguments for the contact command
#[derive(Args, Debug)]
pub struct ContactArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub message: String,
}

fn format_ts(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn upgrade_failure(e: UpgradeError) -> anyhow::Error {
    match e {
        UpgradeError::Rejected(violation) => anyhow!(violation.user_message()),
        other => anyhow!(other),
    }
}

pub async fn subscribe(studio: &Studio) -> Result<()> {
    if studio.is_subscribed() {
        println!("✅ Already on Pro");
        return Ok(());
    }
    println!("💳 Processing mock payment of {:.2} {}...", PRO_PRICE, PRO_CURRENCY);
    let state = studio.complete_mock_payment().await.map_err(upgrade_failure)?;
    match state.expire_at {
        Some(exp) => println!("✅ Pro active until {}", format_ts(exp)),
        None => println!("✅ Pro active"),
    }
    Ok(())
}

pub fn redeem(studio: &Studio, args: RedeemArgs) -> Result<()> {
    studio.redeem_code(&args.code).map_err(upgrade_failure)?;
    println!("✅ Code accepted, Pro activated");
    Ok(())
}

pub fn orders(studio: &Studio) -> Result<()> {
    let orders = studio.orders()?;
    if orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    println!("📋 Orders:");
    for order in orders {
        println!(
            "  {}  {:?}  {:.2} {}  {:?}  {:?}  {}",
            order.id,
            order.order_type,
            order.amount,
            order.currency,
            order.status,
            order.provider,
            format_ts(order.created_at)
        );
    }
    Ok(())
}

pub fn history(studio: &Studio) -> Result<()> {
    let runs = studio.generation_history()?;
    if runs.is_empty() {
        println!("No generations yet");
        return Ok(());
    }
    println!("🕘 Generation history:");
    for run in runs {
        println!(
            "  {}  {:?}  {}/{} styles  {}",
            format_ts(run.created_at),
            run.status,
            run.succeeded,
            run.style_count,
            run.id
        );
    }
    let usage = studio.usage();
    println!(
        "Free runs left today: {}/{}",
        usage.remaining(),
        usage.quota()
    );
    Ok(())
}

pub fn contact(studio: &Studio, args: ContactArgs) -> Result<()> {
    studio.submit_contact(&args.email, &args.message)?;
    println!("✅ Message received, we'll get back to you at {}", args.email);
    Ok(())
}
