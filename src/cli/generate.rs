// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;

use crate::catalog::StyleCatalog;
use crate::entitlement::{DirectorySink, ToggleOutcome};
use crate::generation::InputImage;
use crate::studio::Studio;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Photo to stylize (JPEG, PNG, GIF or WebP)
    #[arg(long)]
    pub image: PathBuf,

    /// Directory the selected portraits are written to
    #[arg(long)]
    pub out: PathBuf,

    /// Style names to download; defaults to every image the plan allows
    #[arg(long, num_args = 1..)]
    pub select: Vec<String>,

    /// Redeem a Pro code before generating
    #[arg(long)]
    pub code: Option<String>,
}

pub fn list_styles() {
    let catalog = StyleCatalog::portraits();
    println!("🎨 {} styles ({} Pro):", catalog.len(), catalog.premium_count());
    for style in catalog.styles() {
        let tier = if style.is_premium { "PRO " } else { "FREE" };
        println!("  [{}] {}", tier, style.name);
    }
}

pub async fn run(studio: &Studio, args: GenerateArgs) -> Result<()> {
    if let Some(code) = &args.code {
        match studio.redeem_code(code) {
            Ok(_) => println!("✅ Pro activated"),
            Err(e) => println!("⚠️  {}", e),
        }
    }

    let input = InputImage::load(&args.image)
        .await
        .map_err(|e| anyhow!("Failed to read {}: {}", args.image.display(), e))?;

    let catalog = StyleCatalog::portraits();
    println!("🍌 Generating {} portraits...", catalog.len());
    let report = studio
        .start_generation(&input, catalog.styles())
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!(
        "✅ {} of {} styles rendered in {:.1}s",
        report.succeeded,
        report.requested,
        report.elapsed_ms as f64 / 1000.0
    );
    if report.failed > 0 {
        println!("⚠️  {} styles failed and were skipped", report.failed);
    }

    select_images(studio, &args.select);

    let plan = studio.download_plan().map_err(|e| anyhow!(e.user_message()))?;
    if plan.is_empty() {
        println!("Nothing selected to download");
        return Ok(());
    }

    let sink = DirectorySink::new(&args.out);
    let written = plan.release(&sink).await?;
    println!("💾 Saved {} portraits to {}", written, args.out.display());
    Ok(())
}

fn select_images(studio: &Studio, names: &[String]) {
    let images = studio.images();

    if names.is_empty() {
        let subscribed = studio.is_subscribed();
        for image in images.iter().filter(|img| subscribed || !img.is_premium) {
            if let ToggleOutcome::Rejected(violation) = studio.toggle_select(image.id) {
                println!("ℹ️  {}", violation.user_message());
                break;
            }
        }
        return;
    }

    for name in names {
        match images.iter().find(|img| img.name == *name) {
            Some(image) => {
                if let ToggleOutcome::Rejected(violation) = studio.toggle_select(image.id) {
                    println!("⚠️  {}: {}", name, violation.user_message());
                }
            }
            None => println!("⚠️  No rendered image for style '{}'", name),
        }
    }
}
