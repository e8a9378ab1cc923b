// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod account;
pub mod generate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{StudioConfig, DEFAULT_STORE_PATH};
use crate::storage::{JsonFileStore, KeyValueStore};
use crate::studio::Studio;

/// Portrait Banana CLI
#[derive(Parser, Debug)]
#[command(name = "portrait-banana")]
#[command(version)]
#[command(about = "Generate stylized portraits from a single photo", long_about = None)]
pub struct Cli {
    /// JSON file holding subscription, quota, orders and history
    #[arg(long, global = true, env = "PB_STORE_PATH", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in portrait styles
    Styles,

    /// Render every style for a photo and save the selected results
    Generate(generate::GenerateArgs),

    /// Complete a mock Pro payment
    Subscribe,

    /// Redeem a Pro test code
    Redeem(account::RedeemArgs),

    /// Show the mock order ledger
    Orders,

    /// Show past generation runs
    History,

    /// Leave a message for support
    Contact(account::ContactArgs),
}

/// Load `.env` (or `env_file`), then parse `args`.
///
/// The env file is read first so its values reach the `env =` args.
pub fn parse_with_env_file<I, T>(env_file: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match env_file {
        Some(path) => dotenv::from_path(path).ok(),
        None => dotenv::dotenv().ok().map(|_| ()),
    };
    Cli::try_parse_from(args)
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    if let Commands::Styles = cli.command {
        generate::list_styles();
        return Ok(());
    }

    let studio = open_studio(cli.store)?;
    match cli.command {
        Commands::Styles => Ok(()),
        Commands::Generate(args) => generate::run(&studio, args).await,
        Commands::Subscribe => account::subscribe(&studio).await,
        Commands::Redeem(args) => account::redeem(&studio, args),
        Commands::Orders => account::orders(&studio),
        Commands::History => account::history(&studio),
        Commands::Contact(args) => account::contact(&studio, args),
    }
}

fn open_studio(store_path: PathBuf) -> Result<Studio> {
    let mut config = StudioConfig::from_env();
    config.store_path = store_path;

    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.store_path)
            .with_context(|| format!("Failed to open store at {}", config.store_path.display()))?,
    );
    Studio::new(config, store).context("Failed to initialize studio")
}
