pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::Cache;
use crate::core::chart::ChartKind;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// The chart commands the CLI can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Balance,
    Equity,
    MonthlyPnl,
    CumulativePnl,
}

impl From<AppCommand> for ChartKind {
    fn from(command: AppCommand) -> ChartKind {
        match command {
            AppCommand::Balance => ChartKind::Balance,
            AppCommand::Equity => ChartKind::Equity,
            AppCommand::MonthlyPnl => ChartKind::MonthlyPnl,
            AppCommand::CumulativePnl => ChartKind::CumulativePnl,
        }
    }
}

/// Per-invocation overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    /// Selected account ids; empty falls back to the config default.
    pub accounts: Vec<i64>,
    /// Display-currency override for converted views.
    pub currency: Option<String>,
    /// Forces conversion in the native display modes.
    pub converted: bool,
}

pub async fn run_command(
    command: AppCommand,
    options: ChartOptions,
    config_path: Option<&str>,
) -> Result<()> {
    info!("tradelens starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let rates = config.exchange_rates.build()?;

    let cache = Arc::new(Cache::new());
    let base_url = config
        .providers
        .journal
        .as_ref()
        .map_or("http://localhost:8080", |p| &p.base_url);
    let provider = providers::JournalApiProvider::new(base_url, cache);

    let selection = if options.accounts.is_empty() {
        config.accounts.clone()
    } else {
        options.accounts
    };
    let target_currency = options.currency.unwrap_or_else(|| config.currency.clone());

    cli::chart::run(
        &provider,
        &rates,
        command.into(),
        &selection,
        &target_currency,
        options.converted,
    )
    .await
}
