use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tradelens::core::log::init_logging;
use tradelens::{AppCommand, ChartOptions};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ChartArgs {
    /// Account ids to include; omit for all accounts
    #[arg(short, long, value_delimiter = ',')]
    accounts: Vec<i64>,

    /// Override the display currency for converted views
    #[arg(long)]
    currency: Option<String>,

    /// Convert even when the selected accounts share a currency
    #[arg(long)]
    converted: bool,
}

impl From<ChartArgs> for ChartOptions {
    fn from(args: ChartArgs) -> ChartOptions {
        ChartOptions {
            accounts: args.accounts,
            currency: args.currency,
            converted: args.converted,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare account balance curves
    Balance(ChartArgs),
    /// Compare account equity curves
    Equity(ChartArgs),
    /// Compare monthly profit and loss
    Pnl(ChartArgs),
    /// Compare cumulative profit and loss
    Cumulative(ChartArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tradelens::cli::setup::setup(),
        Some(command) => {
            let (command, args) = match command {
                Commands::Balance(args) => (AppCommand::Balance, args),
                Commands::Equity(args) => (AppCommand::Equity, args),
                Commands::Pnl(args) => (AppCommand::MonthlyPnl, args),
                Commands::Cumulative(args) => (AppCommand::CumulativePnl, args),
                Commands::Setup => unreachable!("Setup command is handled separately"),
            };
            tradelens::run_command(command, args.into(), cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
