use anyhow::Result;
use clap::{Parser, Subcommand};

use timelens::cli::{self, FilterArgs};

#[derive(Debug, Parser)]
#[command(name = "timelens")]
#[command(about = "Feature time-spent analytics dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web dashboard
    Serve {
        /// Listen address, e.g. 127.0.0.1:5173
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_browser: bool,
    },
    /// Print total time spent per feature
    Aggregate {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print daily totals for one feature
    Trend {
        /// Feature name as reported by the aggregate
        feature: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print a shareable dashboard URL for a filter selection
    Share {
        #[command(flatten)]
        filter: FilterArgs,
        /// Dashboard URL to attach the filters to
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.timelens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr, no_browser),
        Commands::Aggregate { filter, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_aggregate(filter, fmt)
        }
        Commands::Trend {
            feature,
            filter,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_trend(&feature, filter, fmt)
        }
        Commands::Share { filter, base_url } => cli::run_share(filter, base_url),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}
