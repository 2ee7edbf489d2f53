mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::comps::{CompsArgs, ScoreArgs};
use commands::dcf::{DcfArgs, SensitivityArgs};
use commands::ddm::DdmArgs;
use commands::rates::{CostOfEquityArgs, WaccArgs};

/// Intrinsic equity valuation with decimal precision
#[derive(Parser)]
#[command(
    name = "fairval",
    version,
    about = "Intrinsic equity valuation with decimal precision",
    long_about = "A CLI for estimating the intrinsic value of equities with decimal \
                  precision. Supports CAPM/WACC discount rates, DCF and dividend \
                  discount valuations, fair-value sensitivity grids, and z-score \
                  ranked peer comparables."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the CAPM cost of equity
    CostOfEquity(CostOfEquityArgs),
    /// Calculate the Weighted Average Cost of Capital
    Wacc(WaccArgs),
    /// Run a free cash flow DCF valuation
    Dcf(DcfArgs),
    /// Sweep DCF fair value over a discount-rate x terminal-growth grid
    Sensitivity(SensitivityArgs),
    /// Run a dividend discount valuation (Gordon or multi-stage)
    Ddm(DdmArgs),
    /// Compute valuation multiples across a target and its peers
    Comps(CompsArgs),
    /// Rank a comparable set by composite z-score
    Score(ScoreArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::CostOfEquity(args) => commands::rates::run_cost_of_equity(args),
        Commands::Wacc(args) => commands::rates::run_wacc(args),
        Commands::Dcf(args) => commands::dcf::run_dcf(args),
        Commands::Sensitivity(args) => commands::dcf::run_sensitivity(args),
        Commands::Ddm(args) => commands::ddm::run_ddm(args),
        Commands::Comps(args) => commands::comps::run_comps(args),
        Commands::Score(args) => commands::comps::run_score(args),
        Commands::Version => {
            println!("fairval {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
