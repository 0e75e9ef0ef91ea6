mod commands;
mod input;
mod output;
mod terminal;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::demo::DemoArgs;
use commands::quote::QuoteArgs;
use commands::simulate::SimulateArgs;

/// Weekly amortizing loan ledger
#[derive(Parser)]
#[command(
    name = "ledger",
    version,
    about = "Quote, simulate and demo weekly amortizing loans",
    long_about = "An in-memory loan ledger with decimal precision. Quotes flat-interest \
                  weekly schedules, replays scripted payment histories against a fresh \
                  registry and flags delinquent loans."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter for ledger events on stderr (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a loan: weekly installment, totals and billing schedule
    Quote(QuoteArgs),
    /// Replay a JSON ledger script against a fresh registry
    Simulate(SimulateArgs),
    /// Run the two-loan repayment demo
    Demo(DemoArgs),
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
    terminal::logging::init(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Demo(args) => commands::demo::run_demo(args),
        Commands::Version => {
            println!("ledger {}", env!("CARGO_PKG_VERSION"));
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
