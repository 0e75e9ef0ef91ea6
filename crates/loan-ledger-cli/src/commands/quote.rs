use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_ledger_core::schedule::{quote_loan, LoanTerms};

use crate::input;

/// Arguments for a loan quote
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct QuoteArgs {
    /// Path to JSON file with loan terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate as a decimal (0.10 = 10%)
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Number of weekly installments
    #[arg(long, alias = "weeks")]
    pub term_weeks: Option<u32>,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(terms) = input::stdin::read_stdin()? {
        terms
    } else {
        LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_weeks: args
                .term_weeks
                .ok_or("--term-weeks is required (or provide --input)")?,
        }
    };

    let result = quote_loan(&terms)?;
    Ok(serde_json::to_value(result)?)
}
