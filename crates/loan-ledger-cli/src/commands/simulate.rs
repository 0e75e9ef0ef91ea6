use clap::Args;
use serde_json::Value;
use std::time::Instant;

use loan_ledger_core::script::{run_script, LedgerScript, StepOutcome};
use loan_ledger_core::types::with_metadata;
use loan_ledger_core::Loans;

use crate::input;

/// Arguments for replaying a ledger script
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON ledger script (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let script: LedgerScript = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(script) = input::stdin::read_stdin()? {
        script
    } else {
        return Err("a ledger script is required: pass --input <file> or pipe JSON on stdin".into());
    };

    replay("Ledger script replay", &script)
}

/// Run a script against a fresh registry and wrap the report in the standard
/// envelope. Refused steps become warnings.
pub(crate) fn replay(
    methodology: &str,
    script: &LedgerScript,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loans = Loans::new();
    let report = run_script(&loans, script);

    let warnings: Vec<String> = report
        .steps
        .iter()
        .filter_map(|record| match &record.outcome {
            StepOutcome::Rejected { reason } => Some(format!("Step {}: {}", record.step, reason)),
            _ => None,
        })
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        methodology,
        &serde_json::json!({ "steps": script.steps.len() }),
        warnings,
        elapsed,
        report,
    );
    Ok(serde_json::to_value(output)?)
}
