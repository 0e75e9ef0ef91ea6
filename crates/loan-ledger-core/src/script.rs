//! Replay a sequence of ledger operations against a registry.
//!
//! Scripts are plain JSON so a whole loan lifetime can be driven from a file:
//!
//! ```json
//! { "steps": [
//!     { "op": "create", "principal": "1000", "annual_rate": "0.10", "term_weeks": 4 },
//!     { "op": "advance", "loan_id": 1, "week": 2 },
//!     { "op": "pay", "loan_id": 1, "week": 2 },
//!     { "op": "delinquent", "loan_id": 1 }
//! ] }
//! ```
//!
//! A refused step is recorded and the run carries on.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loan::PaymentReceipt;
use crate::registry::{LoanSummary, Loans};
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LedgerStep {
    Create {
        principal: Money,
        annual_rate: Rate,
        term_weeks: Week,
    },
    Advance {
        loan_id: LoanId,
        week: Week,
    },
    Pay {
        loan_id: LoanId,
        week: Week,
    },
    Outstanding {
        loan_id: LoanId,
    },
    Delinquent {
        loan_id: LoanId,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerScript {
    pub steps: Vec<LedgerStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Created {
        loan_id: LoanId,
        weekly_installment: Money,
        outstanding: Money,
    },
    Advanced {
        loan_id: LoanId,
        week: Week,
        delinquent: bool,
    },
    Paid {
        receipt: PaymentReceipt,
    },
    Outstanding {
        loan_id: LoanId,
        amount: Money,
    },
    Delinquent {
        loan_id: LoanId,
        delinquent: bool,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReport {
    pub steps: Vec<StepRecord>,
    pub rejected: usize,
    pub loans: Vec<LoanSummary>,
}

impl LedgerScript {
    pub fn push(&mut self, step: LedgerStep) -> &mut Self {
        self.steps.push(step);
        self
    }
}

pub fn run_step(loans: &Loans, step: &LedgerStep) -> StepOutcome {
    let outcome = match *step {
        LedgerStep::Create {
            principal,
            annual_rate,
            term_weeks,
        } => loans
            .create_loan(principal, annual_rate, term_weeks)
            .and_then(|loan_id| {
                let summary = loans.summary(loan_id)?;
                Ok(StepOutcome::Created {
                    loan_id,
                    weekly_installment: summary.weekly_installment,
                    outstanding: summary.outstanding,
                })
            }),
        LedgerStep::Advance { loan_id, week } => {
            loans.advance_to_week(loan_id, week).and_then(|()| {
                Ok(StepOutcome::Advanced {
                    loan_id,
                    week,
                    delinquent: loans.try_is_delinquent(loan_id)?,
                })
            })
        }
        LedgerStep::Pay { loan_id, week } => loans
            .try_make_payment(loan_id, week)
            .map(|receipt| StepOutcome::Paid { receipt }),
        LedgerStep::Outstanding { loan_id } => loans
            .try_outstanding(loan_id)
            .map(|amount| StepOutcome::Outstanding { loan_id, amount }),
        LedgerStep::Delinquent { loan_id } => loans
            .try_is_delinquent(loan_id)
            .map(|delinquent| StepOutcome::Delinquent {
                loan_id,
                delinquent,
            }),
    };

    outcome.unwrap_or_else(|e| StepOutcome::Rejected {
        reason: e.to_string(),
    })
}

/// Run every step in order against `loans` and summarise the final book.
pub fn run_script(loans: &Loans, script: &LedgerScript) -> ScriptReport {
    let mut steps = Vec::with_capacity(script.steps.len());
    let mut rejected = 0;

    for (i, step) in script.steps.iter().enumerate() {
        let outcome = run_step(loans, step);
        if let StepOutcome::Rejected { reason } = &outcome {
            debug!(step = i + 1, %reason, "step rejected");
            rejected += 1;
        }
        steps.push(StepRecord {
            step: i + 1,
            outcome,
        });
    }

    ScriptReport {
        steps,
        rejected,
        loans: loans.summaries(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_script_json() {
        let json = r#"{ "steps": [
            { "op": "create", "principal": "1000", "annual_rate": "0.10", "term_weeks": 4 },
            { "op": "advance", "loan_id": 1, "week": 3 },
            { "op": "pay", "loan_id": 1, "week": 3 },
            { "op": "outstanding", "loan_id": 1 },
            { "op": "delinquent", "loan_id": 1 }
        ] }"#;
        let script: LedgerScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.steps.len(), 5);
        assert!(matches!(script.steps[1], LedgerStep::Advance { loan_id: LoanId(1), week: 3 }));
    }

    #[test]
    fn test_run_script_records_rejections_and_continues() {
        let mut script = LedgerScript::default();
        script
            .push(LedgerStep::Create {
                principal: dec!(1000),
                annual_rate: Decimal::ZERO,
                term_weeks: 2,
            })
            .push(LedgerStep::Pay { loan_id: LoanId(9), week: 1 })
            .push(LedgerStep::Pay { loan_id: LoanId(1), week: 1 })
            .push(LedgerStep::Outstanding { loan_id: LoanId(1) });

        let loans = Loans::new();
        let report = run_script(&loans, &script);

        assert_eq!(report.rejected, 1);
        assert!(matches!(report.steps[1].outcome, StepOutcome::Rejected { .. }));
        assert_eq!(
            report.steps[3].outcome,
            StepOutcome::Outstanding {
                loan_id: LoanId(1),
                amount: dec!(500),
            }
        );
        assert_eq!(report.loans.len(), 1);
        assert_eq!(report.loans[0].payments_made, 1);
    }

    #[test]
    fn test_advance_reports_delinquency() {
        let loans = Loans::new();
        let id = loans.create_loan(dec!(1000), dec!(0.10), 10).unwrap();
        let outcome = run_step(&loans, &LedgerStep::Advance { loan_id: id, week: 2 });
        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                loan_id: id,
                week: 2,
                delinquent: true,
            }
        );
    }

    #[test]
    fn test_step_records_serialize_flat() {
        let record = StepRecord {
            step: 1,
            outcome: StepOutcome::Delinquent {
                loan_id: LoanId(3),
                delinquent: false,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["outcome"], "delinquent");
        assert_eq!(value["loan_id"], 3);
        assert_eq!(value["step"], 1);
    }
}
