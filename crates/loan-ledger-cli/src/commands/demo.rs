use clap::Args;
use rust_decimal_macros::dec;
use serde_json::Value;

use loan_ledger_core::schedule::LoanTerms;
use loan_ledger_core::script::{LedgerScript, LedgerStep};
use loan_ledger_core::LoanId;

use super::simulate::replay;

/// Arguments for the demo run
#[derive(Args)]
pub struct DemoArgs {
    /// Skip the payment for this week on every loan (repeatable)
    #[arg(long = "miss", value_name = "WEEK")]
    pub missed_weeks: Vec<u32>,
}

/// Two loans paid week by week, checking delinquency after each week.
pub fn run_demo(args: DemoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let book = [
        LoanTerms::new(dec!(5_000_000), dec!(0.10), 50),
        LoanTerms::new(dec!(3_000_000), dec!(0.10), 30),
    ];

    let mut script = LedgerScript::default();
    for terms in &book {
        script.push(LedgerStep::Create {
            principal: terms.principal,
            annual_rate: terms.annual_rate,
            term_weeks: terms.term_weeks,
        });
    }

    // A fresh registry numbers the book from 1.
    for (loan_id, terms) in (1..).map(LoanId).zip(&book) {
        for week in 1..=terms.term_weeks {
            if args.missed_weeks.contains(&week) {
                script.push(LedgerStep::Advance { loan_id, week });
            } else {
                script.push(LedgerStep::Pay { loan_id, week });
            }
            script.push(LedgerStep::Delinquent { loan_id });
        }
        script.push(LedgerStep::Outstanding { loan_id });
    }

    replay("Demo: weekly repayment of a two-loan book", &script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_pays_off_both_loans() {
        let value = run_demo(DemoArgs { missed_weeks: vec![] }).unwrap();
        let result = &value["result"];
        assert_eq!(result["rejected"], 0);

        let loans = result["loans"].as_array().unwrap();
        assert_eq!(loans.len(), 2);
        assert!(loans.iter().all(|l| l["status"] == "paid_off"));
        assert!(loans.iter().all(|l| l["delinquent"] == false));
    }

    #[test]
    fn test_demo_missed_weeks_show_delinquency() {
        let value = run_demo(DemoArgs {
            missed_weeks: vec![10, 11],
        })
        .unwrap();
        let steps = value["result"]["steps"].as_array().unwrap();

        let flagged = steps
            .iter()
            .filter(|s| s["outcome"] == "delinquent" && s["delinquent"] == true)
            .count();
        // Week 11 on each loan: two weeks since the week 9 payment.
        assert_eq!(flagged, 2);

        let loans = value["result"]["loans"].as_array().unwrap();
        assert!(loans.iter().all(|l| l["status"] == "active"));
    }
}
