use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::*;
use crate::LedgerResult;

/// Fixed year length used to turn an annual rate into a weekly one.
pub const WEEKS_PER_YEAR: Decimal = dec!(52.14);

/// Week index to amount due. Every entry of a freshly built schedule is the
/// weekly installment.
pub type BillingSchedule = BTreeMap<Week, Money>;

/// Terms requested for a new loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_weeks: Week,
}

/// Flat-interest amortisation derived from a set of loan terms
#[derive(Debug, Clone, PartialEq)]
pub struct Amortisation {
    pub weekly_rate: Rate,
    pub total_repayable: Money,
    pub weekly_installment: Money,
    pub schedule: BillingSchedule,
}

/// One row of a quoted billing schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub week: Week,
    pub amount_due: Money,
    pub balance_after: Money,
}

/// Output of a loan quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_weeks: Week,
    pub weekly_rate: Rate,
    pub total_repayable: Money,
    pub total_interest: Money,
    pub weekly_installment: Money,
    pub schedule: Vec<ScheduledInstallment>,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_weeks: Week) -> Self {
        Self {
            principal,
            annual_rate,
            term_weeks,
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.term_weeks == 0 {
            return Err(LedgerError::InvalidTerm {
                term_weeks: self.term_weeks,
            });
        }
        if self.principal <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(LedgerError::InvalidInput {
                field: "annual_rate".into(),
                reason: "Annual interest rate cannot be negative".into(),
            });
        }
        Ok(())
    }

    /// Simple interest over the term, spread evenly across every week.
    ///
    /// `total = principal * (1 + annual_rate / 52.14 * term_weeks)` and the
    /// installment is `total / term_weeks`.
    pub fn amortise(&self) -> LedgerResult<Amortisation> {
        self.validate()?;

        let weeks = Decimal::from(self.term_weeks);
        let overflow = |context: &str| LedgerError::Overflow {
            context: context.into(),
        };

        let weekly_rate = self
            .annual_rate
            .checked_div(WEEKS_PER_YEAR)
            .ok_or_else(|| overflow("weekly rate"))?;
        let growth = weekly_rate
            .checked_mul(weeks)
            .and_then(|interest| Decimal::ONE.checked_add(interest))
            .ok_or_else(|| overflow("interest accrual"))?;
        let total_repayable = self
            .principal
            .checked_mul(growth)
            .ok_or_else(|| overflow("total repayable"))?;
        let weekly_installment = total_repayable
            .checked_div(weeks)
            .ok_or_else(|| overflow("weekly installment"))?;

        let schedule = (1..=self.term_weeks)
            .map(|week| (week, weekly_installment))
            .collect();

        Ok(Amortisation {
            weekly_rate,
            total_repayable,
            weekly_installment,
            schedule,
        })
    }
}

/// Quote a loan without registering it: installment, totals and the full
/// week-by-week schedule with the running balance.
pub fn quote_loan(terms: &LoanTerms) -> LedgerResult<ComputationOutput<LoanQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let amortisation = terms.amortise()?;

    if terms.annual_rate.is_zero() {
        warnings.push("Zero interest rate; installment is principal spread over the term".into());
    }

    let mut balance = amortisation.total_repayable;
    let schedule = amortisation
        .schedule
        .iter()
        .map(|(&week, &amount_due)| {
            balance -= amount_due;
            ScheduledInstallment {
                week,
                amount_due,
                balance_after: balance,
            }
        })
        .collect();

    let output = LoanQuote {
        principal: terms.principal,
        annual_rate: terms.annual_rate,
        term_weeks: terms.term_weeks,
        weekly_rate: amortisation.weekly_rate,
        total_repayable: amortisation.total_repayable,
        total_interest: amortisation.total_repayable - terms.principal,
        weekly_installment: amortisation.weekly_installment,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat weekly amortisation (52.14-week year)",
        &serde_json::json!({
            "principal": terms.principal.to_string(),
            "annual_rate": terms.annual_rate.to_string(),
            "term_weeks": terms.term_weeks,
            "weeks_per_year": WEEKS_PER_YEAR.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reference_terms() -> LoanTerms {
        LoanTerms::new(dec!(5_000_000), dec!(0.10), 50)
    }

    #[test]
    fn test_installment_matches_closed_form() {
        let a = reference_terms().amortise().unwrap();
        let expected = (dec!(5000000) * (Decimal::ONE + dec!(0.10) / dec!(52.14) * dec!(50))) / dec!(50);
        assert_eq!(a.weekly_installment, expected);
        assert_eq!(a.schedule.len(), 50);
        assert!(a.schedule.values().all(|due| *due == expected));
    }

    #[test]
    fn test_schedule_keys_run_from_one_to_term() {
        let a = reference_terms().amortise().unwrap();
        assert_eq!(a.schedule.keys().next(), Some(&1));
        assert_eq!(a.schedule.keys().last(), Some(&50));
        assert!(!a.schedule.contains_key(&0));
    }

    #[test]
    fn test_installments_sum_to_total() {
        let a = LoanTerms::new(dec!(3_000_000), dec!(0.10), 30).amortise().unwrap();
        let sum = a.weekly_installment * dec!(30);
        assert!((sum - a.total_repayable).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_zero_rate_repays_principal_only() {
        let a = LoanTerms::new(dec!(1000), Decimal::ZERO, 4).amortise().unwrap();
        assert_eq!(a.total_repayable, dec!(1000));
        assert_eq!(a.weekly_installment, dec!(250));
    }

    #[test]
    fn test_zero_term_rejected() {
        let err = LoanTerms::new(dec!(1000), dec!(0.10), 0).amortise().unwrap_err();
        assert_eq!(err, LedgerError::InvalidTerm { term_weeks: 0 });
    }

    #[test]
    fn test_non_positive_principal_rejected() {
        for principal in [Decimal::ZERO, dec!(-500)] {
            let err = LoanTerms::new(principal, dec!(0.10), 10).amortise().unwrap_err();
            assert!(matches!(err, LedgerError::InvalidInput { ref field, .. } if field == "principal"));
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = LoanTerms::new(dec!(1000), dec!(-0.01), 10).amortise().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput { ref field, .. } if field == "annual_rate"));
    }

    #[test]
    fn test_overflow_reported() {
        let err = LoanTerms::new(Decimal::MAX, dec!(1000), 52).amortise().unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
    }

    #[test]
    fn test_quote_balance_runs_down_to_zero() {
        let quote = quote_loan(&reference_terms()).unwrap().result;
        assert_eq!(quote.schedule.len(), 50);
        let last = quote.schedule.last().unwrap();
        assert_eq!(last.week, 50);
        assert!(last.balance_after.abs() < dec!(0.0001));
        assert_eq!(quote.total_interest, quote.total_repayable - dec!(5_000_000));
    }

    #[test]
    fn test_quote_warns_on_zero_rate() {
        let out = quote_loan(&LoanTerms::new(dec!(1000), Decimal::ZERO, 4)).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(quote_loan(&reference_terms()).unwrap().warnings.is_empty());
    }
}
