use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::loan::{Loan, LoanStatus, PaymentReceipt};
use crate::schedule::LoanTerms;
use crate::types::*;
use crate::LedgerResult;

/// Read-only view of a loan's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub id: LoanId,
    pub principal: Money,
    pub term_weeks: Week,
    pub weekly_installment: Money,
    pub outstanding: Money,
    pub current_week: Week,
    pub last_paid_week: Week,
    pub payments_made: u32,
    pub status: LoanStatus,
    pub delinquent: bool,
}

impl From<&Loan> for LoanSummary {
    fn from(loan: &Loan) -> Self {
        Self {
            id: loan.id,
            principal: loan.principal,
            term_weeks: loan.term_weeks,
            weekly_installment: loan.weekly_installment,
            outstanding: loan.outstanding,
            current_week: loan.current_week,
            last_paid_week: loan.last_paid_week,
            payments_made: loan.payments_made,
            status: loan.status,
            delinquent: loan.is_delinquent(),
        }
    }
}

#[derive(Debug)]
struct LedgerState {
    loans: HashMap<LoanId, Loan>,
    next_id: u64,
}

/// In-memory registry of loans.
///
/// One mutex guards the id counter and every record. Each operation holds it
/// for its whole duration and never takes it twice. Share one registry
/// between threads with `Arc<Loans>`.
#[derive(Debug)]
pub struct Loans {
    state: Mutex<LedgerState>,
}

impl Default for Loans {
    fn default() -> Self {
        Self::new()
    }
}

impl Loans {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                loans: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    // Records are only written after every check passes, so a poisoned lock
    // never exposes a half-applied update.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new loan and return its id.
    pub fn create_loan(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_weeks: Week,
    ) -> LedgerResult<LoanId> {
        self.open(&LoanTerms::new(principal, annual_rate, term_weeks))
    }

    /// Register a new loan from a set of terms.
    pub fn open(&self, terms: &LoanTerms) -> LedgerResult<LoanId> {
        let mut state = self.lock();

        let id = LoanId(state.next_id);
        let loan = Loan::open(id, terms)?;
        state.next_id += 1;

        info!(
            loan_id = %id,
            total_repayable = %loan.outstanding.round_dp(2),
            weekly_installment = %loan.weekly_installment.round_dp(2),
            term_weeks = loan.term_weeks,
            "loan created"
        );
        for (week, due) in &loan.billing_schedule {
            debug!(loan_id = %id, week, due = %due.round_dp(2), "billing schedule");
        }

        state.loans.insert(id, loan);
        Ok(id)
    }

    /// Outstanding balance, or zero for an unknown loan.
    pub fn outstanding(&self, id: LoanId) -> Money {
        self.try_outstanding(id).unwrap_or(Decimal::ZERO)
    }

    pub fn try_outstanding(&self, id: LoanId) -> LedgerResult<Money> {
        self.with_loan(id, |loan| loan.outstanding)
    }

    /// Whether two or more weeks have passed since the last payment. Unknown
    /// loans are never delinquent.
    pub fn is_delinquent(&self, id: LoanId) -> bool {
        self.try_is_delinquent(id).unwrap_or(false)
    }

    pub fn try_is_delinquent(&self, id: LoanId) -> LedgerResult<bool> {
        self.with_loan(id, Loan::is_delinquent)
    }

    /// Pay the installment for `week`. Returns false when the loan is unknown
    /// or the payment is refused; the reason is logged.
    pub fn make_payment(&self, id: LoanId, week: Week) -> bool {
        self.try_make_payment(id, week).is_ok()
    }

    pub fn try_make_payment(&self, id: LoanId, week: Week) -> LedgerResult<PaymentReceipt> {
        let result = self.with_loan_mut(id, |loan| loan.apply_payment(week));
        match &result {
            Ok(receipt) => info!(
                loan_id = %id,
                week,
                outstanding = %receipt.outstanding.round_dp(2),
                "payment recorded"
            ),
            Err(e) => warn!(loan_id = %id, week, "payment refused: {e}"),
        }
        result
    }

    /// Move a loan's current week forward without paying.
    pub fn advance_to_week(&self, id: LoanId, week: Week) -> LedgerResult<()> {
        self.with_loan_mut(id, |loan| loan.advance_to(week))
    }

    /// Snapshot of a loan record.
    pub fn loan(&self, id: LoanId) -> Option<Loan> {
        self.lock().loans.get(&id).cloned()
    }

    pub fn summary(&self, id: LoanId) -> LedgerResult<LoanSummary> {
        self.with_loan(id, |loan| LoanSummary::from(loan))
    }

    /// Summaries of every loan, ordered by id.
    pub fn summaries(&self) -> Vec<LoanSummary> {
        let state = self.lock();
        let mut out: Vec<LoanSummary> = state.loans.values().map(LoanSummary::from).collect();
        out.sort_by_key(|s| s.id);
        out
    }

    pub fn loan_ids(&self) -> Vec<LoanId> {
        let mut ids: Vec<LoanId> = self.lock().loans.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_loan<T>(&self, id: LoanId, f: impl FnOnce(&Loan) -> T) -> LedgerResult<T> {
        let state = self.lock();
        state.loans.get(&id).map(f).ok_or(LedgerError::NotFound(id))
    }

    fn with_loan_mut<T>(
        &self,
        id: LoanId,
        f: impl FnOnce(&mut Loan) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut state = self.lock();
        let loan = state.loans.get_mut(&id).ok_or(LedgerError::NotFound(id))?;
        f(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ids_start_at_one() {
        let loans = Loans::new();
        assert!(loans.is_empty());
        assert_eq!(loans.create_loan(dec!(1000), dec!(0.10), 10).unwrap(), LoanId(1));
        assert_eq!(loans.create_loan(dec!(1000), dec!(0.10), 10).unwrap(), LoanId(2));
        assert_eq!(loans.len(), 2);
    }

    #[test]
    fn test_rejected_creation_does_not_consume_an_id() {
        let loans = Loans::new();
        assert!(loans.create_loan(dec!(1000), dec!(0.10), 0).is_err());
        assert_eq!(loans.create_loan(dec!(1000), dec!(0.10), 10).unwrap(), LoanId(1));
    }

    #[test]
    fn test_tampered_schedule_refuses_payment() {
        let loans = Loans::new();
        let id = loans.create_loan(dec!(5_000_000), dec!(0.10), 50).unwrap();
        loans
            .with_loan_mut(id, |loan| {
                loan.weekly_installment = dec!(120000);
                Ok(())
            })
            .unwrap();

        let before = loans.outstanding(id);
        assert!(!loans.make_payment(id, 1));
        assert_eq!(loans.outstanding(id), before);
        assert_eq!(loans.loan(id).unwrap().last_paid_week, 0);
    }

    #[test]
    fn test_summary_reports_delinquency() {
        let loans = Loans::new();
        let id = loans.create_loan(dec!(1000), dec!(0.10), 10).unwrap();
        loans.advance_to_week(id, 4).unwrap();
        let summary = loans.summary(id).unwrap();
        assert!(summary.delinquent);
        assert_eq!(summary.current_week, 4);
        assert_eq!(loans.summaries(), vec![summary]);
    }
}
