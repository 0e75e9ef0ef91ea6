use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::schedule::{BillingSchedule, LoanTerms};
use crate::types::*;
use crate::LedgerResult;

/// Weeks elapsed since the last payment at which a loan counts as delinquent.
pub const DELINQUENCY_THRESHOLD_WEEKS: Week = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    /// Every scheduled installment has been paid. Further payments are refused.
    PaidOff,
}

/// One amortizing loan held by the registry.
///
/// Fields are public so callers can inspect snapshots; the registry's copy is
/// only reachable through its own operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_weeks: Week,
    pub weekly_installment: Money,
    pub outstanding: Money,
    pub current_week: Week,
    pub last_paid_week: Week,
    pub payments_made: u32,
    pub status: LoanStatus,
    pub billing_schedule: BillingSchedule,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub loan_id: LoanId,
    pub week: Week,
    pub amount: Money,
    pub outstanding: Money,
    pub status: LoanStatus,
}

impl Loan {
    pub fn open(id: LoanId, terms: &LoanTerms) -> LedgerResult<Self> {
        let amortisation = terms.amortise()?;
        Ok(Self {
            id,
            principal: terms.principal,
            annual_rate: terms.annual_rate,
            term_weeks: terms.term_weeks,
            weekly_installment: amortisation.weekly_installment,
            outstanding: amortisation.total_repayable,
            current_week: 0,
            last_paid_week: 0,
            payments_made: 0,
            status: LoanStatus::Active,
            billing_schedule: amortisation.schedule,
            created_at: Utc::now(),
        })
    }

    pub fn is_delinquent(&self) -> bool {
        self.current_week.saturating_sub(self.last_paid_week) >= DELINQUENCY_THRESHOLD_WEEKS
    }

    pub fn is_paid_off(&self) -> bool {
        self.status == LoanStatus::PaidOff
    }

    /// Move the caller-managed clock forward. Time never runs backwards.
    pub fn advance_to(&mut self, week: Week) -> LedgerResult<()> {
        self.check_week(week)?;
        self.current_week = week;
        Ok(())
    }

    /// Pay the installment scheduled for `week`, which becomes the current week.
    ///
    /// All checks run before anything is written, so a rejected payment leaves
    /// the record untouched. Paying the same week twice is accepted; keeping
    /// the clock moving is the caller's job.
    pub fn apply_payment(&mut self, week: Week) -> LedgerResult<PaymentReceipt> {
        if self.is_paid_off() {
            return Err(LedgerError::LoanPaidOff(self.id));
        }
        self.check_week(week)?;

        let due = self.billing_schedule.get(&week).copied();
        if due != Some(self.weekly_installment) {
            return Err(LedgerError::InvalidPayment {
                loan_id: self.id,
                week,
                due,
                expected: self.weekly_installment,
            });
        }

        self.current_week = week;
        self.outstanding -= self.weekly_installment;
        self.last_paid_week = week;
        self.payments_made += 1;
        if self.payments_made >= self.term_weeks {
            self.status = LoanStatus::PaidOff;
        }

        Ok(PaymentReceipt {
            loan_id: self.id,
            week,
            amount: self.weekly_installment,
            outstanding: self.outstanding,
            status: self.status,
        })
    }

    fn check_week(&self, week: Week) -> LedgerResult<()> {
        if week < self.current_week {
            return Err(LedgerError::WeekRegression {
                loan_id: self.id,
                current_week: self.current_week,
                requested_week: week,
            });
        }
        Ok(())
    }
}
