use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::LoanId;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Loan not found: {0}")]
    NotFound(LoanId),

    #[error("Invalid payment for loan {loan_id}, week {week}: scheduled due {} does not match installment {expected}", display_due(.due))]
    InvalidPayment {
        loan_id: LoanId,
        week: u32,
        due: Option<Decimal>,
        expected: Decimal,
    },

    #[error("Invalid term: {term_weeks} weeks (must be at least 1)")]
    InvalidTerm { term_weeks: u32 },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Week regression on loan {loan_id}: current week is {current_week}, requested {requested_week}")]
    WeekRegression {
        loan_id: LoanId,
        current_week: u32,
        requested_week: u32,
    },

    #[error("Loan {0} is paid off")]
    LoanPaidOff(LoanId),

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::SerializationError(e.to_string())
    }
}

fn display_due(due: &Option<Decimal>) -> String {
    match due {
        Some(amount) => amount.to_string(),
        None => "none".into(),
    }
}
