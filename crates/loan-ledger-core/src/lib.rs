pub mod error;
pub mod loan;
pub mod registry;
pub mod schedule;
pub mod types;

#[cfg(feature = "script")]
pub mod script;

pub use error::LedgerError;
pub use loan::{Loan, LoanStatus, PaymentReceipt};
pub use registry::{LoanSummary, Loans};
pub use schedule::{quote_loan, LoanQuote, LoanTerms};
pub use types::*;

/// Standard result type for all ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
