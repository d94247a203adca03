//! Loan amortization.
//!
//! Level-payment (annuity-immediate) loans: the periodic installment, the
//! full amortization schedule, the closed-form outstanding balance, and the
//! interest/principal split of a single payment.

pub mod amortization;
pub mod analysis;

pub use amortization::{
    amortization_schedule, interest_principal_split, loan_payment, period_count,
    remaining_balance, AmortizationEntry, InterestPrincipalSplit, PAID_OFF_TOLERANCE,
};
pub use analysis::{analyze_loan, LoanAnalysisOutput, LoanInput};
