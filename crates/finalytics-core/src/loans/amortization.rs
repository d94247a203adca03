use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::{Money, Rate, Years};

/// Balance at or below which a loan is treated as fully repaid
pub const PAID_OFF_TOLERANCE: Money = 1e-8;

/// A single payment period in an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// Payment number (1-indexed)
    pub period: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Outstanding balance after this payment
    pub balance: Money,
}

/// Decomposition of one payment into interest and principal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestPrincipalSplit {
    pub interest: Money,
    /// Negative when the payment does not cover the interest
    pub principal: Money,
}

/// Upper bound on schedule rows reserved up front
const PREALLOCATED_PERIODS: usize = 1_200;

/// Number of whole payment periods in `years`.
///
/// Fractional periods are truncated toward zero: 2.99 years at 1 payment per
/// year is 2 periods, and -1.5 years at 1 payment per year is -1. A negative
/// term gives a negative count and NaN gives 0. Every loan function treats a
/// count of 0 or less as "no periods".
pub fn period_count(years: Years, periods_per_year: u32) -> i64 {
    (years * periods_per_year as f64).trunc() as i64
}

/// Number of rows an amortization schedule may hold, saturating at
/// `u32::MAX` instead of wrapping.
fn schedule_periods(years: Years, payments_per_year: u32) -> u32 {
    u32::try_from(period_count(years, payments_per_year).max(0)).unwrap_or(u32::MAX)
}

fn periodic_rate(annual_rate: Rate, payments_per_year: u32) -> Rate {
    annual_rate / payments_per_year as f64
}

/// Level installment that fully repays `principal` over `years`.
///
/// A zero rate splits the principal evenly; otherwise the annuity-immediate
/// formula `P * r / (1 - (1 + r)^-n)` applies. A loan shorter than one
/// period divides by zero and yields a non-finite payment.
pub fn loan_payment(principal: Money, annual_rate: Rate, years: Years, payments_per_year: u32) -> Money {
    let r = periodic_rate(annual_rate, payments_per_year);
    let n = period_count(years, payments_per_year) as f64;

    if r == 0.0 {
        return principal / n;
    }
    principal * r / (1.0 - (1.0 + r).powf(-n))
}

/// Full payment-by-payment amortization schedule.
///
/// When the level installment would retire more than the outstanding
/// balance, the principal portion is clamped to the balance and that
/// period's payment shrinks to `interest + balance`. The schedule stops as
/// soon as the balance falls to [`PAID_OFF_TOLERANCE`].
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    payments_per_year: u32,
) -> Vec<AmortizationEntry> {
    let installment = loan_payment(principal, annual_rate, years, payments_per_year);
    let r = periodic_rate(annual_rate, payments_per_year);
    let n = schedule_periods(years, payments_per_year);

    debug!(principal, annual_rate, periods = n, installment, "building amortization schedule");

    let mut schedule = Vec::with_capacity((n as usize).min(PREALLOCATED_PERIODS));
    let mut balance = principal;

    for period in 1..=n {
        let interest = balance * r;
        let mut principal_portion = installment - interest;
        let mut payment = installment;

        // Final-period rounding
        if principal_portion > balance {
            principal_portion = balance;
            payment = interest + principal_portion;
        }

        balance -= principal_portion;
        schedule.push(AmortizationEntry {
            period,
            payment,
            interest,
            principal: principal_portion,
            balance,
        });

        if balance <= PAID_OFF_TOLERANCE {
            trace!(period, periods = n, "loan fully repaid");
            break;
        }
    }

    schedule
}

/// Outstanding balance after `payments_made` level payments, without
/// simulating the schedule.
///
/// Returns `principal` before the first payment and `0.0` once every payment
/// has been made.
///
/// The annuity closed form is 0/0 at a zero rate. Rather than letting that
/// NaN propagate, a zero rate returns the limit `principal * (n - k) / n`,
/// the linear balance the zero-rate schedule actually produces.
pub fn remaining_balance(
    principal: Money,
    annual_rate: Rate,
    years: Years,
    payments_made: i32,
    payments_per_year: u32,
) -> Money {
    let r = periodic_rate(annual_rate, payments_per_year);
    let n = period_count(years, payments_per_year);
    let k = i64::from(payments_made);

    if k <= 0 {
        return principal;
    }
    if k >= n {
        return 0.0;
    }

    if r == 0.0 {
        return principal * (n - k) as f64 / n as f64;
    }

    let growth_n = (1.0 + r).powf(n as f64);
    let growth_k = (1.0 + r).powf(k as f64);
    principal * (growth_n - growth_k) / (growth_n - 1.0)
}

/// Splits a single `payment` against `balance` into interest and principal.
pub fn interest_principal_split(
    payment: Money,
    annual_rate: Rate,
    balance: Money,
    payments_per_year: u32,
) -> InterestPrincipalSplit {
    let interest = balance * periodic_rate(annual_rate, payments_per_year);
    InterestPrincipalSplit {
        interest,
        principal: payment - interest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_period_count_truncates() {
        assert_eq!(period_count(1.0, 12), 12);
        assert_eq!(period_count(2.99, 1), 2);
        assert_eq!(period_count(0.5, 12), 6);
        assert_eq!(period_count(-1.0, 12), -12);
        assert_eq!(period_count(f64::NAN, 12), 0);
    }

    #[test]
    fn test_schedule_periods_saturates() {
        assert_eq!(schedule_periods(30.0, 12), 360);
        assert_eq!(schedule_periods(-1.0, 12), 0);
        assert_eq!(schedule_periods(f64::NAN, 12), 0);
        // 1.2e13 periods does not fit in u32 and must not wrap to a short schedule
        assert_eq!(schedule_periods(1e12, 12), u32::MAX);
        assert_eq!(schedule_periods(f64::INFINITY, 12), u32::MAX);
    }

    #[test]
    fn test_negative_term_has_no_periods() {
        assert_eq!(period_count(-1.5, 1), -1);
        assert!(amortization_schedule(1000.0, 0.05, -1.0, 12).is_empty());
        assert_eq!(remaining_balance(1000.0, 0.05, -1.0, 3, 12), 0.0);
    }

    #[test]
    fn test_loan_payment_zero_rate() {
        assert_eq!(loan_payment(1200.0, 0.0, 1.0, 12), 100.0);
    }

    #[test]
    fn test_loan_payment_mortgage() {
        // 200k, 6%, 30 years monthly: 1199.10
        let pmt = loan_payment(200_000.0, 0.06, 30.0, 12);
        assert!((pmt - 1199.10).abs() < 0.01, "got {pmt}");
    }

    #[test]
    fn test_loan_payment_annual() {
        // 1000 at 10% over 3 annual payments: 402.11
        let pmt = loan_payment(1000.0, 0.10, 3.0, 1);
        assert!((pmt - 402.1148).abs() < 1e-4, "got {pmt}");
    }

    #[test]
    fn test_loan_payment_sub_period_is_not_finite() {
        assert!(!loan_payment(1000.0, 0.0, 0.01, 12).is_finite());
    }

    #[test]
    fn test_schedule_first_period() {
        let schedule = amortization_schedule(1000.0, 0.10, 3.0, 1);
        let first = &schedule[0];
        assert_eq!(first.period, 1);
        assert_relative_eq!(first.interest, 100.0, epsilon = 1e-9);
        assert_relative_eq!(first.principal, first.payment - 100.0, epsilon = 1e-9);
        assert_relative_eq!(first.balance, 1000.0 - first.principal, epsilon = 1e-9);
    }

    #[test]
    fn test_schedule_pays_off() {
        let schedule = amortization_schedule(1000.0, 0.10, 3.0, 1);
        assert_eq!(schedule.len(), 3);
        let last = schedule.last().unwrap();
        assert!(last.balance >= 0.0 && last.balance <= PAID_OFF_TOLERANCE);
    }

    #[test]
    fn test_schedule_balance_non_increasing() {
        let schedule = amortization_schedule(25_000.0, 0.07, 5.0, 12);
        assert_eq!(schedule.len(), 60);
        for pair in schedule.windows(2) {
            assert!(pair[1].balance <= pair[0].balance);
        }
    }

    #[test]
    fn test_schedule_zero_rate() {
        let schedule = amortization_schedule(1000.0, 0.0, 3.0, 1);
        assert_eq!(schedule.len(), 3);
        let total: f64 = schedule.iter().map(|e| e.principal).sum();
        assert_relative_eq!(total, 1000.0, epsilon = 1e-9);
        assert!(schedule.iter().all(|e| e.interest == 0.0));
    }

    #[test]
    fn test_schedule_final_clamp() {
        // 1000/7 accumulates rounding so the last level payment overshoots
        let installment = loan_payment(1000.0, 0.0, 7.0, 1);
        let schedule = amortization_schedule(1000.0, 0.0, 7.0, 1);
        let last = schedule.last().unwrap();
        assert_eq!(last.period, 7);
        assert_eq!(last.balance, 0.0);
        assert!(last.payment < installment);
        assert_eq!(last.payment, last.interest + last.principal);
    }

    #[test]
    fn test_schedule_zero_periods_is_empty() {
        assert!(amortization_schedule(1000.0, 0.05, 0.0, 12).is_empty());
    }

    #[test]
    fn test_remaining_balance_bounds() {
        assert_eq!(remaining_balance(5000.0, 0.06, 2.0, 0, 12), 5000.0);
        assert_eq!(remaining_balance(5000.0, 0.06, 2.0, -4, 12), 5000.0);
        assert_eq!(remaining_balance(5000.0, 0.06, 2.0, 24, 12), 0.0);
        assert_eq!(remaining_balance(5000.0, 0.06, 2.0, 30, 12), 0.0);
    }

    #[test]
    fn test_remaining_balance_zero_rate_linear() {
        assert_relative_eq!(remaining_balance(1200.0, 0.0, 1.0, 3, 12), 900.0, epsilon = 1e-9);
    }

    #[test]
    fn test_remaining_balance_matches_schedule() {
        let schedule = amortization_schedule(10_000.0, 0.08, 2.0, 12);
        for k in 1..24 {
            let closed = remaining_balance(10_000.0, 0.08, 2.0, k, 12);
            assert_relative_eq!(closed, schedule[k as usize - 1].balance, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_interest_principal_split() {
        let split = interest_principal_split(1000.0, 0.12, 50_000.0, 12);
        assert_relative_eq!(split.interest, 500.0, epsilon = 1e-9);
        assert_relative_eq!(split.principal, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_amortization_is_not_an_error() {
        let split = interest_principal_split(100.0, 0.12, 50_000.0, 12);
        assert!(split.principal < 0.0);
        assert_relative_eq!(split.principal, -400.0, epsilon = 1e-9);
    }
}
