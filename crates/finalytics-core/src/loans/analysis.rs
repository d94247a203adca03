use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::{amortization_schedule, loan_payment, period_count, AmortizationEntry};
use crate::error::FinalyticsError;
use crate::types::*;
use crate::FinalyticsResult;

/// Input for a level-payment loan analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub loan_name: String,
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: Years,
    /// Payment frequency (defaults to monthly)
    #[serde(default)]
    pub frequency: Frequency,
}

/// Summary and schedule for a level-payment loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisOutput {
    pub loan_name: String,
    pub periodic_payment: Money,
    /// Nominal number of payments (truncated toward zero)
    pub number_of_periods: u32,
    /// Period in which the balance was retired
    pub payoff_period: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationEntry>,
}

/// Build the level payment, full schedule and lifetime totals for a loan.
pub fn analyze_loan(input: &LoanInput) -> FinalyticsResult<ComputationOutput<LoanAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payments_per_year = input.frequency.periods_per_year();
    if payments_per_year == 0 {
        return Err(FinalyticsError::InvalidArgument {
            field: "frequency".into(),
            reason: "Payments per year must be positive".into(),
        });
    }
    let periods = period_count(input.years, payments_per_year);
    if periods <= 0 {
        return Err(FinalyticsError::InvalidArgument {
            field: "years".into(),
            reason: "Loan must span at least one payment period".into(),
        });
    }

    let periodic_payment = loan_payment(
        input.principal,
        input.annual_rate,
        input.years,
        payments_per_year,
    );
    let schedule = amortization_schedule(
        input.principal,
        input.annual_rate,
        input.years,
        payments_per_year,
    );

    let total_paid: Money = schedule.iter().map(|e| e.payment).sum();
    let total_interest: Money = schedule.iter().map(|e| e.interest).sum();
    let payoff_period = schedule.last().map(|e| e.period).unwrap_or(0);
    let number_of_periods = u32::try_from(periods).unwrap_or(u32::MAX);

    if payoff_period < number_of_periods {
        warnings.push(format!(
            "Balance retired in period {payoff_period} of {number_of_periods}"
        ));
    }
    if input.annual_rate < 0.0 {
        warnings.push("Negative interest rate".into());
    }

    let output = LoanAnalysisOutput {
        loan_name: input.loan_name.clone(),
        periodic_payment,
        number_of_periods,
        payoff_period,
        total_paid,
        total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level Payment Loan Amortization",
        &serde_json::json!({
            "loan": input.loan_name,
            "principal": input.principal,
            "annual_rate": input.annual_rate,
            "years": input.years,
            "frequency": input.frequency.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
