//! Time value of money.
//!
//! Discrete and continuous compounding, discount factors, nominal to
//! effective rate conversion, and discounting of cash-flow sequences. The
//! closed-form functions perform no validation: out-of-domain inputs yield
//! whatever IEEE arithmetic produces (infinity or NaN).

use tracing::debug;

use crate::error::FinalyticsError;
use crate::types::{DatedCashFlow, Money, Rate, Years};
use crate::FinalyticsResult;

/// Absolute |NPV| at which the IRR/XIRR root finder stops
const CONVERGENCE_THRESHOLD: f64 = 1e-7;
const MAX_IRR_ITERATIONS: u32 = 100;
const MIN_RATE: Rate = -0.99;
const MAX_RATE: Rate = 100.0;

/// Day-count basis for dated cash flows (Excel XNPV convention)
const DAYS_PER_YEAR: f64 = 365.0;

/// Future value of a lump sum with `comp_freq` compounding periods per year.
pub fn future_value(present_value: Money, rate: Rate, years: Years, comp_freq: u32) -> Money {
    let m = comp_freq as f64;
    present_value * (1.0 + rate / m).powf(m * years)
}

/// Present value needed today to reach `future_value` after `years`.
pub fn present_value(future_value: Money, rate: Rate, years: Years, comp_freq: u32) -> Money {
    let m = comp_freq as f64;
    future_value / (1.0 + rate / m).powf(m * years)
}

/// Annually compounded discount factor `1 / (1 + rate)^years`.
pub fn discount_factor(rate: Rate, years: Years) -> f64 {
    1.0 / (1.0 + rate).powf(years)
}

/// Converts a nominal annual rate compounded `comp_freq` times a year into
/// the equivalent effective annual rate.
pub fn effective_annual_rate(nominal_rate: Rate, comp_freq: u32) -> Rate {
    let m = comp_freq as f64;
    (1.0 + nominal_rate / m).powf(m) - 1.0
}

pub fn continuous_future_value(present_value: Money, rate: Rate, years: Years) -> Money {
    present_value * (rate * years).exp()
}

pub fn continuous_present_value(future_value: Money, rate: Rate, years: Years) -> Money {
    future_value * (-rate * years).exp()
}

/// Net Present Value of a series of periodic cash flows.
///
/// The flow at index 0 is "now" and is not discounted; the flow at index `t`
/// is divided by `(1 + discount_rate)^t`.
pub fn net_present_value(discount_rate: Rate, cashflows: &[Money]) -> Money {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + discount_rate).powi(t as i32))
        .sum()
}

/// Internal Rate of Return using Newton-Raphson
pub fn internal_rate_of_return(cashflows: &[Money], guess: Rate) -> FinalyticsResult<Rate> {
    if cashflows.len() < 2 {
        return Err(FinalyticsError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    newton_raphson("IRR", guess, |rate| {
        let mut npv_val = 0.0;
        let mut dnpv = 0.0;
        let one_plus_r = 1.0 + rate;

        for (t, cf) in cashflows.iter().enumerate() {
            npv_val += cf / one_plus_r.powi(t as i32);
            if t > 0 {
                dnpv -= t as f64 * cf / one_plus_r.powi(t as i32 + 1);
            }
        }

        (npv_val, dnpv)
    })
}

/// Net Present Value of cash flows on arbitrary dates.
///
/// Each flow is discounted by `(1 + rate)^(days / 365)` where `days` counts
/// from the first flow's date, so the first flow is undiscounted.
pub fn xnpv(rate: Rate, dated_flows: &[DatedCashFlow]) -> Money {
    let Some(first) = dated_flows.first() else {
        return 0.0;
    };

    dated_flows
        .iter()
        .map(|flow| flow.amount / (1.0 + rate).powf(year_fraction(first, flow)))
        .sum()
}

/// Extended IRR for irregular cash flow dates using Newton-Raphson
pub fn xirr(dated_flows: &[DatedCashFlow], guess: Rate) -> FinalyticsResult<Rate> {
    if dated_flows.len() < 2 {
        return Err(FinalyticsError::InsufficientData(
            "XIRR requires at least 2 cash flows".into(),
        ));
    }

    let base = &dated_flows[0];
    newton_raphson("XIRR", guess, |rate| {
        let mut npv_val = 0.0;
        let mut dnpv = 0.0;
        let one_plus_r = 1.0 + rate;

        for flow in dated_flows {
            let years = year_fraction(base, flow);
            let discount = one_plus_r.powf(years);
            npv_val += flow.amount / discount;
            dnpv -= years * flow.amount / (one_plus_r * discount);
        }

        (npv_val, dnpv)
    })
}

fn year_fraction(base: &DatedCashFlow, flow: &DatedCashFlow) -> f64 {
    (flow.date - base.date).num_days() as f64 / DAYS_PER_YEAR
}

/// Shared root finder for IRR and XIRR. `f` returns the NPV at a rate and its
/// derivative with respect to that rate.
fn newton_raphson<F>(function: &str, guess: Rate, f: F) -> FinalyticsResult<Rate>
where
    F: Fn(Rate) -> (f64, f64),
{
    let mut rate = guess;
    let mut npv_val = f64::NAN;

    for i in 0..MAX_IRR_ITERATIONS {
        let (value, derivative) = f(rate);
        npv_val = value;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            debug!(function, iterations = i, rate, "root finder converged");
            return Ok(rate);
        }

        if derivative == 0.0 || !derivative.is_finite() {
            return Err(FinalyticsError::ConvergenceFailure {
                function: function.into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        // Guard against divergence
        rate = (rate - npv_val / derivative).clamp(MIN_RATE, MAX_RATE);
    }

    Err(FinalyticsError::ConvergenceFailure {
        function: function.into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv_val,
    })
}
