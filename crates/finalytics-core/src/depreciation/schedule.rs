use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::methods::{
    book_value, declining_balance, double_declining_balance, straight_line, sum_of_years_digits,
};
use crate::types::*;
use crate::FinalyticsResult;

/// Tolerance for comparing the ending book value against salvage
const SALVAGE_TOLERANCE: Money = 0.01;

/// Depreciation allocation method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DepreciationMethod {
    StraightLine,
    /// Fixed rate on prior book value; salvage is ignored
    DecliningBalance { rate: Rate },
    /// Declining balance at 2 / life, capped at remaining book value
    DoubleDecliningBalance,
    SumOfYearsDigits,
}

impl DepreciationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            DepreciationMethod::StraightLine => "Straight Line",
            DepreciationMethod::DecliningBalance { .. } => "Declining Balance",
            DepreciationMethod::DoubleDecliningBalance => "Double Declining Balance",
            DepreciationMethod::SumOfYearsDigits => "Sum of Years' Digits",
        }
    }
}

/// Input for a depreciation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationInput {
    pub asset_name: String,
    pub cost: Money,
    #[serde(default)]
    pub salvage_value: Money,
    /// Useful life in years
    pub life: i32,
    pub method: DepreciationMethod,
}

/// A single year in the depreciation schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationRow {
    pub year: u32,
    pub opening_book_value: Money,
    pub depreciation: Money,
    pub accumulated_depreciation: Money,
    pub closing_book_value: Money,
}

/// Year-by-year depreciation schedule for one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationScheduleOutput {
    pub asset_name: String,
    pub method: String,
    pub rows: Vec<DepreciationRow>,
    pub total_depreciation: Money,
    pub ending_book_value: Money,
}

/// Build a year-by-year depreciation schedule for a single asset.
pub fn build_depreciation_schedule(
    input: &DepreciationInput,
) -> FinalyticsResult<ComputationOutput<DepreciationScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let charges = match input.method {
        DepreciationMethod::StraightLine => {
            straight_line(input.cost, input.salvage_value, input.life)?
        }
        DepreciationMethod::DecliningBalance { rate } => {
            declining_balance(input.cost, input.life, rate)?
        }
        DepreciationMethod::DoubleDecliningBalance => {
            double_declining_balance(input.cost, input.life)?
        }
        DepreciationMethod::SumOfYearsDigits => {
            sum_of_years_digits(input.cost, input.salvage_value, input.life)?
        }
    };

    debug!(
        asset = %input.asset_name,
        method = input.method.label(),
        years = charges.len(),
        "building depreciation schedule"
    );

    let mut rows = Vec::with_capacity(charges.len());
    let mut accumulated = 0.0;
    for (idx, depreciation) in charges.into_iter().enumerate() {
        let opening = book_value(input.cost, accumulated);
        accumulated += depreciation;
        rows.push(DepreciationRow {
            year: idx as u32 + 1,
            opening_book_value: opening,
            depreciation,
            accumulated_depreciation: accumulated,
            closing_book_value: book_value(input.cost, accumulated),
        });
    }

    let ending_book_value = book_value(input.cost, accumulated);
    if ending_book_value < input.salvage_value - SALVAGE_TOLERANCE {
        warnings.push(format!(
            "Ending book value {ending_book_value:.2} is below salvage value {:.2}",
            input.salvage_value
        ));
    } else if ending_book_value > input.salvage_value + SALVAGE_TOLERANCE {
        warnings.push(format!(
            "Ending book value {ending_book_value:.2} remains above salvage value {:.2}",
            input.salvage_value
        ));
    }

    let output = DepreciationScheduleOutput {
        asset_name: input.asset_name.clone(),
        method: input.method.label().to_string(),
        rows,
        total_depreciation: accumulated,
        ending_book_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Depreciation Schedule Builder",
        &serde_json::json!({
            "asset": input.asset_name,
            "method": input.method,
            "cost": input.cost,
            "salvage_value": input.salvage_value,
            "life": input.life,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn machine(method: DepreciationMethod) -> DepreciationInput {
        DepreciationInput {
            asset_name: "CNC Machine".into(),
            cost: 10_000.0,
            salvage_value: 1_000.0,
            life: 5,
            method,
        }
    }

    #[test]
    fn test_straight_line_schedule() {
        let result = build_depreciation_schedule(&machine(DepreciationMethod::StraightLine)).unwrap();
        let sched = &result.result;
        assert_eq!(sched.rows.len(), 5);
        assert_eq!(sched.method, "Straight Line");

        assert_eq!(sched.rows[0].opening_book_value, 10_000.0);
        assert_eq!(sched.rows[0].closing_book_value, 8_200.0);
        assert_relative_eq!(sched.total_depreciation, 9_000.0, epsilon = 1e-9);
        assert_relative_eq!(sched.ending_book_value, 1_000.0, epsilon = 1e-9);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_rows_reconcile() {
        let result =
            build_depreciation_schedule(&machine(DepreciationMethod::SumOfYearsDigits)).unwrap();
        let rows = &result.result.rows;
        for pair in rows.windows(2) {
            assert_eq!(pair[0].closing_book_value, pair[1].opening_book_value);
        }
        for row in rows {
            assert_relative_eq!(
                row.closing_book_value,
                row.opening_book_value - row.depreciation,
                epsilon = 1e-9
            );
        }
        assert_eq!(rows[4].year, 5);
    }

    #[test]
    fn test_declining_balance_warns_residual() {
        let result = build_depreciation_schedule(&machine(DepreciationMethod::DecliningBalance {
            rate: 0.2,
        }))
        .unwrap();
        // 10000 * 0.8^5 = 3276.80 left on the books
        assert_relative_eq!(result.result.ending_book_value, 3_276.8, epsilon = 1e-6);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("above salvage"));
    }

    #[test]
    fn test_double_declining_warns_below_salvage() {
        let mut input = machine(DepreciationMethod::DoubleDecliningBalance);
        input.life = 2;
        let result = build_depreciation_schedule(&input).unwrap();
        assert_eq!(result.result.ending_book_value, 0.0);
        assert!(result.warnings[0].contains("below salvage"));
    }

    #[test]
    fn test_invalid_life_propagates() {
        let mut input = machine(DepreciationMethod::StraightLine);
        input.life = 0;
        assert!(build_depreciation_schedule(&input).is_err());
    }

    #[test]
    fn test_input_deserializes_with_default_salvage() {
        let input: DepreciationInput = serde_json::from_str(
            r#"{"asset_name":"Van","cost":30000.0,"life":3,"method":{"DecliningBalance":{"rate":0.3}}}"#,
        )
        .unwrap();
        assert_eq!(input.salvage_value, 0.0);
        assert_eq!(input.method, DepreciationMethod::DecliningBalance { rate: 0.3 });
    }
}
