use crate::error::FinalyticsError;
use crate::types::{Money, Rate};
use crate::FinalyticsResult;

fn validate_life(life: i32) -> FinalyticsResult<usize> {
    if life <= 0 {
        return Err(FinalyticsError::InvalidArgument {
            field: "life".into(),
            reason: "Life must be positive".into(),
        });
    }
    Ok(life as usize)
}

/// Equal depreciation of `(cost - salvage) / life` in every year.
pub fn straight_line(cost: Money, salvage: Money, life: i32) -> FinalyticsResult<Vec<Money>> {
    let years = validate_life(life)?;
    let dep = (cost - salvage) / life as f64;
    Ok(vec![dep; years])
}

/// Fixed-percentage depreciation on the prior year's book value.
///
/// `rate` must lie strictly between 0 and 1. Salvage is not considered and
/// the book value decays geometrically without ever reaching zero.
pub fn declining_balance(cost: Money, life: i32, rate: Rate) -> FinalyticsResult<Vec<Money>> {
    let years = validate_life(life)?;
    if rate <= 0.0 || rate >= 1.0 {
        return Err(FinalyticsError::InvalidArgument {
            field: "rate".into(),
            reason: "Rate should be between 0 and 1".into(),
        });
    }

    let mut deps = Vec::with_capacity(years);
    let mut book_value = cost;
    for _ in 0..years {
        let dep = rate * book_value;
        deps.push(dep);
        book_value -= dep;
    }
    Ok(deps)
}

/// Declining balance at `2 / life`, with each year's charge capped at the
/// remaining book value so the asset is never depreciated below zero.
pub fn double_declining_balance(cost: Money, life: i32) -> FinalyticsResult<Vec<Money>> {
    let years = validate_life(life)?;
    let rate = 2.0 / life as f64;

    let mut deps = Vec::with_capacity(years);
    let mut book_value = cost;
    for _ in 0..years {
        let dep = (rate * book_value).min(book_value);
        deps.push(dep);
        book_value -= dep;
    }
    Ok(deps)
}

/// Sum-of-the-years'-digits: year `y` receives `(life - y + 1) / SYD` of the
/// depreciable base, where `SYD = life * (life + 1) / 2`.
pub fn sum_of_years_digits(cost: Money, salvage: Money, life: i32) -> FinalyticsResult<Vec<Money>> {
    let years = validate_life(life)?;
    let base = cost - salvage;
    let life_f = life as f64;
    let syd_sum = life_f * (life_f + 1.0) / 2.0;

    Ok((1..=years)
        .map(|year| {
            let remaining_life = life_f - year as f64 + 1.0;
            remaining_life / syd_sum * base
        })
        .collect())
}

/// Book value after `depreciation_taken` of accumulated depreciation.
pub fn book_value(cost: Money, depreciation_taken: Money) -> Money {
    cost - depreciation_taken
}
