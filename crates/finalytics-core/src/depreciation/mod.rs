//! Asset depreciation.
//!
//! Per-period depreciation under four allocation methods, a book-value
//! helper, and a schedule builder that rolls the asset's book value forward
//! year by year.

pub mod methods;
pub mod schedule;

pub use methods::{
    book_value, declining_balance, double_declining_balance, straight_line, sum_of_years_digits,
};
pub use schedule::{
    build_depreciation_schedule, DepreciationInput, DepreciationMethod, DepreciationRow,
    DepreciationScheduleOutput,
};
