use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{DateRule, DayCountBasis};

impl DayCountBasis {
    /// days in the conventional year
    pub fn year_basis(&self) -> u32 {
        match self {
            DayCountBasis::Act360 => 360,
            DayCountBasis::Act365 => 365,
        }
    }
}

/// actual days between two dates, with the start date counted as day one of the
/// first period under `IncludeStart`
pub fn accrual_days(
    period_start: NaiveDate,
    due_date: NaiveDate,
    is_first_period: bool,
    date_rule: DateRule,
) -> u32 {
    let days = (due_date - period_start).num_days().max(0) as u32;
    match date_rule {
        DateRule::IncludeStart if is_first_period => days + 1,
        _ => days,
    }
}

/// fraction of the conventional year covered by `days`
pub fn year_fraction(days: u32, basis: DayCountBasis) -> Decimal {
    Decimal::from(days) / Decimal::from(basis.year_basis())
}
