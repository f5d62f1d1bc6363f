pub mod day_count;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{DateRule, DayCountBasis};

pub use day_count::{accrual_days, year_fraction};

/// day-count metadata for one period; never feeds the amount math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAccrual {
    pub period_start: NaiveDate,
    pub accrual_days: u32,
    pub year_fraction: Decimal,
}

impl PeriodAccrual {
    pub fn new(
        period_start: NaiveDate,
        due_date: NaiveDate,
        is_first_period: bool,
        basis: DayCountBasis,
        date_rule: DateRule,
    ) -> Self {
        let days = accrual_days(period_start, due_date, is_first_period, date_rule);
        Self {
            period_start,
            accrual_days: days,
            year_fraction: year_fraction(days, basis),
        }
    }
}

/// simple interest on a balance for one period
pub fn period_interest(balance: Money, periodic_rate: Rate) -> Money {
    balance.apply_rate(periodic_rate)
}
