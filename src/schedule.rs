use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::interest::PeriodAccrual;
use crate::types::{DateRule, DayCountBasis, Frequency, Repayment, RoundingRule};

/// one period of a schedule, 1-indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub period_index: u32,
    pub due_date: NaiveDate,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub total_payment: Money,
    /// balance after this installment is paid
    pub remaining_balance: Money,
    pub beginning_balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
    /// interest-only period at the start of an amortizable loan
    pub is_grace: bool,
    #[serde(flatten)]
    pub accrual: PeriodAccrual,
}

/// aggregate totals of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_interest: Money,
    /// effective principal, interest, and any fee not folded into the capital
    pub total_to_repay: Money,
    pub effective_principal: Money,
    pub initial_fees_amount: Money,
    /// funds actually handed to the borrower
    pub net_disbursed: Money,
    pub end_date: NaiveDate,
    pub installment_count: u32,
    pub grace_periods: u32,
    pub periodic_rate: Rate,
    /// level payment for constant-payment loans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_payment: Option<Money>,
}

/// full payment schedule along with the conventions it was computed under
///
/// Plain data with no reference back to the terms, ready to serialize or tabulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    pub repayment: Repayment,
    pub rounding_rule: RoundingRule,
    pub day_count_basis: DayCountBasis,
    pub date_rule: DateRule,
    pub installments: Vec<Installment>,
    pub summary: ScheduleSummary,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// installment for a 1-based period index
    pub fn installment(&self, period_index: u32) -> Option<&Installment> {
        period_index
            .checked_sub(1)
            .and_then(|i| self.installments.get(i as usize))
    }

    /// outstanding balance once `period_index` has been paid; period 0 is the
    /// effective principal and anything past the last period is zero
    pub fn balance_after(&self, period_index: u32) -> Money {
        if period_index == 0 {
            return self.summary.effective_principal;
        }
        self.installment(period_index)
            .map(|i| i.remaining_balance)
            .unwrap_or(Money::ZERO)
    }

    pub fn first_due_date(&self) -> Option<NaiveDate> {
        self.installments.first().map(|i| i.due_date)
    }

    pub fn total_principal(&self) -> Money {
        self.installments.iter().map(|i| i.principal_portion).sum()
    }

    /// cent-rounded copy for display; amounts of `RoundEach`/`AdjustLast`
    /// schedules are already in cents and come back unchanged
    pub fn presented(&self) -> Schedule {
        let installments = self
            .installments
            .iter()
            .map(|i| Installment {
                principal_portion: i.principal_portion.round_cents(),
                interest_portion: i.interest_portion.round_cents(),
                total_payment: i.total_payment.round_cents(),
                remaining_balance: i.remaining_balance.round_cents(),
                beginning_balance: i.beginning_balance.round_cents(),
                cumulative_principal: i.cumulative_principal.round_cents(),
                cumulative_interest: i.cumulative_interest.round_cents(),
                accrual: PeriodAccrual {
                    year_fraction: i.accrual.year_fraction.round_dp(6),
                    ..i.accrual
                },
                ..i.clone()
            })
            .collect();

        Schedule {
            installments,
            summary: ScheduleSummary {
                level_payment: self.summary.level_payment.map(|p| p.round_cents()),
                ..self.summary.clone()
            },
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl ScheduleSummary {
    /// amount paid through installments: capital plus interest
    pub fn total_installments(&self) -> Money {
        self.effective_principal + self.total_interest
    }

    /// mean installment, rounded to cents
    pub fn average_payment(&self) -> Money {
        if self.installment_count == 0 {
            return Money::ZERO;
        }
        (self.total_installments() / Decimal::from(self.installment_count)).round_cents()
    }
}
