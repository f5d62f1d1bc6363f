use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// installment frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Monthly,
    Quarterly,
}

impl Frequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
        }
    }

    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }

    /// number of periods needed to cover `months`, rounding up
    pub fn periods_for(&self, months: u32) -> u32 {
        months.div_ceil(self.months_per_period())
    }
}

/// how capital is amortized on an amortizable loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmortizationMethod {
    /// level total payment (annuity)
    ConstantPayment,
    /// level capital share, declining interest
    ConstantCapital,
}

/// flat repayment style, as found on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentStyle {
    Amortizable,
    InFine,
}

/// repayment structure of a loan
///
/// An in-fine loan never carries an amortization method and an amortizable
/// loan always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "style", content = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Repayment {
    /// interest every period, all capital on the last one
    InFine,
    Amortizable(AmortizationMethod),
}

impl Repayment {
    pub fn style(&self) -> RepaymentStyle {
        match self {
            Repayment::InFine => RepaymentStyle::InFine,
            Repayment::Amortizable(_) => RepaymentStyle::Amortizable,
        }
    }

    pub fn method(&self) -> Option<AmortizationMethod> {
        match self {
            Repayment::InFine => None,
            Repayment::Amortizable(method) => Some(*method),
        }
    }
}

/// day count basis, carried on the schedule as metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCountBasis {
    /// actual days / 360
    #[serde(rename = "ACT_360")]
    Act360,
    /// actual days / 365
    #[serde(rename = "ACT_365")]
    Act365,
}

/// when amounts get rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingRule {
    /// round interest and capital independently every period
    RoundEach,
    /// keep full precision, round only the totals
    RoundEnd,
    /// round the level payment once, final period absorbs the drift
    AdjustLast,
}

/// whether the start date counts as the first day of period 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateRule {
    ExcludeStart,
    IncludeStart,
}

/// how the initial fee amount is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeKind {
    /// literal money amount
    Flat,
    /// whole percent of the principal (2 means 2%)
    PercentageOfPrincipal,
}

/// one-off fees charged when the loan is set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialFees {
    pub amount: Decimal,
    pub kind: FeeKind,
    /// amortize the fee with the capital instead of deducting it from disbursed funds
    pub add_to_capital: bool,
}

impl InitialFees {
    pub fn flat(amount: Money, add_to_capital: bool) -> Self {
        Self {
            amount: amount.as_decimal(),
            kind: FeeKind::Flat,
            add_to_capital,
        }
    }

    pub fn percentage(percent: Decimal, add_to_capital: bool) -> Self {
        Self {
            amount: percent,
            kind: FeeKind::PercentageOfPrincipal,
            add_to_capital,
        }
    }

    /// fee in money terms for the given principal, unrounded
    pub fn amount_for(&self, principal: Money) -> Money {
        match self.kind {
            FeeKind::Flat => Money::from_decimal(self.amount),
            FeeKind::PercentageOfPrincipal => principal.percentage(self.amount),
        }
    }

    /// as [`InitialFees::amount_for`], `None` when the product leaves the decimal range
    pub fn checked_amount_for(&self, principal: Money) -> Option<Money> {
        match self.kind {
            FeeKind::Flat => Some(Money::from_decimal(self.amount)),
            FeeKind::PercentageOfPrincipal => principal
                .as_decimal()
                .checked_mul(self.amount)
                .map(|d| Money::from_decimal(d / Decimal::ONE_HUNDRED)),
        }
    }
}
