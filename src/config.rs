use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{InvalidTermsError, Result};
use crate::types::{
    AmortizationMethod, DateRule, DayCountBasis, Frequency, InitialFees, Repayment,
    RepaymentStyle, RoundingRule,
};

/// loan terms the engine computes a schedule from
///
/// Serializes through [`LoanTermsInput`], so the stored form of a committed loan
/// is the same flat document a simulation is submitted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LoanTermsInput", into = "LoanTermsInput")]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub duration_months: u32,
    pub frequency: Frequency,
    pub repayment: Repayment,
    pub day_count_basis: DayCountBasis,
    pub rounding_rule: RoundingRule,
    pub date_rule: DateRule,
    pub start_date: NaiveDate,
    pub initial_fees: Option<InitialFees>,
    pub grace_period_months: u32,
}

/// flat wire form of the terms, as collected by a form or stored by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTermsInput {
    pub principal: Decimal,
    /// whole percent, 5.5 means 5.5%
    pub annual_rate_percent: Decimal,
    pub duration_months: i64,
    pub frequency: Frequency,
    pub repayment_style: RepaymentStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization_method: Option<AmortizationMethod>,
    pub day_count_basis: DayCountBasis,
    pub rounding_rule: RoundingRule,
    pub date_rule: DateRule,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_fees: Option<InitialFees>,
    #[serde(default)]
    pub grace_period_months: i64,
}

impl TryFrom<LoanTermsInput> for LoanTerms {
    type Error = InvalidTermsError;

    fn try_from(input: LoanTermsInput) -> Result<Self> {
        if input.duration_months <= 0 {
            return Err(InvalidTermsError::DurationNotPositive {
                months: input.duration_months,
            });
        }
        if input.grace_period_months < 0 {
            return Err(InvalidTermsError::MalformedTerms {
                message: format!(
                    "grace period must not be negative: {} months",
                    input.grace_period_months
                ),
            });
        }

        let repayment = match (input.repayment_style, input.amortization_method) {
            (RepaymentStyle::InFine, None) => Repayment::InFine,
            (RepaymentStyle::InFine, Some(method)) => {
                return Err(InvalidTermsError::MethodNotApplicable { method });
            }
            (RepaymentStyle::Amortizable, Some(method)) => Repayment::Amortizable(method),
            (RepaymentStyle::Amortizable, None) => {
                return Err(InvalidTermsError::MissingAmortizationMethod);
            }
        };

        let duration_months = month_count(input.duration_months)?;
        let grace_period_months = month_count(input.grace_period_months)?;

        let terms = LoanTerms {
            principal: Money::from_decimal(input.principal),
            annual_rate: Rate::from_percent(input.annual_rate_percent),
            duration_months,
            frequency: input.frequency,
            repayment,
            day_count_basis: input.day_count_basis,
            rounding_rule: input.rounding_rule,
            date_rule: input.date_rule,
            start_date: input.start_date,
            initial_fees: input.initial_fees,
            grace_period_months,
        };
        terms.validate()?;
        Ok(terms)
    }
}

impl From<LoanTerms> for LoanTermsInput {
    fn from(terms: LoanTerms) -> Self {
        Self {
            principal: terms.principal.as_decimal(),
            annual_rate_percent: terms.annual_rate.as_percentage().normalize(),
            duration_months: terms.duration_months as i64,
            frequency: terms.frequency,
            repayment_style: terms.repayment.style(),
            amortization_method: terms.repayment.method(),
            day_count_basis: terms.day_count_basis,
            rounding_rule: terms.rounding_rule,
            date_rule: terms.date_rule,
            start_date: terms.start_date,
            initial_fees: terms.initial_fees,
            grace_period_months: terms.grace_period_months as i64,
        }
    }
}

fn month_count(months: i64) -> Result<u32> {
    u32::try_from(months).map_err(|_| InvalidTermsError::MalformedTerms {
        message: format!("month count out of range: {}", months),
    })
}

impl LoanTerms {
    /// constant-payment monthly loan with no fees and no grace
    pub fn annuity(
        principal: Money,
        annual_rate_percent: Decimal,
        duration_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            principal,
            annual_rate: Rate::from_percent(annual_rate_percent),
            duration_months,
            frequency: Frequency::Monthly,
            repayment: Repayment::Amortizable(AmortizationMethod::ConstantPayment),
            day_count_basis: DayCountBasis::Act365,
            rounding_rule: RoundingRule::AdjustLast,
            date_rule: DateRule::ExcludeStart,
            start_date,
            initial_fees: None,
            grace_period_months: 0,
        }
    }

    /// interest-only monthly loan repaid in full at maturity
    pub fn in_fine(
        principal: Money,
        annual_rate_percent: Decimal,
        duration_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            repayment: Repayment::InFine,
            ..Self::annuity(principal, annual_rate_percent, duration_months, start_date)
        }
    }

    pub fn builder() -> LoanTermsBuilder {
        LoanTermsBuilder::new()
    }

    /// parse and validate the flat JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let input: LoanTermsInput = serde_json::from_str(json)?;
        LoanTerms::try_from(input)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&LoanTermsInput::from(self.clone()))
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    /// total number of installments
    pub fn total_periods(&self) -> u32 {
        self.frequency.periods_for(self.duration_months)
    }

    /// leading interest-only periods
    pub fn grace_periods(&self) -> u32 {
        self.frequency.periods_for(self.grace_period_months)
    }

    /// periodic rate: annual rate split evenly across the year's periods
    pub fn periodic_rate(&self) -> Rate {
        self.annual_rate.per_period(self.frequency.periods_per_year())
    }

    /// due date of period `index`, calendar months after the start date
    pub fn due_date(&self, index: u32) -> Result<NaiveDate> {
        let out_of_range = || InvalidTermsError::DateOutOfRange {
            start_date: self.start_date,
            months: index.saturating_mul(self.frequency.months_per_period()),
        };
        let months = index
            .checked_mul(self.frequency.months_per_period())
            .ok_or_else(out_of_range)?;
        self.start_date
            .checked_add_months(Months::new(months))
            .ok_or_else(out_of_range)
    }

    /// check every precondition the engine relies on
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(InvalidTermsError::PrincipalNotPositive {
                principal: self.principal,
            });
        }

        if self.duration_months == 0 {
            return Err(InvalidTermsError::DurationNotPositive { months: 0 });
        }

        if self.annual_rate.is_negative() {
            return Err(InvalidTermsError::NegativeRate {
                rate: self.annual_rate,
            });
        }

        // a quarterly grace that rounds up to every period is just as empty
        if self.grace_period_months >= self.duration_months
            || self.grace_periods() >= self.total_periods()
        {
            return Err(InvalidTermsError::GraceExceedsDuration {
                grace_months: self.grace_period_months as i64,
                duration_months: self.duration_months as i64,
            });
        }

        if let Some(fees) = &self.initial_fees {
            if fees.amount < Decimal::ZERO {
                return Err(InvalidTermsError::NegativeFee {
                    amount: Money::from_decimal(fees.amount),
                });
            }
        }

        if self.amount_bound().is_none() {
            return Err(InvalidTermsError::AmountOutOfRange {
                principal: self.principal,
                rate: self.annual_rate,
                periods: self.total_periods(),
            });
        }

        if let Some(fees) = &self.initial_fees {
            // an uncapitalized fee comes out of the disbursed funds
            let fee = fees.amount_for(self.principal).round_cents();
            if !fees.add_to_capital && fee > self.principal {
                return Err(InvalidTermsError::FeeExceedsPrincipal {
                    fee,
                    principal: self.principal,
                });
            }
        }

        self.due_date(self.total_periods())?;

        Ok(())
    }

    /// upper bound on every amount a schedule for these terms produces:
    /// `(P + fee) * (1 + (1 + r) * n) + fee`, covering balances, per-period
    /// interest, interest totals, constant-capital targets and the total to repay
    fn amount_bound(&self) -> Option<Decimal> {
        let fee = match &self.initial_fees {
            Some(fees) => fees.checked_amount_for(self.principal)?.as_decimal(),
            None => Decimal::ZERO,
        };
        let growth = (Decimal::ONE + self.periodic_rate().as_decimal())
            .checked_mul(Decimal::from(self.total_periods()))?
            .checked_add(Decimal::ONE)?;
        self.principal
            .as_decimal()
            .checked_add(fee)?
            .checked_mul(growth)?
            .checked_add(fee)
    }
}

/// builder for loan terms
pub struct LoanTermsBuilder {
    principal: Option<Money>,
    annual_rate_percent: Option<Decimal>,
    duration_months: Option<u32>,
    frequency: Frequency,
    repayment: Option<Repayment>,
    day_count_basis: DayCountBasis,
    rounding_rule: RoundingRule,
    date_rule: DateRule,
    start_date: Option<NaiveDate>,
    initial_fees: Option<InitialFees>,
    grace_period_months: u32,
}

impl Default for LoanTermsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanTermsBuilder {
    pub fn new() -> Self {
        Self {
            principal: None,
            annual_rate_percent: None,
            duration_months: None,
            frequency: Frequency::Monthly,
            repayment: None,
            day_count_basis: DayCountBasis::Act365,
            rounding_rule: RoundingRule::AdjustLast,
            date_rule: DateRule::ExcludeStart,
            start_date: None,
            initial_fees: None,
            grace_period_months: 0,
        }
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    /// annual rate as a whole percent (5.5 for 5.5%)
    pub fn rate_percent(mut self, percent: Decimal) -> Self {
        self.annual_rate_percent = Some(percent);
        self
    }

    pub fn duration_months(mut self, months: u32) -> Self {
        self.duration_months = Some(months);
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn repayment(mut self, repayment: Repayment) -> Self {
        self.repayment = Some(repayment);
        self
    }

    pub fn in_fine(self) -> Self {
        self.repayment(Repayment::InFine)
    }

    pub fn amortizable(self, method: AmortizationMethod) -> Self {
        self.repayment(Repayment::Amortizable(method))
    }

    pub fn day_count_basis(mut self, basis: DayCountBasis) -> Self {
        self.day_count_basis = basis;
        self
    }

    pub fn rounding_rule(mut self, rule: RoundingRule) -> Self {
        self.rounding_rule = rule;
        self
    }

    pub fn date_rule(mut self, rule: DateRule) -> Self {
        self.date_rule = rule;
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn initial_fees(mut self, fees: InitialFees) -> Self {
        self.initial_fees = Some(fees);
        self
    }

    pub fn grace_period_months(mut self, months: u32) -> Self {
        self.grace_period_months = months;
        self
    }

    pub fn build(self) -> Result<LoanTerms> {
        let principal = self.principal.ok_or(InvalidTermsError::MalformedTerms {
            message: "principal required".to_string(),
        })?;

        let rate = self.annual_rate_percent.ok_or(InvalidTermsError::MalformedTerms {
            message: "rate required".to_string(),
        })?;

        let duration_months = self.duration_months.ok_or(InvalidTermsError::MalformedTerms {
            message: "duration required".to_string(),
        })?;

        let repayment = self.repayment.ok_or(InvalidTermsError::MalformedTerms {
            message: "repayment style required".to_string(),
        })?;

        let start_date = self.start_date.ok_or(InvalidTermsError::MalformedTerms {
            message: "start date required".to_string(),
        })?;

        let terms = LoanTerms {
            principal,
            annual_rate: Rate::from_percent(rate),
            duration_months,
            frequency: self.frequency,
            repayment,
            day_count_basis: self.day_count_basis,
            rounding_rule: self.rounding_rule,
            date_rule: self.date_rule,
            start_date,
            initial_fees: self.initial_fees,
            grace_period_months: self.grace_period_months,
        };
        terms.validate()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReasonCode;
    use crate::types::FeeKind;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn input() -> LoanTermsInput {
        LoanTermsInput {
            principal: dec!(10000000),
            annual_rate_percent: dec!(5.5),
            duration_months: 12,
            frequency: Frequency::Monthly,
            repayment_style: RepaymentStyle::Amortizable,
            amortization_method: Some(AmortizationMethod::ConstantPayment),
            day_count_basis: DayCountBasis::Act360,
            rounding_rule: RoundingRule::AdjustLast,
            date_rule: DateRule::ExcludeStart,
            start_date: start(),
            initial_fees: None,
            grace_period_months: 0,
        }
    }

    #[test]
    fn test_input_conversion() {
        let terms = LoanTerms::try_from(input()).unwrap();
        assert_eq!(terms.principal, Money::from_major(10_000_000));
        assert_eq!(terms.annual_rate.as_decimal(), dec!(0.055));
        assert_eq!(terms.repayment, Repayment::Amortizable(AmortizationMethod::ConstantPayment));

        let back = LoanTermsInput::from(terms);
        assert_eq!(back, input());
    }

    #[test]
    fn test_missing_method_rejected() {
        let mut raw = input();
        raw.amortization_method = None;
        let err = LoanTerms::try_from(raw).unwrap_err();
        assert_eq!(err.reason(), ReasonCode::MissingAmortizationMethod);
    }

    #[test]
    fn test_in_fine_with_method_rejected() {
        let mut raw = input();
        raw.repayment_style = RepaymentStyle::InFine;
        let err = LoanTerms::try_from(raw).unwrap_err();
        assert_eq!(err.reason(), ReasonCode::MethodNotApplicable);
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut raw = input();
        raw.duration_months = -3;
        assert_eq!(
            LoanTerms::try_from(raw).unwrap_err(),
            InvalidTermsError::DurationNotPositive { months: -3 }
        );
    }

    #[test]
    fn test_validation_reasons() {
        let base = LoanTerms::annuity(Money::from_major(1_000), dec!(5), 12, start());
        assert!(base.validate().is_ok());

        let zero_principal = LoanTerms { principal: Money::ZERO, ..base.clone() };
        assert_eq!(zero_principal.validate().unwrap_err().reason(), ReasonCode::PrincipalNotPositive);

        let negative_rate = LoanTerms { annual_rate: Rate::from_percent(dec!(-1)), ..base.clone() };
        assert_eq!(negative_rate.validate().unwrap_err().reason(), ReasonCode::NegativeRate);

        let zero_duration = LoanTerms { duration_months: 0, ..base.clone() };
        assert_eq!(zero_duration.validate().unwrap_err().reason(), ReasonCode::DurationNotPositive);

        let full_grace = LoanTerms { grace_period_months: 12, ..base.clone() };
        assert_eq!(full_grace.validate().unwrap_err().reason(), ReasonCode::GraceExceedsDuration);

        let negative_fee = LoanTerms {
            initial_fees: Some(InitialFees { amount: dec!(-1), kind: FeeKind::Flat, add_to_capital: false }),
            ..base.clone()
        };
        assert_eq!(negative_fee.validate().unwrap_err().reason(), ReasonCode::NegativeFee);

        let oversized_fee = LoanTerms {
            initial_fees: Some(InitialFees::flat(Money::from_major(1_001), false)),
            ..negative_fee.clone()
        };
        assert_eq!(oversized_fee.validate().unwrap_err().reason(), ReasonCode::FeeExceedsPrincipal);

        let capitalized_fee = LoanTerms {
            initial_fees: Some(InitialFees::flat(Money::from_major(1_001), true)),
            ..negative_fee
        };
        assert!(capitalized_fee.validate().is_ok());
    }

    #[test]
    fn test_quarterly_grace_consuming_all_periods() {
        // 5 months quarterly -> 2 periods; 4 grace months -> 2 grace periods
        let terms = LoanTerms {
            duration_months: 5,
            grace_period_months: 4,
            frequency: Frequency::Quarterly,
            ..LoanTerms::annuity(Money::from_major(1_000), dec!(5), 5, start())
        };
        assert_eq!(terms.validate().unwrap_err().reason(), ReasonCode::GraceExceedsDuration);
    }

    #[test]
    fn test_amounts_must_fit_decimal_range() {
        let large = LoanTerms::annuity(Money::from_major(10_000_000_000), dec!(100), 600, start());
        assert!(large.validate().is_ok());

        let oversized = LoanTerms {
            principal: Money::from_decimal(dec!(1_000_000_000_000_000_000_000_000_000)),
            ..large.clone()
        };
        assert_eq!(oversized.validate().unwrap_err().reason(), ReasonCode::AmountOutOfRange);

        let json = oversized.to_json();
        assert_eq!(LoanTerms::from_json(&json).unwrap_err().reason(), ReasonCode::AmountOutOfRange);
    }

    #[test]
    fn test_due_dates_use_calendar_months() {
        let terms = LoanTerms::annuity(Money::from_major(1_000), dec!(5), 12, start());
        assert_eq!(terms.due_date(1).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(terms.due_date(2).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        let quarterly = LoanTerms { frequency: Frequency::Quarterly, ..terms };
        assert_eq!(quarterly.due_date(1).unwrap(), NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
    }

    #[test]
    fn test_builder_defaults_and_requirements() {
        let terms = LoanTerms::builder()
            .principal(Money::from_major(1_000_000))
            .rate_percent(dec!(0))
            .duration_months(4)
            .amortizable(AmortizationMethod::ConstantCapital)
            .start_date(start())
            .build()
            .unwrap();
        assert_eq!(terms.frequency, Frequency::Monthly);
        assert_eq!(terms.rounding_rule, RoundingRule::AdjustLast);
        assert_eq!(terms.total_periods(), 4);

        let missing = LoanTerms::builder().principal(Money::from_major(1)).build();
        assert_eq!(missing.unwrap_err().reason(), ReasonCode::MalformedTerms);
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "principal": "5000000",
            "annualRatePercent": "4.25",
            "durationMonths": 24,
            "frequency": "QUARTERLY",
            "repaymentStyle": "AMORTIZABLE",
            "amortizationMethod": "CONSTANT_CAPITAL",
            "dayCountBasis": "ACT_365",
            "roundingRule": "ROUND_EACH",
            "dateRule": "INCLUDE_START",
            "startDate": "2024-03-15",
            "initialFees": { "amount": "2", "kind": "PERCENTAGE_OF_PRINCIPAL", "addToCapital": true },
            "gracePeriodMonths": 3
        }"#;
        let terms = LoanTerms::from_json(json).unwrap();
        assert_eq!(terms.total_periods(), 8);
        assert_eq!(terms.grace_periods(), 1);
        assert_eq!(terms.periodic_rate().as_decimal(), dec!(0.010625));

        let reparsed = LoanTerms::from_json(&terms.to_json()).unwrap();
        assert_eq!(reparsed, terms);
    }

    #[test]
    fn test_malformed_json() {
        let err = LoanTerms::from_json("{\"principal\": 1}").unwrap_err();
        assert_eq!(err.reason(), ReasonCode::MalformedTerms);
    }
}
