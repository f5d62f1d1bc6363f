use log::{debug, trace, warn};
use rust_decimal::Decimal;

use crate::config::LoanTerms;
use crate::decimal::{Money, Rate};
use crate::errors::{InvalidTermsError, Result};
use crate::interest::{period_interest, PeriodAccrual};
use crate::payments::rounding::{PeriodSplit, RoundingPolicy};
use crate::schedule::{Installment, Schedule, ScheduleSummary};
use crate::types::{AmortizationMethod, Repayment};

/// stateless amortization engine
///
/// Every call works on its own terms and returns a fresh schedule, so one
/// engine can be shared across threads without locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationEngine;

impl AmortizationEngine {
    pub fn new() -> Self {
        Self
    }

    /// validate the terms and compute the full schedule
    pub fn compute_schedule(&self, terms: &LoanTerms) -> Result<Schedule> {
        compute_schedule(terms)
    }
}

/// validate the terms and compute the full schedule with its summary
pub fn compute_schedule(terms: &LoanTerms) -> Result<Schedule> {
    if let Err(err) = terms.validate() {
        warn!("rejected loan terms: {} [{}]", err, err.reason());
        return Err(err);
    }

    let plan = AmortizationPlan::from_terms(terms)?;
    debug!(
        "computing schedule: {} periods ({} grace), periodic rate {}, {:?}, {:?}",
        plan.total_periods,
        plan.grace_periods,
        plan.periodic_rate.as_decimal(),
        terms.repayment,
        terms.rounding_rule,
    );

    let installments = plan.installments(terms)?;
    let summary = plan.summarize(&installments);

    debug!(
        "schedule computed: total interest {}, total to repay {}, ends {}",
        summary.total_interest, summary.total_to_repay, summary.end_date
    );

    Ok(Schedule {
        start_date: terms.start_date,
        frequency: terms.frequency,
        repayment: terms.repayment,
        rounding_rule: terms.rounding_rule,
        day_count_basis: terms.day_count_basis,
        date_rule: terms.date_rule,
        installments,
        summary,
    })
}

/// values derived once from validated terms
#[derive(Debug, Clone)]
struct AmortizationPlan {
    repayment: Repayment,
    policy: RoundingPolicy,
    fee_amount: Money,
    fee_capitalized: bool,
    effective_principal: Money,
    total_periods: u32,
    grace_periods: u32,
    periodic_rate: Rate,
    amortizing_periods: u32,
    /// constant-payment level payment after the rounding policy
    level_payment: Option<Money>,
}

impl AmortizationPlan {
    fn from_terms(terms: &LoanTerms) -> Result<Self> {
        let policy = RoundingPolicy::new(terms.rounding_rule);

        // fees are a one-off charge, always settled in cents
        let (fee_amount, fee_capitalized) = match &terms.initial_fees {
            Some(fees) => (fees.amount_for(terms.principal).round_cents(), fees.add_to_capital),
            None => (Money::ZERO, false),
        };
        let effective_principal = if fee_capitalized {
            terms.principal + fee_amount
        } else {
            terms.principal
        };

        let total_periods = terms.total_periods();
        let grace_periods = match terms.repayment {
            Repayment::InFine => 0,
            Repayment::Amortizable(_) => terms.grace_periods(),
        };
        let amortizing_periods = total_periods - grace_periods;
        let periodic_rate = terms.periodic_rate();

        let level_payment = match terms.repayment {
            Repayment::Amortizable(AmortizationMethod::ConstantPayment) => {
                let raw = annuity_payment(effective_principal, periodic_rate, amortizing_periods)
                    .ok_or(InvalidTermsError::AmountOutOfRange {
                        principal: terms.principal,
                        rate: terms.annual_rate,
                        periods: total_periods,
                    })?;
                Some(policy.level_payment(raw))
            }
            _ => None,
        };
        Ok(Self {
            repayment: terms.repayment,
            policy,
            fee_amount,
            fee_capitalized,
            effective_principal,
            total_periods,
            grace_periods,
            periodic_rate,
            amortizing_periods,
            level_payment,
        })
    }

    fn is_grace(&self, index: u32) -> bool {
        index <= self.grace_periods
    }

    /// unrounded capital and interest for a period starting at `balance`
    fn raw_split(&self, index: u32, balance: Money) -> PeriodSplit {
        let interest = period_interest(balance, self.periodic_rate);
        let is_final = index == self.total_periods;

        match self.repayment {
            Repayment::InFine if is_final => PeriodSplit::new(balance, interest),
            Repayment::InFine => PeriodSplit::new(Money::ZERO, interest),
            Repayment::Amortizable(_) if self.is_grace(index) => PeriodSplit::new(Money::ZERO, interest),
            Repayment::Amortizable(AmortizationMethod::ConstantCapital) => {
                PeriodSplit::new(self.capital_due(index, balance), interest)
            }
            Repayment::Amortizable(AmortizationMethod::ConstantPayment) => {
                PeriodSplit::level(self.level_payment.unwrap_or(Money::ZERO), interest)
            }
        }
    }

    /// constant capital: capital scheduled through this period less capital
    /// already repaid, i.e. `P / n` before rounding, correcting earlier
    /// rounding after it
    fn capital_due(&self, index: u32, balance: Money) -> Money {
        let amortized_periods = index - self.grace_periods;
        let scheduled = self.effective_principal * Decimal::from(amortized_periods)
            / Decimal::from(self.amortizing_periods);
        let repaid = self.effective_principal - balance;
        (scheduled - repaid).max(Money::ZERO)
    }

    fn installments(&self, terms: &LoanTerms) -> Result<Vec<Installment>> {
        let mut installments = Vec::with_capacity(self.total_periods as usize);
        let mut balance = self.effective_principal;
        let mut cumulative_principal = Money::ZERO;
        let mut cumulative_interest = Money::ZERO;
        let mut period_start = terms.start_date;

        for index in 1..=self.total_periods {
            let due_date = terms.due_date(index)?;
            let mut split = self.policy.apply(self.raw_split(index, balance));

            // the final period settles whatever is left, absorbing rounding drift
            if index == self.total_periods {
                split.principal = balance;
            } else {
                split.principal = split.principal.min(balance);
            }

            let beginning_balance = balance;
            balance = (balance - split.principal).max(Money::ZERO);
            cumulative_principal += split.principal;
            cumulative_interest += split.interest;

            trace!(
                "period {} due {}: principal {}, interest {}, balance {}",
                index,
                due_date,
                split.principal,
                split.interest,
                balance
            );

            installments.push(Installment {
                period_index: index,
                due_date,
                principal_portion: split.principal,
                interest_portion: split.interest,
                total_payment: split.total(),
                remaining_balance: balance,
                beginning_balance,
                cumulative_principal,
                cumulative_interest,
                is_grace: matches!(self.repayment, Repayment::Amortizable(_)) && self.is_grace(index),
                accrual: PeriodAccrual::new(
                    period_start,
                    due_date,
                    index == 1,
                    terms.day_count_basis,
                    terms.date_rule,
                ),
            });

            period_start = due_date;
        }

        Ok(installments)
    }

    fn summarize(&self, installments: &[Installment]) -> ScheduleSummary {
        let total_interest = self
            .policy
            .total(installments.iter().map(|i| i.interest_portion).sum());

        let uncapitalized_fee = if self.fee_capitalized {
            Money::ZERO
        } else {
            self.fee_amount
        };
        let total_to_repay = self
            .policy
            .total(self.effective_principal + total_interest + uncapitalized_fee);

        let end_date = installments
            .last()
            .map(|i| i.due_date)
            .unwrap_or_default();

        ScheduleSummary {
            total_interest,
            total_to_repay,
            effective_principal: self.effective_principal,
            initial_fees_amount: self.fee_amount,
            net_disbursed: self.effective_principal - self.fee_amount,
            end_date,
            installment_count: installments.len() as u32,
            grace_periods: self.grace_periods,
            periodic_rate: self.periodic_rate,
            level_payment: self.level_payment.map(|p| p.round_cents()),
        }
    }
}

/// level payment that amortizes `principal` over `periods` at `rate`
///
/// `P * r / (1 - (1+r)^-n)`, or `P / n` when the rate is zero. Once `(1+r)^n`
/// leaves the decimal range the discount term vanishes and the payment is pure
/// interest `P * r`. `None` when `P * r` itself does not fit.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> Option<Money> {
    if periods == 0 {
        return Some(principal);
    }

    let level_capital = principal / Decimal::from(periods);
    if rate.is_zero() {
        return Some(level_capital);
    }

    let interest = principal.as_decimal().checked_mul(rate.as_decimal())?;
    let discount = match rate.compound_factor(periods) {
        Some(compound) => Decimal::ONE - Decimal::ONE / compound,
        None => Decimal::ONE,
    };
    // a rate too small to move (1+r)^n behaves like no rate at all
    if discount.is_zero() {
        return Some(level_capital);
    }
    interest.checked_div(discount).map(Money::from_decimal)
}
