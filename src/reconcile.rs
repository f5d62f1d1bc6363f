use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::Result;
use crate::payments::compute_schedule;
use crate::schedule::Installment;

/// core columns of an installment as a persistence layer stores them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentRecord {
    pub period_index: u32,
    pub due_date: NaiveDate,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub total_payment: Money,
    pub remaining_balance: Money,
}

impl From<&Installment> for InstallmentRecord {
    fn from(installment: &Installment) -> Self {
        Self {
            period_index: installment.period_index,
            due_date: installment.due_date,
            principal_portion: installment.principal_portion,
            interest_portion: installment.interest_portion,
            total_payment: installment.total_payment,
            remaining_balance: installment.remaining_balance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountField {
    Principal,
    Interest,
    Total,
    RemainingBalance,
}

/// a single disagreement between a stored record and the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Divergence {
    Amount {
        period_index: u32,
        field: AmountField,
        expected: Money,
        actual: Money,
    },
    DueDate {
        period_index: u32,
        expected: NaiveDate,
        actual: NaiveDate,
    },
    /// period the engine produces but nothing was stored for
    MissingPeriod {
        period_index: u32,
    },
    /// stored period the engine does not produce, or a duplicate
    UnexpectedPeriod {
        period_index: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub expected_periods: usize,
    pub stored_periods: usize,
    pub divergences: Vec<Divergence>,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.divergences.is_empty()
    }
}

/// recompute the schedule for `terms` and compare it with stored records exactly
///
/// A committed loan keeps its terms next to the installments persisted for it;
/// recomputing from those terms must reproduce the installments, and anything
/// else is reported period by period.
pub fn reconcile(terms: &LoanTerms, stored: &[InstallmentRecord]) -> Result<ReconciliationReport> {
    reconcile_with_tolerance(terms, stored, Money::ZERO)
}

/// as [`reconcile`], accepting amount differences up to `tolerance`
pub fn reconcile_with_tolerance(
    terms: &LoanTerms,
    stored: &[InstallmentRecord],
    tolerance: Money,
) -> Result<ReconciliationReport> {
    let schedule = compute_schedule(terms)?;

    let mut by_index: BTreeMap<u32, &InstallmentRecord> = BTreeMap::new();
    let mut divergences = Vec::new();
    for record in stored {
        if by_index.insert(record.period_index, record).is_some() {
            divergences.push(Divergence::UnexpectedPeriod {
                period_index: record.period_index,
            });
        }
    }

    for expected in &schedule.installments {
        let index = expected.period_index;
        let Some(actual) = by_index.remove(&index) else {
            divergences.push(Divergence::MissingPeriod { period_index: index });
            continue;
        };

        if expected.due_date != actual.due_date {
            divergences.push(Divergence::DueDate {
                period_index: index,
                expected: expected.due_date,
                actual: actual.due_date,
            });
        }

        let amounts = [
            (AmountField::Principal, expected.principal_portion, actual.principal_portion),
            (AmountField::Interest, expected.interest_portion, actual.interest_portion),
            (AmountField::Total, expected.total_payment, actual.total_payment),
            (AmountField::RemainingBalance, expected.remaining_balance, actual.remaining_balance),
        ];
        for (field, expected, actual) in amounts {
            if (expected - actual).abs() > tolerance {
                divergences.push(Divergence::Amount {
                    period_index: index,
                    field,
                    expected,
                    actual,
                });
            }
        }
    }

    divergences.extend(
        by_index
            .into_keys()
            .map(|period_index| Divergence::UnexpectedPeriod { period_index }),
    );

    if divergences.is_empty() {
        debug!("stored schedule matches {} recomputed periods", schedule.len());
    } else {
        warn!(
            "stored schedule diverges from recomputed terms in {} places",
            divergences.len()
        );
    }

    Ok(ReconciliationReport {
        expected_periods: schedule.len(),
        stored_periods: stored.len(),
        divergences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReasonCode;
    use rust_decimal_macros::dec;

    fn terms() -> LoanTerms {
        LoanTerms::annuity(
            Money::from_major(250_000),
            dec!(3.9),
            6,
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        )
    }

    fn stored() -> Vec<InstallmentRecord> {
        compute_schedule(&terms())
            .unwrap()
            .installments
            .iter()
            .map(InstallmentRecord::from)
            .collect()
    }

    #[test]
    fn test_matching_records_are_consistent() {
        let report = reconcile(&terms(), &stored()).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.expected_periods, 6);
        assert_eq!(report.stored_periods, 6);
    }

    #[test]
    fn test_amount_and_date_divergences() {
        let mut records = stored();
        records[1].interest_portion += Money::CENT;
        records[2].due_date = NaiveDate::from_ymd_opt(2024, 8, 30).unwrap();

        let report = reconcile(&terms(), &records).unwrap();
        assert_eq!(
            report.divergences,
            vec![
                Divergence::Amount {
                    period_index: 2,
                    field: AmountField::Interest,
                    expected: records[1].interest_portion - Money::CENT,
                    actual: records[1].interest_portion,
                },
                Divergence::DueDate {
                    period_index: 3,
                    expected: NaiveDate::from_ymd_opt(2024, 8, 31).unwrap(),
                    actual: NaiveDate::from_ymd_opt(2024, 8, 30).unwrap(),
                },
            ]
        );

        let tolerant = reconcile_with_tolerance(&terms(), &records, Money::CENT).unwrap();
        assert_eq!(tolerant.divergences.len(), 1);
    }

    #[test]
    fn test_missing_and_unexpected_periods() {
        let mut records = stored();
        let mut extra = records[5].clone();
        extra.period_index = 7;
        records.remove(0);
        records.push(extra);
        records.push(records[0].clone());

        let report = reconcile(&terms(), &records).unwrap();
        assert!(report.divergences.contains(&Divergence::MissingPeriod { period_index: 1 }));
        assert!(report.divergences.contains(&Divergence::UnexpectedPeriod { period_index: 7 }));
        assert!(report.divergences.contains(&Divergence::UnexpectedPeriod { period_index: 2 }));
    }

    #[test]
    fn test_invalid_stored_terms_fail() {
        let invalid = LoanTerms { duration_months: 0, ..terms() };
        let err = reconcile(&invalid, &stored()).unwrap_err();
        assert_eq!(err.reason(), ReasonCode::DurationNotPositive);
    }
}
