use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::AmortizationMethod;

/// terms rejected before any schedule is computed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTermsError {
    #[error("principal must be positive: {principal}")]
    PrincipalNotPositive {
        principal: Money,
    },

    #[error("duration must be positive: {months} months")]
    DurationNotPositive {
        months: i64,
    },

    #[error("annual rate must not be negative: {rate}")]
    NegativeRate {
        rate: Rate,
    },

    #[error("amortizable loan requires an amortization method")]
    MissingAmortizationMethod,

    #[error("in-fine loan cannot carry amortization method {method:?}")]
    MethodNotApplicable {
        method: AmortizationMethod,
    },

    #[error("grace period of {grace_months} months leaves nothing to amortize over {duration_months} months")]
    GraceExceedsDuration {
        grace_months: i64,
        duration_months: i64,
    },

    #[error("initial fee must not be negative: {amount}")]
    NegativeFee {
        amount: Money,
    },

    #[error("initial fee {fee} exceeds principal {principal} it is deducted from")]
    FeeExceedsPrincipal {
        fee: Money,
        principal: Money,
    },

    #[error("amounts for principal {principal} at {rate} over {periods} periods exceed the decimal range")]
    AmountOutOfRange {
        principal: Money,
        rate: Rate,
        periods: u32,
    },

    #[error("due date out of range: {months} months after {start_date}")]
    DateOutOfRange {
        start_date: chrono::NaiveDate,
        months: u32,
    },

    #[error("malformed terms: {message}")]
    MalformedTerms {
        message: String,
    },
}

impl InvalidTermsError {
    /// machine-readable reason for callers to map onto their own messages
    pub fn reason(&self) -> ReasonCode {
        match self {
            InvalidTermsError::PrincipalNotPositive { .. } => ReasonCode::PrincipalNotPositive,
            InvalidTermsError::DurationNotPositive { .. } => ReasonCode::DurationNotPositive,
            InvalidTermsError::NegativeRate { .. } => ReasonCode::NegativeRate,
            InvalidTermsError::MissingAmortizationMethod => ReasonCode::MissingAmortizationMethod,
            InvalidTermsError::MethodNotApplicable { .. } => ReasonCode::MethodNotApplicable,
            InvalidTermsError::GraceExceedsDuration { .. } => ReasonCode::GraceExceedsDuration,
            InvalidTermsError::NegativeFee { .. } => ReasonCode::NegativeFee,
            InvalidTermsError::FeeExceedsPrincipal { .. } => ReasonCode::FeeExceedsPrincipal,
            InvalidTermsError::AmountOutOfRange { .. } => ReasonCode::AmountOutOfRange,
            InvalidTermsError::DateOutOfRange { .. } => ReasonCode::DateOutOfRange,
            InvalidTermsError::MalformedTerms { .. } => ReasonCode::MalformedTerms,
        }
    }
}

impl From<serde_json::Error> for InvalidTermsError {
    fn from(err: serde_json::Error) -> Self {
        InvalidTermsError::MalformedTerms {
            message: err.to_string(),
        }
    }
}

/// reason codes exposed across the engine boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    PrincipalNotPositive,
    DurationNotPositive,
    NegativeRate,
    MissingAmortizationMethod,
    MethodNotApplicable,
    GraceExceedsDuration,
    NegativeFee,
    FeeExceedsPrincipal,
    AmountOutOfRange,
    DateOutOfRange,
    MalformedTerms,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::PrincipalNotPositive => "PRINCIPAL_NOT_POSITIVE",
            ReasonCode::DurationNotPositive => "DURATION_NOT_POSITIVE",
            ReasonCode::NegativeRate => "NEGATIVE_RATE",
            ReasonCode::MissingAmortizationMethod => "MISSING_AMORTIZATION_METHOD",
            ReasonCode::MethodNotApplicable => "METHOD_NOT_APPLICABLE",
            ReasonCode::GraceExceedsDuration => "GRACE_EXCEEDS_DURATION",
            ReasonCode::NegativeFee => "NEGATIVE_FEE",
            ReasonCode::FeeExceedsPrincipal => "FEE_EXCEEDS_PRINCIPAL",
            ReasonCode::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            ReasonCode::DateOutOfRange => "DATE_OUT_OF_RANGE",
            ReasonCode::MalformedTerms => "MALFORMED_TERMS",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, InvalidTermsError>;
