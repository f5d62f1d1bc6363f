pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod payments;
pub mod reconcile;
pub mod schedule;
pub mod types;

// re-export key types
pub use config::{LoanTerms, LoanTermsBuilder, LoanTermsInput};
pub use decimal::{Money, Rate};
pub use errors::{InvalidTermsError, ReasonCode, Result};
pub use interest::PeriodAccrual;
pub use payments::{compute_schedule, AmortizationEngine, RoundingPolicy};
pub use reconcile::{reconcile, InstallmentRecord, ReconciliationReport};
pub use schedule::{Installment, Schedule, ScheduleSummary};
pub use types::{
    AmortizationMethod, DateRule, DayCountBasis, FeeKind, Frequency, InitialFees, Repayment,
    RepaymentStyle, RoundingRule,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
