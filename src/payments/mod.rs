pub mod amortization;
pub mod rounding;

pub use amortization::{annuity_payment, compute_schedule, AmortizationEngine};
pub use rounding::{PeriodSplit, RoundingPolicy};
