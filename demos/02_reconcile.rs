/// reconcile - check a stored schedule against the engine
use chrono::NaiveDate;
use loan_amortization_rs::{compute_schedule, reconcile, Decimal, InstallmentRecord, LoanTerms, Money};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let terms = LoanTerms::annuity(
        Money::from_major(250_000),
        Decimal::new(39, 1),
        24,
        NaiveDate::from_ymd_opt(2024, 5, 31).ok_or("bad date")?,
    );

    // what a backend stored when the loan was committed
    let mut stored: Vec<InstallmentRecord> = compute_schedule(&terms)?
        .installments
        .iter()
        .map(InstallmentRecord::from)
        .collect();

    let report = reconcile(&terms, &stored)?;
    println!("untouched: consistent = {}", report.is_consistent());

    // simulate a record edited outside the engine
    stored[3].interest_portion += Money::CENT;
    let report = reconcile(&terms, &stored)?;
    println!("edited: consistent = {}", report.is_consistent());
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
