/// quick start - compute a schedule and print it as a table
use chrono::NaiveDate;
use loan_amortization_rs::{compute_schedule, AmortizationMethod, Decimal, LoanTerms, Money};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 10,000,000 over 12 months at 5.5%, level payments
    let terms = LoanTerms::builder()
        .principal(Money::from_major(10_000_000))
        .rate_percent(Decimal::new(55, 1))
        .duration_months(12)
        .amortizable(AmortizationMethod::ConstantPayment)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?)
        .build()?;

    let schedule = compute_schedule(&terms)?;

    println!("{:>3} {:>12} {:>14} {:>14} {:>14} {:>16}", "#", "due", "capital", "interest", "payment", "balance");
    for i in &schedule.installments {
        println!(
            "{:>3} {:>12} {:>14} {:>14} {:>14} {:>16}",
            i.period_index,
            i.due_date,
            i.principal_portion,
            i.interest_portion,
            i.total_payment,
            i.remaining_balance
        );
    }

    let summary = &schedule.summary;
    println!();
    println!("total interest:  {}", summary.total_interest);
    println!("total to repay:  {}", summary.total_to_repay);
    println!("ends:            {}", summary.end_date);

    Ok(())
}
