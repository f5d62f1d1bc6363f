/// json terms - load terms as a form would submit them and emit the schedule as json
use loan_amortization_rs::{compute_schedule, LoanTerms};

const TERMS: &str = r#"{
    "principal": "5000000",
    "annualRatePercent": "4.8",
    "durationMonths": 36,
    "frequency": "QUARTERLY",
    "repaymentStyle": "AMORTIZABLE",
    "amortizationMethod": "CONSTANT_CAPITAL",
    "dayCountBasis": "ACT_360",
    "roundingRule": "ADJUST_LAST",
    "dateRule": "INCLUDE_START",
    "startDate": "2024-03-31",
    "initialFees": { "amount": "2", "kind": "PERCENTAGE_OF_PRINCIPAL", "addToCapital": true },
    "gracePeriodMonths": 6
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let terms = LoanTerms::from_json(TERMS)?;
    let schedule = compute_schedule(&terms)?;
    println!("{}", schedule.to_json_pretty());

    // rejected terms carry a reason code instead of a message
    let invalid = TERMS.replace("\"durationMonths\": 36", "\"durationMonths\": 0");
    match LoanTerms::from_json(&invalid) {
        Ok(_) => println!("unexpectedly accepted"),
        Err(err) => println!("rejected: {}", err.reason()),
    }

    Ok(())
}
