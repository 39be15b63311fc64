/// quick start - minimal example to get started
use chrono::NaiveDate;
use loan_engine_rs::{calculate, LoanTerms, Money, Percentage, SolverConfig};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // a 10,000 loan at 5.5% over five years
    let terms = LoanTerms::builder()
        .principal(Money::from_major(10_000))
        .annual_rate(Percentage::new(dec!(5.5)))
        .term_months(60)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .build()?;

    let result = calculate(&terms, &SolverConfig::default());

    println!("monthly payment: {}", result.first_payment.unwrap_or_default());
    println!("total interest:  {}", result.total_interest);
    println!("total payment:   {}", result.total_payment);
    if let Some(rate) = result.effective_rate {
        println!("effective rate:  {}", rate);
    }

    Ok(())
}
