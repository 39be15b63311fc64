/// solve unknowns - derive the rate or term from a known payment
use chrono::NaiveDate;
use loan_engine_rs::{
    calculate, solve_rate_from_payment, solve_term_from_payment, LoanTerms, LoanType, Money,
    Percentage, SolveRequest, SolverConfig,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== solving for unknowns ===\n");

    let config = SolverConfig::default();
    let request = SolveRequest::new(
        LoanType::Annuity,
        Money::from_major(10_000),
        Money::from_decimal(dec!(191.01)),
    );

    let rate = solve_rate_from_payment(&request, 60, &config)?;
    println!("191.01 a month over 60 months implies {}", rate);

    let term = solve_term_from_payment(&request, Percentage::new(dec!(5.5)), &config)?;
    println!("191.01 a month at 5.5% takes {} months", term);

    // through the calculator: leave the term open
    let terms = LoanTerms::builder()
        .principal(Money::from_major(25_000))
        .annual_rate(Percentage::new(dec!(6.9)))
        .fixed_monthly_payment(Money::from_major(500))
        .insurance_monthly(Money::from_major(15))
        .start_date(NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("bad date")?)
        .build()?;
    let result = calculate(&terms, &config);
    println!(
        "\n25,000 at 6.9%, paying 500 incl. insurance: {:?} months, maturity {:?}",
        result.resolved_term_months,
        result.schedule.last().map(|e| e.due_date)
    );

    // a payment that never clears the interest
    let request = SolveRequest::new(LoanType::Annuity, Money::from_major(10_000), Money::from_major(50));
    match solve_term_from_payment(&request, Percentage::from_whole(10), &config) {
        Ok(term) => println!("unexpected term {}", term),
        Err(err) => println!("\n50 a month at 10%: {}", err),
    }

    Ok(())
}
