/// loan types - the same principal under each amortization shape
use chrono::NaiveDate;
use loan_engine_rs::{calculate, LoanTerms, LoanType, Money, Percentage, SolverConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== loan types example ===\n");

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    let config = SolverConfig::default();

    for loan_type in [
        LoanType::Annuity,
        LoanType::FixedPrincipal,
        LoanType::InterestOnly,
        LoanType::AutoLoan,
    ] {
        let terms = LoanTerms::builder()
            .loan_type(loan_type)
            .principal(Money::from_major(12_000))
            .annual_rate(Percentage::from_whole(4))
            .term_months(12)
            .start_date(start)
            .build()?;

        let result = calculate(&terms, &config);
        println!("{}:", loan_type);
        println!("  first installment: {}", result.first_payment.unwrap_or_default());
        println!("  last installment:  {}", result.last_payment().unwrap_or_default());
        println!("  total interest:    {}", result.total_interest);
    }

    // interest only with a partial balloon
    let terms = LoanTerms::builder()
        .loan_type(LoanType::InterestOnly)
        .principal(Money::from_major(5_000))
        .annual_rate(Percentage::from_whole(6))
        .term_months(24)
        .balloon_amount(Money::from_major(3_000))
        .start_date(start)
        .build()?;
    let result = calculate(&terms, &config);

    println!("\ninterest only, 3000 balloon:");
    for entry in &result.schedule {
        println!(
            "  #{:>2} {}  principal {:>8}  interest {:>6}  balance {:>8}",
            entry.installment_no,
            entry.due_date,
            entry.principal_due,
            entry.interest_due,
            entry.principal_balance_after
        );
    }

    Ok(())
}
