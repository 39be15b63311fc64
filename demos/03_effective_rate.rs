/// effective rate - how fees and insurance change the cost of credit
use chrono::NaiveDate;
use loan_engine_rs::{calculate, LoanTerms, Money, Percentage, SolverConfig};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== effective rate example ===\n");

    let config = SolverConfig::default();
    let base = LoanTerms::builder()
        .principal(Money::from_major(10_000))
        .annual_rate(Percentage::new(dec!(5.5)))
        .term_months(60)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?);

    let cases = [
        ("no fees", Money::ZERO, Money::ZERO, Money::ZERO),
        ("setup fee 300", Money::from_major(300), Money::ZERO, Money::ZERO),
        ("monthly fee 5", Money::ZERO, Money::from_major(5), Money::ZERO),
        ("all charges", Money::from_major(300), Money::from_major(5), Money::from_major(12)),
    ];

    for (label, setup, monthly, insurance) in cases {
        let terms = base
            .clone()
            .fee_setup(setup)
            .fee_monthly(monthly)
            .insurance_monthly(insurance)
            .build()?;
        let result = calculate(&terms, &config);

        match (result.effective_rate, result.nominal_equivalent_rate) {
            (Some(effective), Some(nominal)) => println!(
                "{:<14} installment {:>7}  effective {:>10}  nominal equivalent {:>10}",
                label,
                result.first_payment.unwrap_or_default(),
                effective.round_dp(2),
                nominal.round_dp(2)
            ),
            _ => println!("{:<14} effective rate unavailable", label),
        }
    }

    Ok(())
}
