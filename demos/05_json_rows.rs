/// json rows - persistence views of a calculated loan
use chrono::NaiveDate;
use loan_engine_rs::serialization::to_json_pretty;
use loan_engine_rs::{
    calculate, LoanRow, LoanTerms, LoanType, Money, Percentage, RateType, ScheduleRow,
    SolverConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let terms = LoanTerms::builder()
        .loan_type(LoanType::FixedPrincipal)
        .principal(Money::from_major(3_000))
        .annual_rate(Percentage::from_whole(9))
        .term_months(3)
        .fee_setup(Money::from_major(50))
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 31).ok_or("bad date")?)
        .build()?;
    let result = calculate(&terms, &SolverConfig::default());

    let loan = LoanRow::from_calculation("Example Credit Union", RateType::Fixed, &terms, &result)?;
    println!("{}", loan.to_json_pretty()?);

    let rows = ScheduleRow::from_schedule(loan.id, &result.schedule);
    println!("{}", to_json_pretty(&rows)?);

    Ok(())
}
