/// payment tracking - recording payments and reading overdue status with controlled time
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use loan_engine_rs::{
    calculate, LoanTerms, Money, PaymentLedger, Percentage, SafeTimeProvider, SolverConfig,
    TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== payment tracking example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let terms = LoanTerms::builder()
        .principal(Money::from_major(6_000))
        .annual_rate(Percentage::from_whole(7))
        .term_months(6)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .build()?;
    let result = calculate(&terms, &SolverConfig::default());

    let mut ledger = PaymentLedger::from_result(Uuid::new_v4(), &result)?;

    // pay the first installment on time, then twice by mistake
    ledger.record_payment_now(1, &time)?;
    ledger.record_payment_now(1, &time)?;

    // skip a month
    controller.advance(Duration::days(45));
    let today = time.now().date_naive();
    println!("today: {}", today);

    for entry in ledger.entries_with_status() {
        println!(
            "  #{} due {} {:>8} {:?}",
            entry.installment_no,
            entry.due_date,
            entry.total_due,
            ledger.display_status(entry.installment_no, today)
        );
    }

    let summary = ledger.summary(today);
    println!("\npaid {} of {}", summary.paid_count, summary.installments);
    println!("overdue: {} ({})", summary.overdue_count, summary.overdue_amount);
    println!("outstanding principal: {}", summary.outstanding_principal);

    for event in ledger.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
