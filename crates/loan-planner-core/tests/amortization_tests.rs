use loan_planner_core::amortization::prepayment::analyze_prepayment;
use loan_planner_core::amortization::schedule::{
    build_amortization_schedule, Prepayment, PrepaymentMode, ScheduleParams, BALANCE_EPSILON,
};
use loan_planner_core::annuity::{compute_annuity_payment, remaining_balance, summarize_loan};
use loan_planner_core::{Loan, LoanPlannerError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Annuity payment
// ===========================================================================

#[test]
fn test_reference_payment_one_year_twelve_percent() {
    let pmt = compute_annuity_payment(dec!(100_000), dec!(12), 12);
    assert!((pmt - dec!(8884)).abs() <= dec!(5), "payment {pmt}");
}

#[test]
fn test_thirty_year_mortgage_payment() {
    // Textbook figure: 250k at 5% over 360 months ≈ 1342.05
    let pmt = compute_annuity_payment(dec!(250_000), dec!(5), 360);
    assert!((pmt - dec!(1342.05)).abs() < dec!(0.01), "payment {pmt}");
}

#[test]
fn test_zero_rate_equals_principal_over_periods() {
    for n in [1u32, 6, 12, 59, 360] {
        let p = dec!(98_765.43);
        assert_eq!(compute_annuity_payment(p, Decimal::ZERO, n), p / Decimal::from(n));
    }
}

#[test]
fn test_invalid_input_sentinel() {
    for apr in [dec!(0), dec!(3.5), dec!(25)] {
        assert_eq!(compute_annuity_payment(Decimal::ZERO, apr, 24), Decimal::ZERO);
        assert_eq!(compute_annuity_payment(dec!(5_000), apr, 0), Decimal::ZERO);
        assert_eq!(compute_annuity_payment(dec!(-5_000), apr, 24), Decimal::ZERO);
    }
}

// ===========================================================================
// Schedules
// ===========================================================================

#[test]
fn test_schedule_conserves_principal() {
    for (p, apr, n) in [
        (dec!(100_000), dec!(12), 12u32),
        (dec!(7_500), dec!(18.9), 36),
        (dec!(320_000), dec!(4.25), 360),
        (dec!(2_000), Decimal::ZERO, 10),
    ] {
        let s = build_amortization_schedule(&ScheduleParams::new(p, apr, n)).unwrap();
        assert!((s.total_paid - s.total_interest - p).abs() < dec!(0.0001));
        assert!(s.rows.last().unwrap().balance_end.abs() <= BALANCE_EPSILON);
        assert_eq!(s.actual_months, n);
    }
}

#[test]
fn test_schedule_matches_closed_form_balance() {
    let loan = Loan::new("m", "Mortgage", dec!(150_000), dec!(6), 120);
    let s = build_amortization_schedule(&ScheduleParams::new(loan.principal, loan.apr, loan.months))
        .unwrap();
    for k in [1u32, 12, 60, 119] {
        let simulated = s.rows[(k - 1) as usize].balance_end;
        assert!((simulated - remaining_balance(&loan, k)).abs() < dec!(0.001));
    }
}

#[test]
fn test_schedule_totals_agree_with_summary() {
    let loan = Loan::new("p", "Personal", dec!(12_000), dec!(11), 24);
    let s = build_amortization_schedule(&ScheduleParams::new(loan.principal, loan.apr, loan.months))
        .unwrap();
    let summary = summarize_loan(&loan);
    assert_eq!(s.initial_payment, summary.monthly_payment);
    assert!((s.total_interest - summary.total_interest).abs() < dec!(0.01));
}

#[test]
fn test_prepayment_always_reduces_interest() {
    let base = ScheduleParams::new(dec!(100_000), dec!(12), 12);
    let baseline = build_amortization_schedule(&base).unwrap();
    for (amount, at) in [(dec!(20_000), 1u32), (dec!(1), 6), (dec!(50_000), 11), (dec!(5_000), 10)] {
        let params = base.clone().with_prepayment(Prepayment {
            amount,
            at_period: at,
            mode: PrepaymentMode::Reduce,
        });
        let s = build_amortization_schedule(&params).unwrap();
        assert!(
            s.total_interest < baseline.total_interest,
            "prepayment {amount} at {at} did not reduce interest"
        );
    }
}

#[test]
fn test_first_period_prepayment_row() {
    let params = ScheduleParams::new(dec!(100_000), dec!(12), 12).with_prepayment(Prepayment {
        amount: dec!(20_000),
        at_period: 1,
        mode: PrepaymentMode::Reduce,
    });
    let s = build_amortization_schedule(&params).unwrap();
    assert_eq!(s.rows[0].payment, dec!(20_000));
    assert_eq!(s.rows[0].interest_portion, Decimal::ZERO);
    assert_eq!(s.rows[0].principal_portion, dec!(20_000));
    assert_eq!(s.actual_months, 12);

    let impact = analyze_prepayment(&params).unwrap();
    assert!(impact.interest_saved > Decimal::ZERO);
}

#[test]
fn test_shorten_mode_is_unsupported() {
    let params = ScheduleParams::new(dec!(10_000), dec!(5), 12).with_prepayment(Prepayment {
        amount: dec!(1_000),
        at_period: 3,
        mode: PrepaymentMode::Shorten,
    });
    let err = build_amortization_schedule(&params).unwrap_err();
    assert!(matches!(err, LoanPlannerError::UnsupportedPrepaymentMode { .. }));
    assert_eq!(
        err.to_string(),
        "Unsupported prepayment mode: shorten is not implemented"
    );
}

#[test]
fn test_schedule_params_from_json() {
    let params: ScheduleParams = serde_json::from_str(
        r#"{
            "principal": "100000",
            "apr": "12",
            "periods": 12,
            "prepayment": {"amount": "20000", "at_period": 1},
            "first_payment_date": "2025-03-01"
        }"#,
    )
    .unwrap();
    assert_eq!(params.prepayment.unwrap().mode, PrepaymentMode::Reduce);
    let s = build_amortization_schedule(&params).unwrap();
    assert_eq!(s.rows[0].payment_date.unwrap().to_string(), "2025-03-01");
    assert_eq!(s.rows[11].payment_date.unwrap().to_string(), "2026-02-01");
}
