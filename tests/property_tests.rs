/// Property-based tests using proptest
/// Tests invariants that should hold for all validated quotes
use mortgage_api::mortgage::{compute_monthly_payment, validate, DOWN_PAYMENT};
use proptest::prelude::*;
use serde_json::json;

// Property: Validation should never panic
proptest! {
    #[test]
    fn validation_never_panics(loan in "\\PC*", down in "\\PC*", rate in "\\PC*", term in "\\PC*") {
        let _ = validate(&json!({
            "loanAmount": loan,
            "downPayment": down,
            "rate": rate,
            "term": term
        }));
    }

    #[test]
    fn validation_never_panics_on_any_number(loan in any::<f64>(), rate in any::<f64>(), term in any::<f64>()) {
        let _ = validate(&json!({"loanAmount": loan, "rate": rate, "term": term}));
    }
}

// Property: Zero interest is straight-line repayment
proptest! {
    #[test]
    fn zero_rate_divides_principal_evenly(
        cents in 1u64..=100_000_000_000u64,
        term in 1u32..=50u32
    ) {
        let loan = cents as f64 / 100.0;
        let request = validate(&json!({"loanAmount": loan, "rate": 0, "term": term})).unwrap();
        let payment = compute_monthly_payment(&request).unwrap().payment;

        let expected = request.principal() / f64::from(term * 12);
        prop_assert!((payment - expected).abs() <= expected * 1e-12);
    }
}

// Property: Payments are never negative and never negative zero
proptest! {
    #[test]
    fn payment_is_non_negative(
        loan_cents in 1u64..=100_000_000_000u64,
        down_ratio in 0.0f64..=1.0f64,
        rate in 0.0f64..=100.0f64,
        term in 1u32..=50u32
    ) {
        let loan = loan_cents as f64 / 100.0;
        let down = (loan * down_ratio * 100.0).floor() / 100.0;
        let request = validate(&json!({
            "loanAmount": loan,
            "downPayment": down,
            "rate": rate,
            "term": term
        })).unwrap();

        let payment = compute_monthly_payment(&request).unwrap().payment;
        prop_assert!(payment.is_finite());
        prop_assert!(payment >= 0.0);
        prop_assert!(payment.is_sign_positive());
    }

    #[test]
    fn payment_is_deterministic(
        loan_cents in 1u64..=100_000_000_000u64,
        rate in 0.0f64..=100.0f64,
        term in 1u32..=50u32
    ) {
        let loan = loan_cents as f64 / 100.0;
        let request = validate(&json!({"loanAmount": loan, "rate": rate, "term": term})).unwrap();

        prop_assert_eq!(
            compute_monthly_payment(&request).unwrap(),
            compute_monthly_payment(&request).unwrap()
        );
    }

    #[test]
    fn payment_covers_principal(
        loan_cents in 100u64..=100_000_000_000u64,
        rate in 0.0f64..=100.0f64,
        term in 1u32..=50u32
    ) {
        let loan = loan_cents as f64 / 100.0;
        let request = validate(&json!({"loanAmount": loan, "rate": rate, "term": term})).unwrap();
        let payment = compute_monthly_payment(&request).unwrap().payment;

        // Total repaid is at least the amount borrowed
        let total = payment * f64::from(request.number_of_payments());
        prop_assert!(total >= request.principal() * (1.0 - 1e-9));
    }
}

// Property: Down payment above the loan amount is always rejected
proptest! {
    #[test]
    fn down_payment_above_loan_rejected(
        loan_cents in 1u64..=99_999_999_999u64,
        extra_cents in 1u64..=1_000_000u64,
        rate in -10.0f64..=200.0f64,
        term in -5i32..=80i32
    ) {
        let loan = loan_cents as f64 / 100.0;
        let down = (loan_cents + extra_cents) as f64 / 100.0;
        let err = validate(&json!({
            "loanAmount": loan,
            "downPayment": down,
            "rate": rate,
            "term": term
        })).unwrap_err();

        prop_assert!(err.has_issue_for(DOWN_PAYMENT));
    }
}

// Property: Normalized fields carry at most the allowed precision
proptest! {
    #[test]
    fn normalized_amounts_are_whole_cents(loan in 0.01f64..=1_000_000_000.0f64) {
        let request = validate(&json!({"loanAmount": loan, "rate": 5, "term": 10})).unwrap();
        let scaled = request.loan_amount * 100.0;

        prop_assert!((scaled - scaled.round()).abs() < 1e-3);
        prop_assert!((request.loan_amount - loan).abs() <= 0.005 + 1e-6);
    }
}
