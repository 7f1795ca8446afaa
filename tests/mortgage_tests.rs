/// Scenario tests for the quote core
/// Runs wire-shaped input through validation and the payment formula
use mortgage_api::models::MortgageRequest;
use mortgage_api::mortgage::{compute_monthly_payment, validate, DOWN_PAYMENT, TERM};
use serde_json::{json, Value};

fn quote(input: Value) -> f64 {
    let request = validate(&input).expect("input should validate");
    compute_monthly_payment(&request)
        .expect("payment should compute")
        .payment
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_thirty_year_fixed() {
        let request = validate(&json!({
            "loanAmount": 300000,
            "downPayment": 60000,
            "rate": 6,
            "term": 30
        }))
        .unwrap();

        assert_eq!(request.principal(), 240_000.0);
        assert_eq!(request.number_of_payments(), 360);

        let payment = compute_monthly_payment(&request).unwrap().payment;
        assert_eq!(format!("{:.2}", payment), "1438.92");
    }

    #[test]
    fn test_zero_interest() {
        let payment = quote(json!({
            "loanAmount": 100000,
            "downPayment": 0,
            "rate": 0,
            "term": 10
        }));

        assert_eq!(payment, 100_000.0 / 120.0);
        assert_eq!(format!("{:.2}", payment), "833.33");
    }

    #[test]
    fn test_fully_paid_down() {
        let payment = quote(json!({
            "loanAmount": 50000,
            "downPayment": 50000,
            "rate": 5,
            "term": 15
        }));

        assert_eq!(payment, 0.0);
        assert!(payment.is_sign_positive());
    }

    #[test]
    fn test_quote_is_idempotent() {
        let request = validate(&json!({
            "loanAmount": "425000.99",
            "downPayment": "85000.5",
            "rate": "6.875",
            "term": "30"
        }))
        .unwrap();

        let first = compute_monthly_payment(&request).unwrap();
        let second = compute_monthly_payment(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_whitespace_down_payment_counts_as_absent() {
        let payment = quote(json!({
            "loanAmount": 12000,
            "downPayment": " \t ",
            "rate": 0,
            "term": 1
        }));

        assert_eq!(payment, 1000.0);
    }

    #[test]
    fn test_single_year_term() {
        let payment = quote(json!({"loanAmount": 12000, "rate": 0, "term": 1}));
        assert_eq!(payment, 1000.0);
    }
}

#[cfg(test)]
mod rejection_tests {
    use super::*;

    #[test]
    fn test_term_edges() {
        for term in [json!(0), json!(50.5), json!(51)] {
            let err = validate(&json!({"loanAmount": 1000, "rate": 5, "term": term})).unwrap_err();
            assert!(err.has_issue_for(TERM), "term {} accepted", term);
        }

        for term in [1, 50] {
            let request = validate(&json!({"loanAmount": 1000, "rate": 5, "term": term})).unwrap();
            assert_eq!(request.term, term);
        }
    }

    #[test]
    fn test_down_payment_over_loan_fails_even_with_other_errors() {
        let err = validate(&json!({
            "loanAmount": 1000,
            "downPayment": 1500,
            "rate": 500,
            "term": 99
        }))
        .unwrap_err();

        assert!(err.has_issue_for(DOWN_PAYMENT));
        assert_eq!(err.issues().len(), 3);
    }

    #[test]
    fn test_all_issues_reported_together() {
        let err = validate(&json!({
            "loanAmount": -1,
            "downPayment": "x",
            "rate": 101,
            "term": 2.5,
            "zip": "12345"
        }))
        .unwrap_err();

        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["loanAmount", "downPayment", "rate", "term", "zip"]);
    }

    #[test]
    fn test_values_are_not_clamped() {
        assert!(validate(&json!({"loanAmount": 1e12, "rate": 5, "term": 10})).is_err());
        assert!(validate(&json!({"loanAmount": 1000, "rate": 100.5, "term": 10})).is_err());
    }
}

#[cfg(test)]
mod rounding_tests {
    use super::*;

    #[test]
    fn test_money_rounds_to_cents() {
        let request =
            validate(&json!({"loanAmount": 100.005, "rate": 5.12345, "term": 10})).unwrap();

        assert_eq!(request.loan_amount, 100.01);
        assert_eq!(request.rate, 5.123);
    }

    #[test]
    fn test_rounding_applies_to_string_input() {
        let request = validate(&json!({
            "loanAmount": "2500.456",
            "downPayment": "0.004",
            "rate": "3.9999",
            "term": "20"
        }))
        .unwrap();

        assert_eq!(
            request,
            MortgageRequest {
                loan_amount: 2500.46,
                down_payment: 0.0,
                rate: 4.0,
                term: 20,
            }
        );
    }
}
