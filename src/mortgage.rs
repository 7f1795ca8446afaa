//! Mortgage quote core: input validation/normalization and the fixed-rate
//! payment formula.
//!
//! Everything here is pure and synchronous. Nothing in this module logs or
//! performs I/O; callers decide how to surface [`ValidationError`] and
//! [`ComputationError`].

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use crate::models::{MortgagePaymentResult, MortgageRequest};

pub const LOAN_AMOUNT: &str = "loanAmount";
pub const DOWN_PAYMENT: &str = "downPayment";
pub const RATE: &str = "rate";
pub const TERM: &str = "term";

const KNOWN_FIELDS: [&str; 4] = [LOAN_AMOUNT, DOWN_PAYMENT, RATE, TERM];

/// Upper bound for both monetary fields.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;
/// Smallest accepted loan amount (one cent).
pub const MIN_LOAN_AMOUNT: f64 = 0.01;
pub const MAX_RATE_PERCENT: f64 = 100.0;
pub const MIN_TERM_YEARS: u32 = 1;
pub const MAX_TERM_YEARS: u32 = 50;

/// A single problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Wire name of the offending field. Empty when the problem is the body itself.
    pub field: String,
    pub message: String,
}

/// Validation failure carrying every field issue found in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    fn push(&mut self, field: &str, message: &str) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// All issues in the order they were found.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns true if at least one issue was reported against `field`.
    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid mortgage input")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            if issue.field.is_empty() {
                write!(f, "{}{}", sep, issue.message)?;
            } else {
                write!(f, "{}{}: {}", sep, issue.field, issue.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The payment formula produced something that is not a valid amount.
///
/// Unreachable for validated input; surfaced as an internal fault if it ever happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationError {
    NonFinitePayment {
        principal: f64,
        monthly_rate: f64,
        number_of_payments: u32,
    },
    NegativePayment(f64),
}

impl fmt::Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationError::NonFinitePayment {
                principal,
                monthly_rate,
                number_of_payments,
            } => write!(
                f,
                "payment is not finite (principal={}, monthly_rate={}, payments={})",
                principal, monthly_rate, number_of_payments
            ),
            ComputationError::NegativePayment(payment) => {
                write!(f, "payment is negative: {}", payment)
            }
        }
    }
}

impl std::error::Error for ComputationError {}

/// Rounds `value` to `decimals` places as `round(value * 10^d) / 10^d`.
///
/// `f64::round` rounds half away from zero. The scaling happens in binary
/// floating point, so the outcome follows the scaled binary value:
/// `100.005` becomes `100.01` while `1.005` (stored as `1.00499…`) becomes `1.0`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
    })
}

/// Coerces a raw wire value into a finite number.
fn coerce_number(value: Option<&Value>) -> Result<f64, &'static str> {
    match value {
        None | Some(Value::Null) => Err("Required"),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or("Expected a number"),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err("Required");
            }
            if !decimal_pattern().is_match(trimmed) {
                return Err("Expected a number");
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or("Expected a number")
        }
        Some(_) => Err("Expected a number"),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_loan_amount(value: Option<&Value>) -> Result<f64, &'static str> {
    let amount = coerce_number(value)?;
    if amount < MIN_LOAN_AMOUNT {
        return Err("Loan amount must be a positive number");
    }
    if amount > MAX_AMOUNT {
        return Err("Value is too high");
    }
    Ok(round_to(amount, 2))
}

fn parse_down_payment(value: Option<&Value>) -> Result<f64, &'static str> {
    if is_blank(value) {
        return Ok(0.0);
    }
    let amount = coerce_number(value)?;
    if amount < 0.0 {
        return Err("Must be zero or positive");
    }
    if amount > MAX_AMOUNT {
        return Err("Value is too high");
    }
    Ok(round_to(amount, 2))
}

fn parse_rate(value: Option<&Value>) -> Result<f64, &'static str> {
    let rate = coerce_number(value)?;
    if rate < 0.0 {
        return Err("Interest rate must be zero or positive");
    }
    if rate > MAX_RATE_PERCENT {
        return Err("Interest rate is too high");
    }
    Ok(round_to(rate, 3))
}

fn parse_term(value: Option<&Value>) -> Result<u32, &'static str> {
    let term = coerce_number(value)?;
    if term.fract() != 0.0 {
        return Err("Term must be a whole number");
    }
    if term < f64::from(MIN_TERM_YEARS) {
        return Err("Term must be at least 1 year");
    }
    if term > f64::from(MAX_TERM_YEARS) {
        return Err("Term is too high");
    }
    Ok(term as u32)
}

/// Validates and normalizes a raw JSON body into a [`MortgageRequest`].
///
/// Every field is checked and all problems are reported together. Unknown keys
/// are rejected. Out-of-range values are rejected, never clamped.
///
/// # Arguments
///
/// * `raw` - The decoded request body. Anything other than a JSON object fails.
///
/// # Returns
///
/// * `Result<MortgageRequest, ValidationError>` - The normalized request or every issue found.
pub fn validate(raw: &Value) -> Result<MortgageRequest, ValidationError> {
    let mut errors = ValidationError::default();

    let Some(fields) = raw.as_object() else {
        errors.push("", "Expected an object");
        return Err(errors);
    };

    let mut check = |field: &str, result: Result<f64, &'static str>| match result {
        Ok(v) => Some(v),
        Err(message) => {
            errors.push(field, message);
            None
        }
    };

    let loan_amount = check(LOAN_AMOUNT, parse_loan_amount(fields.get(LOAN_AMOUNT)));
    let down_payment = check(DOWN_PAYMENT, parse_down_payment(fields.get(DOWN_PAYMENT)));
    let rate = check(RATE, parse_rate(fields.get(RATE)));

    let term = match parse_term(fields.get(TERM)) {
        Ok(term) => Some(term),
        Err(message) => {
            errors.push(TERM, message);
            None
        }
    };

    for key in fields.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            errors.push(key, "Unrecognized key");
        }
    }

    if let (Some(loan), Some(down)) = (loan_amount, down_payment) {
        if down > loan {
            errors.push(DOWN_PAYMENT, "Down payment cannot exceed loan amount");
        }
    }

    match (loan_amount, down_payment, rate, term) {
        (Some(loan_amount), Some(down_payment), Some(rate), Some(term)) if errors.is_empty() => {
            Ok(MortgageRequest {
                loan_amount,
                down_payment,
                rate,
                term,
            })
        }
        _ => Err(errors),
    }
}

/// Computes the fixed monthly payment for a validated request.
///
/// Uses the standard annuity formula `P * r / (1 - (1 + r)^-n)` with a monthly
/// rate `r = rate / 100 / 12` and `n = term * 12` payments. A zero rate falls
/// back to straight-line repayment `P / n`. Negative zero is returned as zero.
pub fn compute_monthly_payment(
    request: &MortgageRequest,
) -> Result<MortgagePaymentResult, ComputationError> {
    let principal = request.principal();
    let monthly_rate = request.rate / 100.0 / 12.0;
    let number_of_payments = request.number_of_payments();
    let n = f64::from(number_of_payments);

    let payment = if monthly_rate == 0.0 {
        principal / n
    } else {
        principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-n))
    };

    if !payment.is_finite() {
        return Err(ComputationError::NonFinitePayment {
            principal,
            monthly_rate,
            number_of_payments,
        });
    }
    if payment < 0.0 {
        return Err(ComputationError::NegativePayment(payment));
    }

    // -0.0 == 0.0, so this also drops the sign bit
    let payment = if payment == 0.0 { 0.0 } else { payment };

    Ok(MortgagePaymentResult { payment })
}
