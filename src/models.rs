use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============ Domain Models ============

/// A validated, normalized mortgage quote request.
///
/// Only [`crate::mortgage::validate`] builds one of these from wire input, so every
/// instance already satisfies the field bounds and `down_payment <= loan_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MortgageRequest {
    /// Amount borrowed before the down payment, rounded to cents.
    pub loan_amount: f64,
    /// Up-front payment, rounded to cents. Zero when not supplied.
    pub down_payment: f64,
    /// Nominal annual interest rate in percent, rounded to 3 decimals.
    pub rate: f64,
    /// Loan duration in whole years.
    pub term: u32,
}

impl MortgageRequest {
    /// Amount financed (loan amount minus down payment).
    pub fn principal(&self) -> f64 {
        self.loan_amount - self.down_payment
    }

    /// Number of monthly installments over the whole term.
    pub fn number_of_payments(&self) -> u32 {
        self.term * 12
    }
}

/// Monthly payment returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MortgagePaymentResult {
    /// Fixed monthly installment. Never negative, never negative zero.
    pub payment: f64,
}

// ============ Wire Models ============

/// Request body accepted by `POST /api/mortgage`.
///
/// Documentation only: the handler validates the raw JSON so that numeric
/// strings, missing fields and unknown keys are handled field by field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MortgageInput {
    /// Loan amount as a number or numeric string.
    #[schema(value_type = f64, example = 300000)]
    pub loan_amount: serde_json::Value,
    /// Optional down payment; empty or null means zero.
    #[schema(value_type = Option<f64>, example = 60000)]
    pub down_payment: Option<serde_json::Value>,
    /// Annual interest rate in percent.
    #[schema(value_type = f64, example = 6)]
    pub rate: serde_json::Value,
    /// Term in whole years (1-50).
    #[schema(value_type = u32, example = 30)]
    pub term: serde_json::Value,
}

/// Generic JSON error body. Field-level detail is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
