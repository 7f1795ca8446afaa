//! Command-line quote using the same validation and formula as the API.
//!
//! Usage: `mortgage_quote <loanAmount> <downPayment> <rate> <term>`

use anyhow::Context;
use serde_json::{Map, Value};
use std::env;

use mortgage_api::mortgage::{self, DOWN_PAYMENT, LOAN_AMOUNT, RATE, TERM};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 4 {
        anyhow::bail!("Usage: mortgage_quote <loanAmount> <downPayment> <rate> <term>");
    }

    let mut fields = Map::new();
    for (name, value) in [LOAN_AMOUNT, DOWN_PAYMENT, RATE, TERM].iter().zip(args) {
        fields.insert(name.to_string(), Value::String(value));
    }

    let request = match mortgage::validate(&Value::Object(fields)) {
        Ok(request) => request,
        Err(e) => {
            for issue in e.issues() {
                eprintln!("  - {}: {}", issue.field, issue.message);
            }
            anyhow::bail!("Invalid input");
        }
    };

    let result =
        mortgage::compute_monthly_payment(&request).context("Failed to compute payment")?;

    println!("Principal:       ${:.2}", request.principal());
    println!("Payments:        {}", request.number_of_payments());
    println!("Monthly payment: ${:.2}", result.payment);

    Ok(())
}
