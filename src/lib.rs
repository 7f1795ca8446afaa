//! Mortgage Payment API Library
//!
//! Validates mortgage quote input, computes the fixed monthly payment, and
//! serves it over HTTP behind a per-client sliding-window rate limiter.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Request/response data models.
//! - `mortgage`: Input validation and the payment formula.
//! - `rate_limiter`: Sliding-window rate limiting.
//! - `routes`: Router, middleware and static pages.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod mortgage;
pub mod rate_limiter;
pub mod routes;
