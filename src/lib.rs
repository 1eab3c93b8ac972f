//! hookgate: verified webhook intake and third-party API calls
//!
//! A small integration backend with two halves:
//! - [`webhooks`]: receives HMAC-signed webhooks, verifies them, and records
//!   each delivery exactly once
//! - [`integrations`]: calls third-party HTTP APIs and folds every outcome
//!   into a uniform [`ApiResponse`](integrations::ApiResponse) envelope

pub mod config;
pub mod integrations;
pub mod server;
pub mod time;
pub mod webhooks;
