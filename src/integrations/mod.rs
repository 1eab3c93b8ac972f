//! Outbound integration layer for calling third-party HTTP APIs.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`]) and reading responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`]) with a reqwest implementation ([`ReqwestClient`])
//! - Classifying remote failures ([`RemoteError`], [`RemoteErrorKind`])
//! - A uniform result envelope ([`ApiResponse`]) that replaces raw errors
//! - A configured API client ([`ApiClient`]) exposing `get`/`post`/`put`/`delete`
//! - Single-shot, cached integration calls ([`Integration`], [`OneShotCall`])

mod api;
mod call;
mod client;
mod error;
mod response;
mod transport;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod call_tests;

pub use api::{ApiClient, ClientConfig};
pub use call::{CallMethod, CallSpec, ConfiguredIntegration, Integration, OneShotCall};
pub use client::ReqwestClient;
pub use error::{DEFAULT_ERROR_STATUS, HttpError, RemoteError, RemoteErrorKind};
pub use response::{ApiResponse, ResponseBody};
pub use transport::{HttpClient, HttpRequest, HttpResponse};
