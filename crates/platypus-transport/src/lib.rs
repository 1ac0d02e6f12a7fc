//! Platypus Transport - request/response access to the registry
//!
//! The registry is only ever reached through the [`Transport`] trait. This
//! crate ships a reqwest-backed [`HttpTransport`]; tests and embedders can
//! supply their own implementation.

pub mod http;
pub mod transport;

pub use http::HttpTransport;
pub use transport::{Method, Params, Transport};
