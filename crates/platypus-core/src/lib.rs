//! Platypus Core - Core types, registry records, and error taxonomy
//!
//! This crate provides the foundational types for the Platypus client:
//! - Digests identifying registry entities
//! - Server and client records as reported by the registry
//! - The `{status, msg}` response envelope and its validation
//! - Client configuration loading

pub mod config;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod record;

pub use config::{load_config, ConfigError, EndpointConfig, FanOutConfig, PlatypusConfig};
pub use digest::Digest;
pub use envelope::Envelope;
pub use error::{PlatypusError, Result, TransportError};
pub use record::{ClientRecord, ServerRecord};
