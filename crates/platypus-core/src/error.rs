//! Error taxonomy shared by every Platypus crate

use serde_json::Value;
use thiserror::Error;

use crate::digest::Digest;

/// Network-level failure reaching the registry
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("Undecodable response from {url} (HTTP {code}): {message}")]
    Decode {
        url: String,
        code: u16,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum PlatypusError {
    /// The registry answered with `status: false` or a payload of the wrong shape
    #[error("Registry rejected {context}: {payload}")]
    Registry { context: String, payload: Value },
    #[error("Not found in registry: {0}")]
    NotFound(Digest),
    /// A handle was used in the wrong lifecycle state
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl PlatypusError {
    pub fn registry(context: impl Into<String>, payload: Value) -> Self {
        Self::Registry {
            context: context.into(),
            payload,
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Offending payload for registry failures
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Registry { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatypusError>;
