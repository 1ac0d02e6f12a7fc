//! The `{status, msg}` envelope every registry endpoint answers with

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::Digest;
use crate::error::{PlatypusError, Result};

/// Decoded registry response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub msg: Value,
}

impl Envelope {
    pub fn ok(msg: impl Into<Value>) -> Self {
        Self {
            status: true,
            msg: msg.into(),
        }
    }

    pub fn failure(msg: impl Into<Value>) -> Self {
        Self {
            status: false,
            msg: msg.into(),
        }
    }

    /// Check `status` and hand back the raw payload
    pub fn into_msg(self, context: &str) -> Result<Value> {
        if !self.status {
            return Err(PlatypusError::registry(context, self.msg));
        }
        Ok(self.msg)
    }

    /// Check `status` and decode the payload as a single record
    pub fn decode<T: DeserializeOwned>(self, context: &str) -> Result<T> {
        let msg = self.into_msg(context)?;
        decode_value(msg, context)
    }

    /// Check `status` and decode a listing keyed by digest.
    ///
    /// Pairs come back in the registry's key order.
    pub fn decode_keyed<T: DeserializeOwned>(self, context: &str) -> Result<Vec<(Digest, T)>> {
        match self.into_msg(context)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(digest, record)| Ok((Digest(digest), decode_value(record, context)?)))
                .collect(),
            other => Err(PlatypusError::registry(context, other)),
        }
    }

    /// Check `status` and decode a plain list of records
    pub fn decode_list<T: DeserializeOwned>(self, context: &str) -> Result<Vec<T>> {
        match self.into_msg(context)? {
            Value::Array(items) => items
                .into_iter()
                .map(|record| decode_value(record, context))
                .collect(),
            other => Err(PlatypusError::registry(context, other)),
        }
    }
}

fn decode_value<T: DeserializeOwned>(value: Value, context: &str) -> Result<T> {
    // Keep a copy so a malformed record can be reported verbatim
    serde_json::from_value(value.clone()).map_err(|_| PlatypusError::registry(context, value))
}
