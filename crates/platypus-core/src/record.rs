//! Server and client records as the registry reports them

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// A server entry: `{hash, host, port}`
///
/// `hash` is absent inside a listing keyed by digest, where the key is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Digest>,
    pub host: String,
    #[serde(with = "lenient_port")]
    pub port: u16,
}

/// A client entry: `{hash, host, port, python2, python3}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Digest>,
    pub host: String,
    #[serde(with = "lenient_port")]
    pub port: u16,
    pub python2: bool,
    pub python3: bool,
}

// The registry echoes form-encoded values, so ports arrive as numbers or strings
mod lenient_port {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    pub fn serialize<S>(port: &u16, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(*port)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u16, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Port::deserialize(deserializer)? {
            Port::Number(port) => Ok(port),
            Port::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid port {:?}", text))),
        }
    }
}
