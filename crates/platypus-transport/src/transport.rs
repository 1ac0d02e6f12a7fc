//! The transport seam between handles and the registry

use async_trait::async_trait;
use platypus_core::{Envelope, TransportError};

/// Form fields sent with a request
pub type Params<'a> = &'a [(&'a str, String)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs one request against the registry and decodes its envelope.
///
/// `path` is relative to the registry's base URL and always starts with `/`.
/// Implementations report only network and decoding failures; a
/// `status: false` envelope is a successful transport call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Params<'_>,
    ) -> Result<Envelope, TransportError>;

    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;
}
