//! Shared access to the registry carried by every handle

use platypus_core::{Envelope, Result};
use platypus_transport::{Method, Params, Transport};
use std::sync::Arc;
use tracing::debug;

use crate::fanout::FanOut;

/// Registry paths relative to the base URL
pub(crate) mod paths {
    use platypus_core::Digest;

    pub const SERVERS: &str = "/server";
    pub const CLIENTS: &str = "/client";

    pub fn server(digest: &Digest) -> String {
        format!("{}/{}", SERVERS, digest)
    }

    pub fn server_clients(digest: &Digest) -> String {
        format!("{}/{}/client", SERVERS, digest)
    }

    pub fn client(digest: &Digest) -> String {
        format!("{}/{}", CLIENTS, digest)
    }
}

/// Transport plus the controller settings handles inherit.
///
/// Cloned into every handle instead of pointing back at the controller.
#[derive(Clone)]
pub(crate) struct Registry {
    transport: Arc<dyn Transport>,
    debug: bool,
    fan_out: FanOut,
}

impl Registry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            debug: false,
            fan_out: FanOut::default(),
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_fan_out(&mut self, fan_out: FanOut) {
        self.fan_out = fan_out;
    }

    pub fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    pub async fn call(&self, method: Method, path: &str, params: Params<'_>) -> Result<Envelope> {
        if self.debug {
            debug!(
                target: "platypus::wire",
                method = %method,
                url = %format!("{}{}", self.transport.base_url(), path),
                params = ?params,
                "Registry request"
            );
        }

        let envelope = self.transport.request(method, path, params).await?;

        if self.debug {
            debug!(
                target: "platypus::wire",
                status = envelope.status,
                msg = %envelope.msg,
                "Registry response"
            );
        }

        Ok(envelope)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("base_url", &self.transport.base_url())
            .field("debug", &self.debug)
            .field("fan_out", &self.fan_out)
            .finish()
    }
}
