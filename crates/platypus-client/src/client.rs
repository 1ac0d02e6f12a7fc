//! Client handles: remote execution agents attached to a server

use platypus_core::{ClientRecord, Digest, Result};
use platypus_transport::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::registry::{paths, Registry};

/// Snapshot of a client as last reported by the registry.
///
/// Clients are only ever discovered through listings, so a `Client` always
/// carries a digest. `delete` consumes the handle.
#[derive(Debug, Clone)]
pub struct Client {
    registry: Registry,
    /// Owning server, when the client was reached through it
    server: Option<Digest>,
    digest: Digest,
    host: String,
    port: u16,
    python2: bool,
    python3: bool,
}

impl Client {
    pub(crate) fn from_record(
        registry: Registry,
        server: Option<Digest>,
        digest: Digest,
        record: ClientRecord,
    ) -> Self {
        Self {
            registry,
            server,
            digest,
            host: record.host,
            port: record.port,
            python2: record.python2,
            python3: record.python3,
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn supports_python2(&self) -> bool {
        self.python2
    }

    pub fn supports_python3(&self) -> bool {
        self.python3
    }

    /// Digest of the server this client was listed under, if known
    pub fn server_digest(&self) -> Option<&Digest> {
        self.server.as_ref()
    }

    /// Remove the client from the registry
    pub async fn delete(self) -> Result<bool> {
        self.registry
            .call(Method::Delete, &paths::client(&self.digest), &[])
            .await?
            .into_msg("delete client")?;

        info!(digest = %self.digest, host = %self.host, "Deleted client");
        Ok(true)
    }

    /// Run `cmd` on the agent and return its `msg` payload untouched
    pub async fn system(&self, cmd: &str) -> Result<Value> {
        debug!(digest = %self.digest, host = %self.host, "Dispatching command to client");

        let params = [("cmd", cmd.to_string())];
        self.registry
            .call(Method::Post, &paths::client(&self.digest), &params)
            .await?
            .into_msg("client command")
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{}\nPython2: {}\nPython3: {}",
            self.digest, self.host, self.port, self.python2, self.python3
        )
    }
}
