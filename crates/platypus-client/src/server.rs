//! Server handles: hosts that own a set of clients

use platypus_core::{ClientRecord, Digest, PlatypusError, Result, ServerRecord};
use platypus_transport::Method;
use tracing::{debug, info};

use crate::client::Client;
use crate::fanout::{self, FanOut};
use crate::registry::{paths, Registry};

/// A server handle.
///
/// Either a pending creation request (no digest yet) or a snapshot of an
/// existing registry entry. `create` moves the former into the latter and
/// `delete` consumes the handle.
#[derive(Debug, Clone)]
pub struct Server {
    registry: Registry,
    digest: Option<Digest>,
    host: String,
    port: u16,
}

impl Server {
    pub(crate) fn pending(registry: Registry, host: String, port: u16) -> Self {
        Self {
            registry,
            digest: None,
            host,
            port,
        }
    }

    pub(crate) fn from_record(registry: Registry, digest: Digest, record: ServerRecord) -> Self {
        Self {
            registry,
            digest: Some(digest),
            host: record.host,
            port: record.port,
        }
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn require_digest(&self, operation: &str) -> Result<&Digest> {
        self.digest.as_ref().ok_or_else(|| {
            PlatypusError::precondition(format!(
                "cannot {} server {}:{} before it is created",
                operation, self.host, self.port
            ))
        })
    }

    /// Register this server; the digest is assigned from the registry's reply
    pub async fn create(&mut self) -> Result<()> {
        if let Some(digest) = &self.digest {
            return Err(PlatypusError::precondition(format!(
                "server {} already exists",
                digest
            )));
        }

        let params = [("host", self.host.clone()), ("port", self.port.to_string())];
        let record: ServerRecord = self
            .registry
            .call(Method::Post, paths::SERVERS, &params)
            .await?
            .decode("create server")?;

        let digest = match record.hash {
            Some(digest) if !digest.is_empty() => digest,
            _ => {
                return Err(PlatypusError::registry(
                    "create server",
                    serde_json::json!({"host": record.host, "port": record.port}),
                ))
            }
        };

        info!(digest = %digest, host = %self.host, port = self.port, "Created server");
        self.digest = Some(digest);
        Ok(())
    }

    /// Remove the server from the registry
    pub async fn delete(self) -> Result<bool> {
        let digest = self.require_digest("delete")?;
        self.registry
            .call(Method::Delete, &paths::server(digest), &[])
            .await?
            .into_msg("delete server")?;

        info!(digest = %digest, host = %self.host, "Deleted server");
        Ok(true)
    }

    /// Fetch this server's clients as fresh snapshots
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        let digest = self.require_digest("list clients of")?;
        let records: Vec<(Digest, ClientRecord)> = self
            .registry
            .call(Method::Get, &paths::server_clients(digest), &[])
            .await?
            .decode_keyed("list server clients")?;

        Ok(records
            .into_iter()
            .map(|(client, record)| {
                Client::from_record(self.registry.clone(), Some(digest.clone()), client, record)
            })
            .collect())
    }

    /// Run `cmd` on every client of this server, stopping at the first failure
    pub async fn system(&self, cmd: &str) -> Result<()> {
        self.system_with(cmd, self.registry.fan_out()).await
    }

    /// Like [`Server::system`] with an explicit dispatch policy
    pub async fn system_with(&self, cmd: &str, fan_out: FanOut) -> Result<()> {
        let digest = self.require_digest("dispatch to")?;
        let clients = self.get_clients().await?;
        debug!(server = %digest, clients = clients.len(), ?fan_out, "Fanning out command");
        fanout::dispatch(clients, cmd, fan_out).await
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.digest {
            Some(digest) => write!(f, "[{}] {}:{}", digest, self.host, self.port),
            None => write!(f, "[None] {}:{}", self.host, self.port),
        }
    }
}
