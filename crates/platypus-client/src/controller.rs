//! The Platypus controller: root handle for a registry endpoint

use platypus_core::{ClientRecord, Digest, PlatypusConfig, PlatypusError, Result, ServerRecord};
use platypus_transport::{http::DEFAULT_TIMEOUT, HttpTransport, Method, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::Client;
use crate::fanout::FanOut;
use crate::registry::{paths, Registry};
use crate::server::Server;

/// Root handle for a Platypus registry.
///
/// Holds no entity state: every listing or lookup re-fetches from the
/// registry and returns fresh snapshots.
#[derive(Debug, Clone)]
pub struct Platypus {
    host: String,
    port: u16,
    url: String,
    registry: Registry,
}

impl Platypus {
    /// Connect to the registry at `http://host:port` over HTTP
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::connect(host.into(), port, DEFAULT_TIMEOUT)
    }

    /// Build a controller from loaded configuration
    pub fn from_config(config: &PlatypusConfig) -> Result<Self> {
        let platypus = Self::connect(
            config.endpoint.host.clone(),
            config.endpoint.port,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(platypus
            .with_debug(config.debug)
            .with_fan_out(FanOut::from_config(&config.fan_out)))
    }

    fn connect(host: String, port: u16, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(endpoint_url(&host, port), timeout)?;
        Ok(Self::with_transport(host, port, Arc::new(transport)))
    }

    /// Use a caller-supplied transport for all registry traffic
    pub fn with_transport(
        host: impl Into<String>,
        port: u16,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let host = host.into();
        Self {
            url: endpoint_url(&host, port),
            host,
            port,
            registry: Registry::new(transport),
        }
    }

    /// Trace every request and response on the `platypus::wire` target
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.registry.set_debug(debug);
        self
    }

    /// Default dispatch policy for `system` on this controller and its servers
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.registry.set_fan_out(fan_out);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Register a new server and return its handle
    pub async fn create_server(&self, host: impl Into<String>, port: u16) -> Result<Server> {
        let mut server = Server::pending(self.registry.clone(), host.into(), port);
        server.create().await?;
        Ok(server)
    }

    pub async fn get_server(&self, digest: impl Into<Digest>) -> Result<Server> {
        let digest = digest.into();
        let envelope = self
            .registry
            .call(Method::Get, &paths::server(&digest), &[])
            .await?;
        if !envelope.status {
            return Err(PlatypusError::NotFound(digest));
        }

        let record: ServerRecord = envelope.decode("get server")?;
        Ok(Server::from_record(self.registry.clone(), digest, record))
    }

    /// All servers, in the registry's order
    pub async fn get_servers(&self) -> Result<Vec<Server>> {
        let records: Vec<(Digest, ServerRecord)> = self
            .registry
            .call(Method::Get, paths::SERVERS, &[])
            .await?
            .decode_keyed("list servers")?;

        Ok(records
            .into_iter()
            .map(|(digest, record)| Server::from_record(self.registry.clone(), digest, record))
            .collect())
    }

    pub async fn delete_server(&self, digest: impl Into<Digest>) -> Result<bool> {
        self.get_server(digest).await?.delete().await
    }

    pub async fn get_client(&self, digest: impl Into<Digest>) -> Result<Client> {
        let digest = digest.into();
        let envelope = self
            .registry
            .call(Method::Get, &paths::client(&digest), &[])
            .await?;
        if !envelope.status {
            return Err(PlatypusError::NotFound(digest));
        }

        let mut record: ClientRecord = envelope.decode("get client")?;
        let digest = record.hash.take().unwrap_or(digest);
        Ok(Client::from_record(self.registry.clone(), None, digest, record))
    }

    /// Every client across the fleet, in the registry's list order
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        let records: Vec<ClientRecord> = self
            .registry
            .call(Method::Get, paths::CLIENTS, &[])
            .await?
            .decode_list("list clients")?;

        records
            .into_iter()
            .map(|mut record| match record.hash.take() {
                Some(digest) => Ok(Client::from_record(
                    self.registry.clone(),
                    None,
                    digest,
                    record,
                )),
                None => Err(PlatypusError::registry(
                    "list clients",
                    serde_json::json!({"host": record.host, "port": record.port}),
                )),
            })
            .collect()
    }

    pub async fn delete_client(&self, digest: impl Into<Digest>) -> Result<bool> {
        self.get_client(digest).await?.delete().await
    }

    /// Run `cmd` on every client of every server.
    ///
    /// Servers are visited in listing order. The first failing client aborts
    /// the whole call; no later client or server is contacted.
    pub async fn system(&self, cmd: &str) -> Result<()> {
        let servers = self.get_servers().await?;
        info!(servers = servers.len(), "Dispatching command to fleet");

        for server in &servers {
            debug!(server = %server, "Dispatching to server");
            server.system(cmd).await?;
        }
        Ok(())
    }
}

fn endpoint_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

impl std::fmt::Display for Platypus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Platypus RESTful API EndPoint: {}", self.url)
    }
}
