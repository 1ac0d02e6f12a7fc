//! In-memory registry used by unit tests

use async_trait::async_trait;
use platypus_core::{Envelope, TransportError};
use platypus_transport::{Method, Params, Transport};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ServerEntry {
    digest: String,
    host: String,
    port: u16,
}

struct ClientEntry {
    digest: String,
    server: String,
    host: String,
    port: u16,
    python2: bool,
    python3: bool,
}

impl ClientEntry {
    fn record(&self) -> Value {
        json!({
            "hash": self.digest,
            "host": self.host,
            "port": self.port,
            "python2": self.python2,
            "python3": self.python3,
        })
    }
}

#[derive(Default)]
struct State {
    next_id: u32,
    servers: Vec<ServerEntry>,
    clients: Vec<ClientEntry>,
    outputs: HashMap<String, Value>,
    failing: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    unreachable: HashSet<String>,
    create_reply: Option<Envelope>,
    overrides: HashMap<String, Value>,
    calls: Vec<String>,
    commanded: Vec<String>,
}

/// What a routed request produced
struct Routed {
    envelope: Envelope,
    command: bool,
    delay: Option<Duration>,
    /// Connection drops before the envelope arrives
    dropped: bool,
}

impl Routed {
    fn plain(envelope: Envelope) -> Self {
        Self {
            envelope,
            command: false,
            delay: None,
            dropped: false,
        }
    }
}

impl State {
    fn next_digest(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:04}", prefix, self.next_id)
    }

    fn route(&mut self, method: Method, segments: &[&str], params: Params<'_>) -> Routed {
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };

        match (method, segments) {
            (Method::Get, ["server"]) => {
                let mut map = Map::new();
                for s in &self.servers {
                    map.insert(s.digest.clone(), json!({"host": s.host, "port": s.port}));
                }
                Routed::plain(Envelope::ok(Value::Object(map)))
            }
            (Method::Post, ["server"]) => {
                if let Some(reply) = self.create_reply.clone() {
                    return Routed::plain(reply);
                }
                let digest = self.next_digest("srv");
                let host = param("host");
                let port = param("port");
                self.servers.push(ServerEntry {
                    digest: digest.clone(),
                    host: host.clone(),
                    port: port.parse().unwrap_or_default(),
                });
                Routed::plain(Envelope::ok(json!({"hash": digest, "host": host, "port": port})))
            }
            (Method::Get, ["server", digest]) => Routed::plain(
                match self.servers.iter().find(|s| s.digest == *digest) {
                    Some(s) => {
                        Envelope::ok(json!({"hash": s.digest, "host": s.host, "port": s.port}))
                    }
                    None => Envelope::failure("server not found"),
                },
            ),
            (Method::Delete, ["server", digest]) => {
                let before = self.servers.len();
                self.servers.retain(|s| s.digest != *digest);
                if self.servers.len() == before {
                    return Routed::plain(Envelope::failure("server not found"));
                }
                self.clients.retain(|c| c.server != *digest);
                Routed::plain(Envelope::ok("deleted"))
            }
            (Method::Get, ["server", digest, "client"]) => {
                if !self.servers.iter().any(|s| s.digest == *digest) {
                    return Routed::plain(Envelope::failure("server not found"));
                }
                let mut map = Map::new();
                for c in self.clients.iter().filter(|c| c.server == *digest) {
                    map.insert(c.digest.clone(), c.record());
                }
                Routed::plain(Envelope::ok(Value::Object(map)))
            }
            (Method::Get, ["client"]) => Routed::plain(Envelope::ok(Value::Array(
                self.clients.iter().map(ClientEntry::record).collect(),
            ))),
            (Method::Get, ["client", digest]) => Routed::plain(
                match self.clients.iter().find(|c| c.digest == *digest) {
                    Some(c) => Envelope::ok(c.record()),
                    None => Envelope::failure("client not found"),
                },
            ),
            (Method::Delete, ["client", digest]) => {
                let before = self.clients.len();
                self.clients.retain(|c| c.digest != *digest);
                if self.clients.len() == before {
                    return Routed::plain(Envelope::failure("client not found"));
                }
                Routed::plain(Envelope::ok("deleted"))
            }
            (Method::Post, ["client", digest]) => {
                let digest = digest.to_string();
                self.commanded.push(digest.clone());
                let envelope = if let Some(msg) = self.failing.get(&digest) {
                    Envelope::failure(msg.clone())
                } else if let Some(output) = self.outputs.get(&digest) {
                    Envelope::ok(output.clone())
                } else if self.clients.iter().any(|c| c.digest == digest) {
                    Envelope::ok(format!("{}\n", param("cmd")))
                } else {
                    Envelope::failure("client not found")
                };
                Routed {
                    envelope,
                    command: true,
                    delay: self.delays.get(&digest).copied(),
                    dropped: self.unreachable.contains(&digest),
                }
            }
            _ => Routed::plain(Envelope::failure("unknown route")),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeRegistry {
    state: Mutex<State>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_server(&self, host: &str, port: u16) -> String {
        let mut state = self.state();
        let digest = state.next_digest("srv");
        state.servers.push(ServerEntry {
            digest: digest.clone(),
            host: host.to_string(),
            port,
        });
        digest
    }

    pub fn add_client(
        &self,
        server: &str,
        host: &str,
        port: u16,
        python2: bool,
        python3: bool,
    ) -> String {
        let mut state = self.state();
        let digest = state.next_digest("cli");
        state.clients.push(ClientEntry {
            digest: digest.clone(),
            server: server.to_string(),
            host: host.to_string(),
            port,
            python2,
            python3,
        });
        digest
    }

    pub fn set_output(&self, client: &str, output: Value) {
        self.state().outputs.insert(client.to_string(), output);
    }

    pub fn fail_client(&self, client: &str, msg: &str) {
        self.state().failing.insert(client.to_string(), msg.to_string());
    }

    pub fn delay_client(&self, client: &str, delay: Duration) {
        self.state().delays.insert(client.to_string(), delay);
    }

    /// Commands to `client` fail at the network level
    pub fn drop_connections_to(&self, client: &str) {
        self.state().unreachable.insert(client.to_string());
    }

    pub fn reject_creates(&self, msg: &str) {
        self.state().create_reply = Some(Envelope::failure(msg));
    }

    pub fn answer_creates_with(&self, msg: Value) {
        self.state().create_reply = Some(Envelope::ok(msg));
    }

    /// Answer `"<METHOD> <path>"` with a raw envelope
    pub fn override_response(&self, call: &str, envelope: Value) {
        self.state().overrides.insert(call.to_string(), envelope);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn commanded_clients(&self) -> Vec<String> {
        self.state().commanded.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeRegistry {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Params<'_>,
    ) -> Result<Envelope, TransportError> {
        let key = format!("{} {}", method, path);
        let routed = {
            let mut state = self.state();
            let mut line = key.clone();
            for (name, value) in params {
                line.push_str(&format!(" {}={}", name, value));
            }
            state.calls.push(line);

            match state.overrides.get(&key).cloned() {
                Some(raw) => Routed::plain(serde_json::from_value(raw).map_err(|e| {
                    TransportError::Decode {
                        url: key.clone(),
                        code: 200,
                        message: e.to_string(),
                    }
                })?),
                None => {
                    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
                    state.route(method, &segments, params)
                }
            }
        };

        if routed.command {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            match routed.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => tokio::task::yield_now().await,
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        if routed.dropped {
            return Err(TransportError::Http {
                url: format!("{}{}", self.base_url(), path),
                message: "connection reset by peer".to_string(),
            });
        }

        Ok(routed.envelope)
    }

    fn base_url(&self) -> &str {
        "http://fake-registry"
    }
}
