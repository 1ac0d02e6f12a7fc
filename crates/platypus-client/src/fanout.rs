//! Dispatch policy for sending one command to many clients

use platypus_core::{FanOutConfig, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::Client;

/// How a server's clients are contacted.
///
/// Both policies are fail-fast: the first client error is returned and no
/// further client is contacted. Servers are always visited one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOut {
    /// One client at a time, in listing order
    #[default]
    Sequential,
    /// Up to `limit` clients in flight; on the first error every in-flight
    /// request is aborted
    Concurrent { limit: usize },
}

impl FanOut {
    pub fn from_config(config: &FanOutConfig) -> Self {
        if config.concurrency > 1 {
            FanOut::Concurrent {
                limit: config.concurrency,
            }
        } else {
            FanOut::Sequential
        }
    }
}

pub(crate) async fn dispatch(clients: Vec<Client>, cmd: &str, fan_out: FanOut) -> Result<()> {
    match fan_out {
        FanOut::Sequential => dispatch_sequential(clients, cmd).await,
        FanOut::Concurrent { limit } => dispatch_concurrent(clients, cmd, limit.max(1)).await,
    }
}

async fn dispatch_sequential(clients: Vec<Client>, cmd: &str) -> Result<()> {
    for client in clients {
        match client.system(cmd).await {
            Ok(output) => {
                debug!(client = %client.digest(), output = %output, "Client command done")
            }
            Err(e) => {
                warn!(
                    client = %client.digest(),
                    error = %e,
                    "Client command failed, aborting fan-out"
                );
                return Err(e);
            }
        }
    }
    Ok(())
}

async fn dispatch_concurrent(clients: Vec<Client>, cmd: &str, limit: usize) -> Result<()> {
    let cmd: Arc<str> = Arc::from(cmd);
    let mut pending = clients.into_iter();
    let mut tasks = JoinSet::new();

    loop {
        while tasks.len() < limit {
            let Some(client) = pending.next() else { break };
            let cmd = cmd.clone();
            tasks.spawn(async move {
                let result = client.system(&cmd).await;
                (client, result)
            });
        }

        let Some(joined) = tasks.join_next().await else {
            return Ok(());
        };

        match joined {
            Ok((client, Ok(output))) => {
                debug!(client = %client.digest(), output = %output, "Client command done")
            }
            Ok((client, Err(e))) => {
                warn!(
                    client = %client.digest(),
                    in_flight = tasks.len(),
                    error = %e,
                    "Client command failed, aborting fan-out"
                );
                tasks.abort_all();
                return Err(e);
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            // Only reachable while the runtime is shutting down
            Err(e) => debug!(error = %e, "Dispatch task cancelled"),
        }
    }
}
