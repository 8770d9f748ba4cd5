//! Retry a task against successive trusted servers until one succeeds.
use async_trait::async_trait;
use reqwest::Url;
use tracing::warn;

use crate::{
    error::{Error, Result},
    servers::TrustedServers,
};

/// One attempt of an operation against a single server.
#[async_trait]
pub trait ServerTask: Send {
    /// Value produced by a successful attempt.
    type Output: Send;

    /// Try the operation against `server`. Any error moves on to the next server.
    async fn run(&mut self, server: &Url) -> Result<Self::Output>;
}

/// Drive `task` over the servers handed out by `servers`.
///
/// With `mark_outcome` set, every failed attempt is reported as a failure
/// and the winning one as a success; speculative reads pass `false` so they
/// never touch a server's score. Termination is up to the selector: the loop
/// ends with [`Error::NoServersAvailable`] only when it returns `None`.
pub async fn run_all<T, S>(task: &mut T, servers: &S, mark_outcome: bool) -> Result<T::Output>
where
    T: ServerTask + ?Sized,
    S: TrustedServers + ?Sized,
{
    let mut failed = false;
    loop {
        if failed && mark_outcome {
            servers.mark_outcome(false);
        }

        let Some(server) = servers.next_server(failed) else {
            warn!("no more trusted servers to try");
            return Err(Error::NoServersAvailable);
        };

        match task.run(&server).await {
            Ok(out) => {
                if mark_outcome {
                    servers.mark_outcome(true);
                }
                return Ok(out);
            }
            Err(e) => {
                warn!(%server, error = %e, "trusted server attempt failed");
                failed = true;
            }
        }
    }
}
