//! Trusted-server selection: which endpoint to try next and outcome feedback.
use reqwest::Url;
use std::sync::{Mutex, PoisonError};

/// Supplies candidate trusted servers and receives success/failure feedback.
///
/// Retry policy (rotation, backoff, blacklisting) lives entirely here; the
/// failover driver only loops until this returns `None`.
pub trait TrustedServers: Send + Sync {
    /// Next server to try. `previous_failed` asks for a different one than
    /// last time. `None` means there is nothing left to try.
    fn next_server(&self, previous_failed: bool) -> Option<Url>;

    /// True if the candidate set changed since the last successful sync,
    /// which makes the cached list stale.
    fn invalidated(&self) -> bool;

    /// Feedback about the server most recently returned.
    fn mark_outcome(&self, success: bool);
}

/// Fixed list of servers tried in order, rotating on failure.
///
/// A round starts at the last server that worked and gives up once every
/// entry has failed in a row.
pub struct ServerList {
    inner: Mutex<ListState>,
}

struct ListState {
    servers: Vec<Url>,
    current: usize,
    tried: usize,
    invalidated: bool,
}

impl ServerList {
    /// New selector over `servers`; starts invalidated so the first check syncs.
    pub fn new(servers: Vec<Url>) -> Self {
        Self {
            inner: Mutex::new(ListState {
                servers,
                current: 0,
                tried: 0,
                invalidated: true,
            }),
        }
    }

    /// Swap the candidate set and mark the cached list stale.
    pub fn set_servers(&self, servers: Vec<Url>) {
        let mut s = self.lock();
        s.servers = servers;
        s.current = 0;
        s.tried = 0;
        s.invalidated = true;
    }

    /// Current candidate set.
    pub fn servers(&self) -> Vec<Url> {
        self.lock().servers.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrustedServers for ServerList {
    fn next_server(&self, previous_failed: bool) -> Option<Url> {
        let mut s = self.lock();
        if s.servers.is_empty() {
            return None;
        }
        if previous_failed {
            if s.tried >= s.servers.len() {
                s.tried = 0;
                return None;
            }
            s.current = (s.current + 1) % s.servers.len();
        } else {
            s.current %= s.servers.len();
            s.tried = 0;
        }
        s.tried += 1;
        s.servers.get(s.current).cloned()
    }

    fn invalidated(&self) -> bool {
        self.lock().invalidated
    }

    fn mark_outcome(&self, success: bool) {
        if success {
            let mut s = self.lock();
            s.invalidated = false;
            s.tried = 0;
        }
    }
}
