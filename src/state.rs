use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::StoreError;
use crate::guard::fingerprint::ClientProfile;
use crate::guard::{FormGuard, FormSessions};
use crate::relay::Relay;
use crate::store::{KeyValueStore, ScopedStore};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub guard: FormGuard,
    /// Form sessions per client scope.
    pub sessions: DashMap<String, FormSessions>,
    pub store: Arc<dyn KeyValueStore>,
    pub relay: Option<Relay>,
    /// Profile reported by each client, keyed by client scope.
    pub profiles: DashMap<String, ClientProfile>,
    /// Held from validation until the submission is recorded, one per client scope.
    pub client_locks: DashMap<String, Arc<Mutex<()>>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub sessions: usize,
    pub profiles: usize,
    pub store_keys: usize,
}

impl AppState {
    pub fn client_lock(&self, client: &str) -> Arc<Mutex<()>> {
        self.client_locks
            .entry(client.to_string())
            .or_default()
            .clone()
    }

    /// Drop sessions past their TTL, profiles of clients with no live session, and
    /// durable keys that no longer affect any check. Clients mid-submission are
    /// skipped until the next pass.
    pub fn cleanup(&self) -> Result<CleanupReport, StoreError> {
        let mut report = CleanupReport::default();
        let cutoff = self.guard.session_cutoff();

        self.sessions.retain(|_, sessions| {
            report.sessions += sessions.prune(cutoff);
            !sessions.is_empty()
        });

        let profiles_before = self.profiles.len();
        self.profiles
            .retain(|client, _| self.sessions.contains_key(client));
        report.profiles = profiles_before - self.profiles.len();

        let scopes: BTreeSet<String> = self
            .store
            .keys("")?
            .iter()
            .filter_map(|key| key.rsplit_once('/'))
            .map(|(scope, _)| scope.to_string())
            .collect();

        for scope in scopes {
            let lock = self.client_lock(&scope);
            let Ok(_serial) = lock.try_lock() else {
                continue;
            };
            let store = ScopedStore::new(self.store.as_ref(), &scope);
            report.store_keys += self.guard.sweep_store(&store)?;
        }

        // Locks nobody else holds a handle to
        self.client_locks
            .retain(|_, lock| Arc::strong_count(lock) > 1);

        Ok(report)
    }
}
