use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use agentvc_crypto::{SigningKey, VerifyingKey};
use agentvc_types::{AgentCard, AgentId};
use chrono::{DateTime, Utc};

use crate::config::ServerConfig;

/// A branch as last pushed.
#[derive(Clone, Debug)]
pub struct HostedBranch {
    pub card: AgentCard,
    pub commit_hash: String,
    pub pushed_at: DateTime<Utc>,
}

/// Everything the server knows about one agent.
#[derive(Clone, Debug)]
pub struct AgentRecord {
    /// Pinned on the first accepted write to `main`.
    pub key: VerifyingKey,
    pub public_key_field: String,
    pub branches: BTreeMap<String, HostedBranch>,
}

struct Inner {
    config: ServerConfig,
    server_key: SigningKey,
    agents: RwLock<HashMap<AgentId, AgentRecord>>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    /// Fresh state with a newly generated challenge-signing key.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                server_key: SigningKey::generate(),
                agents: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn server_key(&self) -> &SigningKey {
        &self.inner.server_key
    }

    pub fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    pub fn agent(&self, id: &AgentId) -> Option<AgentRecord> {
        self.inner
            .agents
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn pinned_key(&self, id: &AgentId) -> Option<VerifyingKey> {
        self.inner
            .agents
            .read()
            .expect("lock poisoned")
            .get(id)
            .map(|a| a.key.clone())
    }

    /// Pin `key` for `id` unless a key is already pinned. Returns the key in
    /// effect afterwards.
    pub fn pin_key(&self, id: AgentId, key: VerifyingKey) -> VerifyingKey {
        let mut agents = self.inner.agents.write().expect("lock poisoned");
        let record = agents.entry(id).or_insert_with(|| {
            tracing::info!(agent_id = %id, "pinned public key on first use");
            AgentRecord {
                public_key_field: key.to_field(),
                key,
                branches: BTreeMap::new(),
            }
        });
        record.key.clone()
    }

    /// Store a pushed branch. The agent must already be pinned.
    pub fn put_branch(&self, id: &AgentId, name: &str, branch: HostedBranch) -> bool {
        let mut agents = self.inner.agents.write().expect("lock poisoned");
        match agents.get_mut(id) {
            Some(record) => {
                record.branches.insert(name.to_string(), branch);
                true
            }
            None => false,
        }
    }

    pub fn remove_branch(&self, id: &AgentId, name: &str) -> bool {
        let mut agents = self.inner.agents.write().expect("lock poisoned");
        agents
            .get_mut(id)
            .is_some_and(|record| record.branches.remove(name).is_some())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let agents = self.inner.agents.read().map(|a| a.len()).unwrap_or(0);
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("agents", &agents)
            .finish_non_exhaustive()
    }
}
