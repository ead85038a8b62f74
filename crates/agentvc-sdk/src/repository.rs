use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentvc_crypto::{Identity, KeyStore};
use agentvc_diff::{diff_cards, CardDiff};
use agentvc_protocol::{LoginProof, RemoteBranch, VerifyResponse};
use agentvc_refs::{validate_branch_name, validate_remote_name, FsRefStore, RefStore};
use agentvc_store::{Commit, FsObjectStore, ObjectStore, StoreError, StoredObject};
use agentvc_sync::{verify_login_locally, BranchPush, CardRemote, HttpRemote, PushOutcome};
use agentvc_types::{AgentCard, AgentId, ObjectId, MAIN_BRANCH};

use crate::commit::{BranchStatus, LogEntry, Status};
use crate::config::{RemoteConfig, RepoConfig, DEFAULT_REMOTE};
use crate::error::{RepoError, RepoResult};
use crate::resolver::{PassThroughResolver, SkillResolver};

/// Metadata directory name under the repository root.
pub const METADATA_DIR: &str = ".agentvc";

/// Entries shown by `log` when no limit is given.
pub const DEFAULT_LOG_LIMIT: usize = 50;

const CONFIG_FILE: &str = "config.toml";
const KEYS_DIR: &str = "keys";
const OBJECTS_DIR: &str = "objects";
const INITIAL_MESSAGE: &str = "Initial commit";

/// A versioned agent card on disk.
///
/// ```text
/// <root>/agent-card.json       working document
/// <root>/.agentvc/objects/     card and commit objects
/// <root>/.agentvc/refs/        branches and remote-tracking refs
/// <root>/.agentvc/HEAD
/// <root>/.agentvc/keys/        the agent keypair
/// <root>/.agentvc/config.toml
/// ```
///
/// Only one process may write to a repository at a time.
pub struct Repository {
    root: PathBuf,
    dir: PathBuf,
    objects: FsObjectStore,
    refs: FsRefStore,
    identity: Arc<Identity>,
    config: RepoConfig,
    resolver: Box<dyn SkillResolver>,
}

impl Repository {
    /// Create a repository at `root`.
    ///
    /// Generates the agent keypair, adopts an existing `agent-card.json` (or
    /// writes a minimal one), stamps the public key into it and records the
    /// first commit on `main`.
    pub fn init(root: impl Into<PathBuf>) -> RepoResult<Self> {
        let root = root.into();
        let dir = root.join(METADATA_DIR);
        if dir.exists() {
            return Err(RepoError::AlreadyExists(dir.display().to_string()));
        }
        fs::create_dir_all(&root)?;

        let config = RepoConfig::default();
        let card_path = root.join(&config.card_file);
        let existing = read_card_file(&card_path)?;

        let objects = FsObjectStore::open(dir.join(OBJECTS_DIR))?;
        fs::create_dir_all(dir.join("refs").join("heads"))?;
        let identity = KeyStore::new(dir.join(KEYS_DIR)).generate()?;
        config.save(&dir.join(CONFIG_FILE))?;

        let repo = Self {
            refs: FsRefStore::new(&dir),
            root,
            dir,
            objects,
            identity: Arc::new(identity),
            config,
            resolver: Box::new(PassThroughResolver),
        };

        let card = existing.unwrap_or_else(|| AgentCard::new(default_card_name(&repo.root)));
        let card = repo.normalize(card, MAIN_BRANCH);
        repo.write_working(&card)?;
        let card_id = repo.objects.put_card(&card)?;
        let commit = Commit {
            card: card_id,
            parent: None,
            author: repo.author(),
            timestamp: now(),
            message: INITIAL_MESSAGE.to_string(),
        };
        let id = repo.objects.put_commit(&commit)?;
        repo.refs.set_head(MAIN_BRANCH)?;
        repo.refs.set_branch(MAIN_BRANCH, &id)?;

        tracing::info!(
            root = %repo.root.display(),
            agent_id = %repo.agent_id(),
            commit = %id.short_hex(),
            "initialized repository"
        );
        Ok(repo)
    }

    /// Open the repository rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> RepoResult<Self> {
        let root = root.into();
        let dir = root.join(METADATA_DIR);
        if !dir.is_dir() {
            return Err(RepoError::NotARepository(root));
        }
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            RepoConfig::load(&config_path)?
        } else {
            RepoConfig::default()
        };
        let identity = KeyStore::new(dir.join(KEYS_DIR)).load()?;
        Ok(Self {
            objects: FsObjectStore::open(dir.join(OBJECTS_DIR))?,
            refs: FsRefStore::new(&dir),
            root,
            dir,
            identity: Arc::new(identity),
            config,
            resolver: Box::new(PassThroughResolver),
        })
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn discover(start: &Path) -> RepoResult<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(METADATA_DIR).is_dir())
            .map(|root| Self::open(root))
            .unwrap_or_else(|| Err(RepoError::NotARepository(start.to_path_buf())))
    }

    /// Use `resolver` to expand skill pointers on commit.
    pub fn with_resolver(mut self, resolver: impl SkillResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    // ---- Accessors ----

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.dir
    }

    pub fn card_path(&self) -> PathBuf {
        self.root.join(&self.config.card_file)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn agent_id(&self) -> AgentId {
        self.identity.agent_id()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn current_branch(&self) -> RepoResult<String> {
        Ok(self.refs.head()?)
    }

    // ---- History ----

    /// Snapshot the working card on the current branch.
    ///
    /// Fails with [`RepoError::NoChanges`] if the resulting card is identical
    /// to the branch tip. The working file is rewritten in canonical form
    /// either way.
    pub fn commit(&self, message: &str) -> RepoResult<ObjectId> {
        let branch = self.refs.head()?;
        let tip = self.refs.get_branch(&branch)?;

        let card = self.resolver.resolve(self.read_working()?)?;
        let card = self.normalize(card, &branch);
        self.write_working(&card)?;

        let card_obj = StoredObject::from_card(&card)?;
        let card_id = card_obj.compute_id();
        if let Some(tip) = &tip {
            if self.objects.get_commit(tip)?.card == card_id {
                return Err(RepoError::NoChanges);
            }
        }

        self.objects.write(&card_obj)?;
        let commit = Commit {
            card: card_id,
            parent: tip,
            author: self.author(),
            timestamp: now(),
            message: message.to_string(),
        };
        let id = self.objects.put_commit(&commit)?;
        self.refs.set_branch(&branch, &id)?;

        tracing::info!(%branch, commit = %id.short_hex(), "committed");
        Ok(id)
    }

    /// Up to `limit` commits reachable from HEAD, newest first.
    ///
    /// A missing parent ends the walk early instead of failing.
    pub fn log(&self, limit: usize) -> RepoResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut next = Some(self.refs.resolve_head()?);
        while let Some(id) = next {
            if entries.len() >= limit {
                break;
            }
            let commit = match self.objects.get_commit(&id) {
                Ok(commit) => commit,
                Err(StoreError::NotFound(_)) => {
                    tracing::warn!(commit = %id, "history is broken: commit object missing");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            next = commit.parent;
            entries.push(LogEntry { id, commit });
        }
        Ok(entries)
    }

    /// Compare the HEAD snapshot with `target`.
    ///
    /// No target compares against the working card. Otherwise the target is
    /// tried as a branch name, then as a full commit digest.
    pub fn diff(&self, target: Option<&str>) -> RepoResult<CardDiff> {
        let branch = self.refs.head()?;
        let (head, other) = match target {
            None => self.head_and_working(&branch)?,
            Some(target) => (self.branch_card(&branch)?, self.resolve_target(target)?),
        };
        Ok(diff_cards(&head, &other)?)
    }

    fn resolve_target(&self, target: &str) -> RepoResult<AgentCard> {
        if validate_branch_name(target).is_ok() {
            if let Some(tip) = self.refs.get_branch(target)? {
                return self.card_at(&tip);
            }
        }
        if ObjectId::looks_like_digest(target) {
            let id = ObjectId::from_hex(target)?;
            return self.card_at(&id);
        }
        Err(RepoError::UnknownTarget(target.to_string()))
    }

    // ---- Branches ----

    /// All branches with their tips, sorted by name.
    pub fn list_branches(&self) -> RepoResult<Vec<(String, ObjectId)>> {
        Ok(self.refs.list_branches()?)
    }

    /// Create `name` at the current commit. HEAD does not move.
    pub fn create_branch(&self, name: &str) -> RepoResult<ObjectId> {
        validate_branch_name(name)?;
        if self.refs.get_branch(name)?.is_some() {
            return Err(RepoError::AlreadyExists(format!("branch {name}")));
        }
        let tip = self.refs.resolve_head()?;
        self.refs.set_branch(name, &tip)?;
        tracing::info!(branch = %name, at = %tip.short_hex(), "created branch");
        Ok(tip)
    }

    /// Delete a local branch. `main` and the current branch are refused.
    pub fn delete_branch(&self, name: &str) -> RepoResult<()> {
        if name == MAIN_BRANCH {
            return Err(RepoError::InvalidOperation(
                "the main branch cannot be deleted".into(),
            ));
        }
        if self.refs.head()? == name {
            return Err(RepoError::InvalidOperation(format!(
                "cannot delete the current branch {name}"
            )));
        }
        if !self.refs.delete_branch(name)? {
            return Err(RepoError::NotFound {
                kind: "branch",
                name: name.to_string(),
            });
        }
        tracing::info!(branch = %name, "deleted branch");
        Ok(())
    }

    /// Switch to `branch`, replacing the working card with its tip.
    pub fn checkout(&self, branch: &str) -> RepoResult<()> {
        let tip = self.refs.get_branch(branch)?.ok_or_else(|| RepoError::NotFound {
            kind: "branch",
            name: branch.to_string(),
        })?;
        let current = self.refs.head()?;
        if self.is_dirty(&current)? {
            return Err(RepoError::UncommittedChanges { branch: current });
        }
        let card = self.card_at(&tip)?;
        self.write_working(&card)?;
        self.refs.set_head(branch)?;
        tracing::info!(from = %current, to = %branch, "checked out branch");
        Ok(())
    }

    pub fn status(&self) -> RepoResult<Status> {
        let branch = self.refs.head()?;
        let (head, working) = self.head_and_working(&branch)?;
        let changes = diff_cards(&head, &working)?;
        let dirty = card_id(&head)? != card_id(&working)?;

        let remote = self.default_remote_name();
        let branches = self
            .refs
            .list_branches()?
            .into_iter()
            .map(|(name, tip)| {
                let ahead = self.ahead_count(remote, &name, &tip)?;
                Ok(BranchStatus {
                    current: name == branch,
                    name,
                    tip,
                    ahead,
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;

        Ok(Status {
            branch,
            agent_id: self.agent_id(),
            public_key: self.identity.public_key_field().to_string(),
            changes,
            dirty,
            branches,
        })
    }

    /// Commits on `branch` since the last push to `remote`, or the whole
    /// history if it was never pushed.
    pub fn ahead_count(&self, remote: &str, branch: &str, tip: &ObjectId) -> RepoResult<usize> {
        let pushed = self.refs.get_remote_ref(remote, branch)?;
        let mut count = 0;
        let mut next = Some(*tip);
        while let Some(id) = next {
            if Some(id) == pushed {
                break;
            }
            count += 1;
            next = match self.objects.get_commit(&id) {
                Ok(commit) => commit.parent,
                Err(StoreError::NotFound(_)) => {
                    tracing::warn!(%branch, commit = %id, "history is broken: commit object missing");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
        }
        Ok(count)
    }

    // ---- Remotes ----

    /// Register a remote in `config.toml`.
    pub fn add_remote(
        &mut self,
        name: &str,
        url: &str,
        card_url: Option<&str>,
    ) -> RepoResult<()> {
        validate_remote_name(name)?;
        if self.config.remotes.contains_key(name) {
            return Err(RepoError::AlreadyExists(format!("remote {name}")));
        }
        self.config.remotes.insert(
            name.to_string(),
            RemoteConfig {
                url: url.to_string(),
                card_url: card_url.map(str::to_string),
            },
        );
        self.config.save(&self.dir.join(CONFIG_FILE))?;
        Ok(())
    }

    /// HTTP client for a configured remote, acting as this agent.
    pub fn remote(&self, name: &str) -> RepoResult<HttpRemote> {
        let config = self.config.remote(name)?;
        Ok(HttpRemote::new(&config.url, Some(self.identity.clone()))?)
    }

    /// Card URL of `agent_id` on remote `name`.
    pub fn card_url(&self, name: &str, agent_id: &AgentId) -> RepoResult<String> {
        let config = self.config.remote(name)?;
        match &config.card_url {
            Some(url) if *agent_id == self.agent_id() => Ok(url.clone()),
            _ => Ok(self.remote(name)?.default_card_url(agent_id)?),
        }
    }

    /// Push to a configured remote: one branch, or all of them.
    pub async fn push(&self, remote: &str, branch: Option<&str>) -> RepoResult<Vec<PushOutcome>> {
        let client = self.remote(remote)?;
        self.push_to(remote, &client, branch).await
    }

    /// Push through an arbitrary [`CardRemote`], tracking results under
    /// `remote_name`.
    ///
    /// `main` goes first since the server pins the key from it. Successful
    /// branches advance their remote-tracking ref; failed ones are reported
    /// in the returned outcomes.
    pub async fn push_to<R: CardRemote + ?Sized>(
        &self,
        remote_name: &str,
        remote: &R,
        branch: Option<&str>,
    ) -> RepoResult<Vec<PushOutcome>> {
        validate_remote_name(remote_name)?;
        let pushes = self.branch_pushes(branch)?;
        let outcomes = remote.push_all(&pushes).await?;
        for outcome in outcomes.iter().filter(|o| o.success) {
            self.refs
                .set_remote_ref(remote_name, &outcome.branch, &outcome.commit)?;
        }
        Ok(outcomes)
    }

    fn branch_pushes(&self, only: Option<&str>) -> RepoResult<Vec<BranchPush>> {
        let mut branches = self.refs.list_branches()?;
        if let Some(name) = only {
            branches.retain(|(b, _)| b == name);
            if branches.is_empty() {
                return Err(RepoError::NotFound {
                    kind: "branch",
                    name: name.to_string(),
                });
            }
        }
        branches.sort_by_key(|(name, _)| (name != MAIN_BRANCH, name.clone()));
        branches
            .into_iter()
            .map(|(branch, commit)| {
                Ok(BranchPush {
                    card: self.card_at(&commit)?,
                    branch,
                    commit,
                })
            })
            .collect()
    }

    pub async fn remote_branches(&self, remote: &str) -> RepoResult<Vec<RemoteBranch>> {
        Ok(self.remote(remote)?.list_remote_branches().await?)
    }

    pub async fn delete_remote_branch(&self, remote: &str, branch: &str) -> RepoResult<()> {
        Ok(self.remote(remote)?.delete_remote_branch(branch).await?)
    }

    /// Fetch this agent's published card for `branch`.
    pub async fn fetch_card(&self, remote: &str, branch: &str) -> RepoResult<AgentCard> {
        let url = self.card_url(remote, &self.agent_id())?;
        Ok(self.remote(remote)?.fetch_branch_card(&url, branch).await?)
    }

    // ---- Login proofs ----

    /// Sign a login proof for `domain` at the current time.
    pub fn sign_login(&self, domain: &str) -> RepoResult<LoginProof> {
        Ok(LoginProof::sign(&self.identity, domain, now())?)
    }

    /// Check `proof` against the signer's public card on `remote`.
    pub async fn verify_login_local(
        &self,
        remote: &str,
        proof: &LoginProof,
        domain: &str,
    ) -> RepoResult<AgentCard> {
        let url = self.card_url(remote, &proof.agent_id)?;
        let client = self.remote(remote)?;
        Ok(verify_login_locally(&client, &url, proof, domain).await?)
    }

    /// Ask `remote` to verify `proof`, then check it was made for `domain`.
    pub async fn verify_login_remote(
        &self,
        remote: &str,
        proof: &LoginProof,
        domain: &str,
    ) -> RepoResult<VerifyResponse> {
        if proof.domain != domain {
            return Err(RepoError::Unverified(format!(
                "proof is for {}, not {domain}",
                proof.domain
            )));
        }
        Ok(self.remote(remote)?.verify_login(proof).await?)
    }

    // ---- Internals ----

    fn author(&self) -> String {
        self.config
            .author
            .clone()
            .unwrap_or_else(|| self.agent_id().to_string())
    }

    fn default_remote_name(&self) -> &str {
        if self.config.remotes.contains_key(DEFAULT_REMOTE) {
            return DEFAULT_REMOTE;
        }
        self.config
            .remotes
            .keys()
            .next()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Only `main` publishes the public key.
    fn normalize(&self, card: AgentCard, branch: &str) -> AgentCard {
        if branch == MAIN_BRANCH {
            card.with_public_key(self.identity.public_key_field())
        } else {
            card.without_public_key()
        }
    }

    fn read_working(&self) -> RepoResult<AgentCard> {
        let path = self.card_path();
        read_card_file(&path)?.ok_or_else(|| RepoError::NotFound {
            kind: "working card",
            name: path.display().to_string(),
        })
    }

    fn write_working(&self, card: &AgentCard) -> RepoResult<()> {
        fs::write(self.card_path(), card.to_canonical_bytes()?)?;
        Ok(())
    }

    fn card_at(&self, commit: &ObjectId) -> RepoResult<AgentCard> {
        let commit = self.objects.get_commit(commit)?;
        Ok(self.objects.get_card(&commit.card)?)
    }

    fn branch_card(&self, branch: &str) -> RepoResult<AgentCard> {
        let tip = self
            .refs
            .get_branch(branch)?
            .ok_or_else(|| RepoError::EmptyRepository(branch.to_string()))?;
        self.card_at(&tip)
    }

    /// Tip and working card of `branch`, both normalized for it. A branch
    /// created from `main` still holds main's snapshot, key included, until
    /// its first commit.
    fn head_and_working(&self, branch: &str) -> RepoResult<(AgentCard, AgentCard)> {
        let head = self.normalize(self.branch_card(branch)?, branch);
        let working = self.normalize(self.read_working()?, branch);
        Ok((head, working))
    }

    fn is_dirty(&self, branch: &str) -> RepoResult<bool> {
        let (head, working) = self.head_and_working(branch)?;
        Ok(card_id(&head)? != card_id(&working)?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("agent_id", &self.agent_id())
            .finish_non_exhaustive()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn card_id(card: &AgentCard) -> RepoResult<ObjectId> {
    Ok(StoredObject::from_card(card)?.compute_id())
}

fn read_card_file(path: &Path) -> RepoResult<Option<AgentCard>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(AgentCard::from_json(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn default_card_name(root: &Path) -> String {
    fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "agent".to_string())
}
