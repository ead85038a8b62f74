//! On-disk storage for the agent keypair.
//!
//! Layout inside the key directory:
//!
//! - `ed25519.key` -- base64 of the 32-byte seed (owner-only on Unix)
//! - `ed25519.pub` -- canonical `"ed25519:<base64>"` field
//! - `agent_id`    -- derived identifier, for humans and scripts

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CryptoError, CryptoResult};
use crate::identity::Identity;
use crate::signer::{SigningKey, VerifyingKey};

const PRIVATE_KEY_FILE: &str = "ed25519.key";
const PUBLIC_KEY_FILE: &str = "ed25519.pub";
const AGENT_ID_FILE: &str = "agent_id";

/// File-backed keypair storage.
#[derive(Clone, Debug)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns `true` if a private key is present.
    pub fn exists(&self) -> bool {
        self.dir.join(PRIVATE_KEY_FILE).is_file()
    }

    /// Generate and persist a fresh keypair.
    ///
    /// Either every file is written or none is: on any write failure the
    /// files already written are removed before the error is returned.
    pub fn generate(&self) -> CryptoResult<Identity> {
        if self.exists() {
            return Err(CryptoError::IdentityExists(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir)?;

        let identity = Identity::generate();
        if let Err(e) = self.persist(&identity) {
            self.remove_files();
            return Err(e);
        }
        tracing::info!(agent_id = %identity.agent_id(), "generated new identity");
        Ok(identity)
    }

    /// Load the persisted identity.
    pub fn load(&self) -> CryptoResult<Identity> {
        let path = self.dir.join(PRIVATE_KEY_FILE);
        if !path.is_file() {
            return Err(CryptoError::NoIdentity(self.dir.clone()));
        }
        let encoded = fs::read_to_string(&path)?;
        let seed = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::CorruptKey(format!("private key: {e}")))?;
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| CryptoError::CorruptKey("private key must be 32 bytes".into()))?;
        let identity = Identity::from_signing_key(SigningKey::from_bytes(seed));

        if let Ok(stored) = self.load_public_key_field() {
            if stored != identity.public_key_field() {
                return Err(CryptoError::CorruptKey(
                    "public key does not match private key".into(),
                ));
            }
        }
        Ok(identity)
    }

    /// Load only the public-key field.
    pub fn load_public_key_field(&self) -> CryptoResult<String> {
        let path = self.dir.join(PUBLIC_KEY_FILE);
        if !path.is_file() {
            return Err(CryptoError::NoIdentity(self.dir.clone()));
        }
        let field = fs::read_to_string(path)?.trim().to_string();
        VerifyingKey::from_field(&field)?;
        Ok(field)
    }

    fn persist(&self, identity: &Identity) -> CryptoResult<()> {
        let seed = STANDARD.encode(identity.signing_key().as_bytes());
        write_private(&self.dir.join(PRIVATE_KEY_FILE), seed.as_bytes())?;
        fs::write(
            self.dir.join(PUBLIC_KEY_FILE),
            format!("{}\n", identity.public_key_field()),
        )?;
        fs::write(
            self.dir.join(AGENT_ID_FILE),
            format!("{}\n", identity.agent_id()),
        )?;
        Ok(())
    }

    fn remove_files(&self) {
        for name in [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE, AGENT_ID_FILE] {
            let _ = fs::remove_file(self.dir.join(name));
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    file.sync_all()
}
