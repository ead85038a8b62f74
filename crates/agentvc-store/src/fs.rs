//! Filesystem object store.
//!
//! Objects live at `<root>/<first 2 hex>/<remaining 62 hex>`. The file
//! holds the framed bytes (`"{kind} {len}\0{content}"`) so the digest of the
//! file is the object's address.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use agentvc_types::ObjectId;
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Two-level, digest-partitioned object directory.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path at which `id` is (or would be) stored.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let framed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let obj = StoredObject::from_framed(id, &framed)?;
        let computed = obj.compute_id();
        if computed != *id {
            tracing::warn!(%id, %computed, "object failed digest verification");
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(obj))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.is_file() {
            return Ok(id);
        }
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "object path has no parent"))?;
        fs::create_dir_all(dir)?;

        // Stage in the same directory so the final rename is atomic.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&object.to_framed())?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {}
            // A concurrent writer stored identical content first.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.error.into()),
        }
        tracing::debug!(%id, kind = %object.kind, size = object.size, "stored object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Commit, ObjectKind};
    use agentvc_types::AgentCard;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    #[test]
    fn write_then_read() {
        let (_dir, store) = store();
        let obj = StoredObject::new(ObjectKind::Card, b"{\"name\":\"a\"}".to_vec());
        let id = store.write(&obj).unwrap();
        assert_eq!(id, obj.compute_id());
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn layout_is_two_level() {
        let (_dir, store) = store();
        let obj = StoredObject::new(ObjectKind::Commit, b"x".to_vec());
        let id = store.write(&obj).unwrap();
        let hex = id.to_hex();
        let path = store.root().join(&hex[..2]).join(&hex[2..]);
        assert!(path.is_file());
        assert_eq!(fs::read(path).unwrap(), b"commit 1\0x".to_vec());
    }

    #[test]
    fn rewrite_is_noop() {
        let (_dir, store) = store();
        let obj = StoredObject::new(ObjectKind::Card, b"same".to_vec());
        let a = store.write(&obj).unwrap();
        let path = store.object_path(&a);
        let first_bytes = fs::read(&path).unwrap();
        let first_modified = fs::metadata(&path).unwrap().modified().unwrap();

        let b = store.write(&obj).unwrap();
        assert_eq!(a, b);
        assert_eq!(fs::read(&path).unwrap(), first_bytes);
        assert_eq!(first_bytes, obj.to_framed());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), first_modified);
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(store.read(&a).unwrap(), Some(obj));
    }

    #[test]
    fn missing_object_reads_none() {
        let (_dir, store) = store();
        let id = ObjectId::from_hash([7; 32]);
        assert_eq!(store.read(&id).unwrap(), None);
        assert!(!store.exists(&id).unwrap());
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn tampered_object_is_hash_mismatch() {
        let (_dir, store) = store();
        let obj = StoredObject::new(ObjectKind::Card, b"original".to_vec());
        let id = store.write(&obj).unwrap();
        fs::write(store.object_path(&id), b"card 8\0tampered").unwrap();
        assert!(matches!(
            store.read(&id),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn truncated_object_is_corrupt() {
        let (_dir, store) = store();
        let obj = StoredObject::new(ObjectKind::Card, b"original".to_vec());
        let id = store.write(&obj).unwrap();
        fs::write(store.object_path(&id), b"card 8\0orig").unwrap();
        assert!(matches!(
            store.read(&id),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn card_and_commit_helpers() {
        let (_dir, store) = store();
        let card = AgentCard::new("Scout");
        let card_id = store.put_card(&card).unwrap();
        assert_eq!(store.get_card(&card_id).unwrap(), card);

        let commit = Commit {
            card: card_id,
            parent: None,
            author: "tester".into(),
            timestamp: 42,
            message: "init".into(),
        };
        let commit_id = store.put_commit(&commit).unwrap();
        assert_eq!(commit_id, commit.id().unwrap());
        assert_eq!(store.get_commit(&commit_id).unwrap(), commit);
        assert!(matches!(
            store.get_card(&commit_id),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn same_card_same_digest() {
        let (_dir, store) = store();
        let a = store.put_card(&AgentCard::new("Scout")).unwrap();
        let b = store.put_card(&AgentCard::new("Scout")).unwrap();
        assert_eq!(a, b);
    }
}
