use agentvc_types::{AgentCard, ObjectId};

use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same data always produces the
///   same ID, so a second write of existing content is a no-op.
/// - A reader never observes a partially written object.
/// - Reads verify the digest. Corruption is an error, never `Ok(None)`.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object that must exist.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Store a card snapshot under the digest of its canonical bytes.
    fn put_card(&self, card: &AgentCard) -> StoreResult<ObjectId> {
        self.write(&StoredObject::from_card(card)?)
    }

    /// Load a card snapshot.
    fn get_card(&self, id: &ObjectId) -> StoreResult<AgentCard> {
        let obj = self.get(id)?;
        if obj.kind != ObjectKind::Card {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: format!("expected card, got {}", obj.kind),
            });
        }
        obj.to_card()
    }

    /// Store a commit record.
    fn put_commit(&self, commit: &Commit) -> StoreResult<ObjectId> {
        self.write(&commit.to_stored_object()?)
    }

    /// Load a commit record.
    fn get_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        Commit::from_stored_object(&self.get(id)?)
    }
}
