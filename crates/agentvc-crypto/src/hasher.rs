use agentvc_types::ObjectId;
use sha2::{Digest, Sha256};

/// Kind-framed SHA-256 content hasher.
///
/// Each hasher carries an object kind (`"card"`, `"commit"`) that is framed
/// into every digest as `"{kind} {len}\0{content}"`. A card and a commit with
/// identical bytes therefore never share an address.
pub struct ContentHasher {
    kind: &'static str,
}

impl ContentHasher {
    /// Hasher for card snapshots.
    pub const CARD: Self = Self { kind: "card" };
    /// Hasher for commit records.
    pub const COMMIT: Self = Self { kind: "commit" };

    /// Create a hasher for a custom kind.
    pub const fn new(kind: &'static str) -> Self {
        Self { kind }
    }

    /// The framed byte sequence whose digest addresses `content`.
    pub fn frame(&self, content: &[u8]) -> Vec<u8> {
        let header = format!("{} {}\0", self.kind, content.len());
        let mut framed = Vec::with_capacity(header.len() + content.len());
        framed.extend_from_slice(header.as_bytes());
        framed.extend_from_slice(content);
        framed
    }

    /// Hash `content` under this hasher's kind.
    pub fn hash(&self, content: &[u8]) -> ObjectId {
        let mut hasher = Sha256::new();
        hasher.update(self.kind.as_bytes());
        hasher.update(b" ");
        hasher.update(content.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(content);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Verify that content produces the expected object ID.
    pub fn verify(&self, content: &[u8], expected: &ObjectId) -> bool {
        self.hash(content) == *expected
    }

    /// The kind tag used by this hasher.
    pub fn kind(&self) -> &str {
        self.kind
    }
}

/// Plain SHA-256 of `data`, lowercase hex. Used for request body digests.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matches_framed_sha256() {
        let content = b"hello";
        let id = ContentHasher::CARD.hash(content);
        let expected: [u8; 32] = Sha256::digest(b"card 5\0hello").into();
        assert_eq!(id.as_bytes(), &expected);
    }

    #[test]
    fn frame_layout() {
        assert_eq!(ContentHasher::COMMIT.frame(b"ab"), b"commit 2\0ab".to_vec());
    }

    #[test]
    fn frame_and_hash_agree() {
        let content = b"{\"name\":\"x\"}";
        let framed = ContentHasher::CARD.frame(content);
        let direct: [u8; 32] = Sha256::digest(&framed).into();
        assert_eq!(ContentHasher::CARD.hash(content).as_bytes(), &direct);
    }

    #[test]
    fn kinds_are_separated() {
        let data = b"same content";
        assert_ne!(ContentHasher::CARD.hash(data), ContentHasher::COMMIT.hash(data));
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::CARD.hash(b"original");
        assert!(ContentHasher::CARD.verify(b"original", &id));
        assert!(!ContentHasher::CARD.verify(b"tampered", &id));
    }

    #[test]
    fn empty_content_has_known_digest() {
        let expected: [u8; 32] = Sha256::digest(b"card 0\0").into();
        assert_eq!(ContentHasher::CARD.hash(b"").as_bytes(), &expected);
    }

    #[test]
    fn sha256_hex_of_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    proptest! {
        #[test]
        fn hash_is_stable(content in proptest::collection::vec(any::<u8>(), 0..512)) {
            let a = ContentHasher::COMMIT.hash(&content);
            let b = ContentHasher::COMMIT.hash(&content);
            prop_assert_eq!(a, b);
        }
    }
}
