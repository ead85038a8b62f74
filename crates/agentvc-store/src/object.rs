use std::fmt::Write as _;
use std::str::FromStr;

use agentvc_crypto::ContentHasher;
use agentvc_types::{AgentCard, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Version line written at the top of every commit record.
pub const COMMIT_FORMAT_VERSION: u32 = 1;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Canonical JSON of an agent card.
    Card,
    /// Commit record.
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Commit => "commit",
        }
    }

    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Card => &ContentHasher::CARD,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "commit" => Ok(Self::Commit),
            other => Err(format!("unknown object kind: {other}")),
        }
    }
}

/// A stored object: kind tag + content bytes + cached size.
///
/// The store never interprets the content; it only frames and hashes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Content-addressed ID: SHA-256 of `"{kind} {len}\0{data}"`.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// The framed bytes, as persisted on disk.
    pub fn to_framed(&self) -> Vec<u8> {
        self.kind.hasher().frame(&self.data)
    }

    /// Parse framed bytes back into an object.
    ///
    /// `id` is only used for error reporting; digest verification is the
    /// caller's job.
    pub fn from_framed(id: &ObjectId, framed: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::CorruptObject { id: *id, reason };

        let nul = framed
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator".into()))?;
        let header = std::str::from_utf8(&framed[..nul])
            .map_err(|_| corrupt("header is not UTF-8".into()))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt(format!("malformed header: {header:?}")))?;
        let kind = kind.parse::<ObjectKind>().map_err(corrupt)?;
        let len: usize = len
            .parse()
            .map_err(|_| corrupt(format!("bad length in header: {len:?}")))?;

        let data = &framed[nul + 1..];
        if data.len() != len {
            return Err(corrupt(format!(
                "header declares {len} bytes, found {}",
                data.len()
            )));
        }
        Ok(Self::new(kind, data.to_vec()))
    }

    /// Wrap a card's canonical bytes.
    pub fn from_card(card: &AgentCard) -> StoreResult<Self> {
        let data = card
            .to_canonical_bytes()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::new(ObjectKind::Card, data))
    }

    /// Decode a card object.
    pub fn to_card(&self) -> StoreResult<AgentCard> {
        if self.kind != ObjectKind::Card {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected card, got {}", self.kind),
            });
        }
        AgentCard::from_slice(&self.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit record.
///
/// The digest is a pure function of these five fields: nothing else is
/// serialized and nothing here is generated at encode time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Digest of the card snapshot.
    pub card: ObjectId,
    /// Previous commit, `None` only for the first commit of a history.
    pub parent: Option<ObjectId>,
    pub author: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub message: String,
}

impl Commit {
    /// Serialize into the versioned line format:
    ///
    /// ```text
    /// version 1
    /// card <digest>
    /// parent <digest>|none
    /// author <label>
    /// timestamp <seconds>
    ///
    /// <message>
    /// ```
    pub fn encode(&self) -> StoreResult<String> {
        if self.author.contains('\n') || self.author.contains('\r') {
            return Err(StoreError::MalformedCommit(
                "author must be a single line".into(),
            ));
        }
        let parent = self
            .parent
            .map(|p| p.to_hex())
            .unwrap_or_else(|| "none".to_string());

        let mut out = String::with_capacity(200 + self.message.len());
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "version {COMMIT_FORMAT_VERSION}\ncard {}\nparent {parent}\nauthor {}\ntimestamp {}\n\n{}",
            self.card, self.author, self.timestamp, self.message
        );
        Ok(out)
    }

    /// Parse the versioned line format. Any deviation is an error.
    pub fn decode(text: &str) -> StoreResult<Self> {
        let malformed = |reason: &str| StoreError::MalformedCommit(reason.to_string());

        let (header, message) = text
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing blank line before message"))?;
        let mut lines = header.split('\n');

        let version = header_field(&mut lines, "version")?;
        if version != COMMIT_FORMAT_VERSION.to_string() {
            return Err(malformed(&format!("unsupported version {version}")));
        }
        let card = ObjectId::from_hex(header_field(&mut lines, "card")?)
            .map_err(|e| malformed(&format!("card: {e}")))?;
        let parent = match header_field(&mut lines, "parent")? {
            "none" => None,
            hex => Some(ObjectId::from_hex(hex).map_err(|e| malformed(&format!("parent: {e}")))?),
        };
        let author = header_field(&mut lines, "author")?.to_string();
        let timestamp = header_field(&mut lines, "timestamp")?
            .parse::<i64>()
            .map_err(|e| malformed(&format!("timestamp: {e}")))?;
        if lines.next().is_some() {
            return Err(malformed("unexpected header line"));
        }

        Ok(Self {
            card,
            parent,
            author,
            timestamp,
            message: message.to_string(),
        })
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Commit, self.encode()?.into_bytes()))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Commit {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected commit, got {}", obj.kind),
            });
        }
        let text = std::str::from_utf8(&obj.data)
            .map_err(|_| StoreError::MalformedCommit("not UTF-8".into()))?;
        Self::decode(text)
    }

    /// The digest this commit will be stored under.
    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// First line of the message, for one-line displays.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn header_field<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    name: &str,
) -> StoreResult<&'a str> {
    let line = lines
        .next()
        .ok_or_else(|| StoreError::MalformedCommit(format!("missing {name} line")))?;
    line.strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| StoreError::MalformedCommit(format!("expected {name} line, got {line:?}")))
}
