//! The HEAD file format.

use crate::error::{RefError, RefResult};

const HEAD_PREFIX: &str = "ref: refs/heads/";

/// HEAD: the name of the currently checked-out branch.
///
/// Persisted as a single line, `ref: refs/heads/<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head(pub String);

impl Head {
    pub fn branch(&self) -> &str {
        &self.0
    }

    /// Parse the contents of a HEAD file.
    pub fn parse(text: &str) -> RefResult<Self> {
        let line = text.trim_end_matches(['\n', '\r']);
        let name = line
            .strip_prefix(HEAD_PREFIX)
            .ok_or_else(|| RefError::CorruptHead(format!("not a symbolic ref: {line:?}")))?;
        if name.is_empty() || name.contains('\n') {
            return Err(RefError::CorruptHead(format!("bad branch name: {name:?}")));
        }
        Ok(Self(name.to_string()))
    }

    /// Serialize for writing to disk.
    pub fn to_file_contents(&self) -> String {
        format!("{HEAD_PREFIX}{}\n", self.0)
    }
}
