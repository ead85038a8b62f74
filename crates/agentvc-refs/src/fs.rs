//! On-disk refs under a repository metadata directory.
//!
//! ```text
//! <dir>/HEAD                          ref: refs/heads/<name>
//! <dir>/refs/heads/<branch>           <commit digest>
//! <dir>/refs/remotes/<remote>/<name>  <commit digest>
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use agentvc_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::{validate_branch_name, validate_remote_name};
use crate::traits::RefStore;
use crate::types::Head;

/// Filesystem-backed [`RefStore`].
#[derive(Clone, Debug)]
pub struct FsRefStore {
    dir: PathBuf,
}

impl FsRefStore {
    /// Refs rooted at `dir` (the `.agentvc` directory).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn heads_dir(&self) -> PathBuf {
        self.dir.join("refs").join("heads")
    }

    fn branch_path(&self, branch: &str) -> PathBuf {
        self.heads_dir().join(branch)
    }

    fn remote_path(&self, remote: &str, branch: &str) -> PathBuf {
        self.dir.join("refs").join("remotes").join(remote).join(branch)
    }

    fn read_digest(name: &str, path: &Path) -> RefResult<Option<ObjectId>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id = ObjectId::from_hex(text.trim()).map_err(|e| RefError::CorruptRef {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(id))
    }

    fn collect_branches(
        root: &Path,
        dir: &Path,
        out: &mut Vec<(String, ObjectId)>,
    ) -> RefResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                Self::collect_branches(root, &path, out)?;
                continue;
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            // Leftover staging files from an interrupted write.
            if name.rsplit('/').next().is_some_and(|n| n.starts_with('.')) {
                continue;
            }
            if let Some(id) = Self::read_digest(&name, &path)? {
                out.push((name, id));
            }
        }
        Ok(())
    }
}

/// Replace `path` with `contents` atomically.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "ref path has no parent"))?;
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".tmp").tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RefStore for FsRefStore {
    fn head(&self) -> RefResult<String> {
        let text = match fs::read_to_string(self.dir.join("HEAD")) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RefError::CorruptHead("HEAD is missing".into()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Head::parse(&text)?.0)
    }

    fn set_head(&self, branch: &str) -> RefResult<()> {
        validate_branch_name(branch)?;
        write_atomic(
            &self.dir.join("HEAD"),
            &Head(branch.to_string()).to_file_contents(),
        )?;
        tracing::debug!(branch, "HEAD moved");
        Ok(())
    }

    fn get_branch(&self, branch: &str) -> RefResult<Option<ObjectId>> {
        validate_branch_name(branch)?;
        Self::read_digest(branch, &self.branch_path(branch))
    }

    fn set_branch(&self, branch: &str, target: &ObjectId) -> RefResult<()> {
        validate_branch_name(branch)?;
        write_atomic(&self.branch_path(branch), &format!("{target}\n"))?;
        tracing::debug!(branch, %target, "branch updated");
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> RefResult<bool> {
        validate_branch_name(branch)?;
        match fs::remove_file(self.branch_path(branch)) {
            Ok(()) => {
                tracing::debug!(branch, "branch deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_branches(&self) -> RefResult<Vec<(String, ObjectId)>> {
        let root = self.heads_dir();
        let mut out = Vec::new();
        Self::collect_branches(&root, &root, &mut out)?;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn get_remote_ref(&self, remote: &str, branch: &str) -> RefResult<Option<ObjectId>> {
        validate_remote_name(remote)?;
        validate_branch_name(branch)?;
        Self::read_digest(
            &format!("{remote}/{branch}"),
            &self.remote_path(remote, branch),
        )
    }

    fn set_remote_ref(&self, remote: &str, branch: &str, target: &ObjectId) -> RefResult<()> {
        validate_remote_name(remote)?;
        validate_branch_name(branch)?;
        write_atomic(&self.remote_path(remote, branch), &format!("{target}\n"))?;
        tracing::debug!(remote, branch, %target, "remote ref updated");
        Ok(())
    }
}
