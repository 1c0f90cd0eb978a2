use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::hash::Hash20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefValue {
    Direct(Hash20),
    Symbolic(String),
}

/// `{ read_ref(name) -> Hash or SymbolicRef, write_ref(name, Hash),
/// resolve_head() -> Hash? }`. `resolve_head` returns `None` when HEAD
/// points at an unborn branch (a symbolic ref whose target file does not
/// exist yet).
pub trait RefStore {
    fn read_ref(&self, name: &str) -> Result<RefValue, GitError>;
    fn write_ref(&self, name: &str, hash: Hash20) -> Result<(), GitError>;
    fn write_symbolic_ref(&self, name: &str, target: &str) -> Result<(), GitError>;
    fn resolve_head(&self) -> Result<Option<Hash20>, GitError>;
    fn head_branch(&self) -> Result<Option<String>, GitError>;
}

/// Reads and writes `.git/HEAD` and the branch refs it points at.
pub struct FsRefStore {
    git_dir: PathBuf,
}

impl FsRefStore {
    pub fn open(git_dir: impl AsRef<Path>) -> Self {
        FsRefStore {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        if name == "HEAD" {
            self.git_dir.join("HEAD")
        } else {
            self.git_dir.join(name)
        }
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<RefValue, GitError> {
        let path = self.path_for(name);
        let text = std::fs::read_to_string(&path)?;
        let text = text.trim();
        if let Some(target) = text.strip_prefix("ref: ") {
            Ok(RefValue::Symbolic(target.trim().to_string()))
        } else {
            Ok(RefValue::Direct(text.parse()?))
        }
    }

    fn write_ref(&self, name: &str, hash: Hash20) -> Result<(), GitError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{hash}\n"))?;
        Ok(())
    }

    fn write_symbolic_ref(&self, name: &str, target: &str) -> Result<(), GitError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("ref: {target}\n"))?;
        Ok(())
    }

    fn resolve_head(&self) -> Result<Option<Hash20>, GitError> {
        match self.read_ref("HEAD")? {
            RefValue::Direct(hash) => Ok(Some(hash)),
            RefValue::Symbolic(target) => match self.read_ref(&target) {
                Ok(RefValue::Direct(hash)) => Ok(Some(hash)),
                Ok(RefValue::Symbolic(_)) => Err(GitError::Conflict {
                    reason: "HEAD resolves through a chain of symbolic refs".into(),
                }),
                Err(GitError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            },
        }
    }

    fn head_branch(&self) -> Result<Option<String>, GitError> {
        match self.read_ref("HEAD")? {
            RefValue::Symbolic(target) => Ok(target.strip_prefix("refs/heads/").map(str::to_string)),
            RefValue::Direct(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> Hash20 {
        "4b825dc642cb6eb9a060e54bf8d69288fbee4904".parse().unwrap()
    }

    #[test]
    fn unborn_branch_resolves_head_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let refs = FsRefStore::open(dir.path());
        refs.write_symbolic_ref("HEAD", "refs/heads/main").unwrap();
        assert_eq!(refs.resolve_head().unwrap(), None);
        assert_eq!(refs.head_branch().unwrap(), Some("main".to_string()));
    }

    #[test]
    fn resolves_head_through_branch_ref() {
        let dir = tempfile::tempdir().unwrap();
        let refs = FsRefStore::open(dir.path());
        refs.write_symbolic_ref("HEAD", "refs/heads/main").unwrap();
        refs.write_ref("refs/heads/main", hash()).unwrap();
        assert_eq!(refs.resolve_head().unwrap(), Some(hash()));
    }
}
