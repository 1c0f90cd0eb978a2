use std::path::{Path, PathBuf};

use tracing::info;

use crate::add_remove::{self, AddReport};
use crate::collab::{Clock, FsClock, FsRefStore, FsWorkingTree, RefStore, RefValue};
use crate::config::Config;
use crate::error::GitError;
use crate::hash::Hash20;
use crate::index::Index;
use crate::object::{Commit, CommitPerson, Object};
use crate::status::{self, StatusReport};
use crate::store::ObjectStore;

const DEFAULT_BRANCH: &str = "main";

/// Creates the on-disk layout of a fresh repository: `.git/{objects,
/// refs/heads,refs/tags}`, `HEAD` pointing at an unborn `refs/heads/main`,
/// a default `config`, and an empty `description`.
pub fn init(root: impl AsRef<Path>) -> Result<(), GitError> {
    let root = root.as_ref();
    let git_dir = root.join(".git");
    std::fs::create_dir_all(git_dir.join("objects"))?;
    std::fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    std::fs::create_dir_all(git_dir.join("refs").join("tags"))?;
    std::fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{DEFAULT_BRANCH}\n"),
    )?;
    Config::default_core().save(git_dir.join("config"))?;
    std::fs::write(
        git_dir.join("description"),
        "Unnamed repository; edit this file 'description' to name the repository.\n",
    )?;
    info!(path = %root.display(), "initialized repository");
    Ok(())
}

/// Walks upward from `start` looking for a `.git` directory, mirroring how
/// every real git command locates its repository root.
pub fn discover(start: impl AsRef<Path>) -> Result<PathBuf, GitError> {
    let mut current = start.as_ref().to_path_buf();
    loop {
        if current.join(".git").is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(GitError::NotARepository);
        }
    }
}

/// Bundles the object store, the staging index, and the filesystem-backed
/// collaborators behind one handle, so callers use `repo.add(...)`,
/// `repo.status()`, `repo.commit(...)` without re-wiring collaborators at
/// every call site.
pub struct Repository {
    root: PathBuf,
    git_dir: PathBuf,
    store: ObjectStore,
    index: Index,
    refs: FsRefStore,
    working_tree: FsWorkingTree,
    clock: FsClock,
}

impl Repository {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, GitError> {
        let root = root.as_ref().to_path_buf();
        let git_dir = root.join(".git");
        if !git_dir.is_dir() {
            return Err(GitError::NotARepository);
        }
        let index = Index::load(git_dir.join("index"))?;
        Ok(Repository {
            store: ObjectStore::open(&git_dir),
            index,
            refs: FsRefStore::open(&git_dir),
            working_tree: FsWorkingTree::open(&root),
            clock: FsClock,
            git_dir,
            root,
        })
    }

    fn index_lock_path(&self) -> PathBuf {
        self.git_dir.join("index.lock")
    }

    /// Acquires the index write-lock for the duration of `f`, then saves
    /// the (possibly mutated) index and releases the lock.
    fn with_index_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, GitError>) -> Result<T, GitError> {
        let lock_path = self.index_lock_path();
        let _lock = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    GitError::Conflict {
                        reason: "index is locked by another process".into(),
                    }
                } else {
                    GitError::Io(e)
                }
            })?;
        let result = f(self);
        if result.is_ok() {
            self.index.save(self.git_dir.join("index"))?;
        }
        let _ = std::fs::remove_file(&lock_path);
        result
    }

    pub fn add(&mut self, paths: &[PathBuf]) -> Result<AddReport, GitError> {
        self.with_index_lock(|repo| {
            let report = add_remove::add(&repo.store, &mut repo.index, &repo.root, &repo.working_tree, paths);
            Ok(report)
        })
    }

    pub fn remove(&mut self, paths: &[String], delete_from_disk: bool) -> Result<(), GitError> {
        self.with_index_lock(|repo| {
            for path in paths {
                add_remove::remove(&mut repo.index, &repo.root, path, delete_from_disk)?;
            }
            Ok(())
        })
    }

    pub fn status(&self) -> Result<StatusReport, GitError> {
        let head_commit = self.refs.resolve_head()?;
        status::status(&self.store, &self.index, head_commit, &self.working_tree, &self.working_tree)
    }

    /// Writes the commit whose tree is the current index contents, parented
    /// on the current HEAD (or no parent, for the first commit on a branch),
    /// and advances the current branch ref to point at it.
    pub fn commit(&mut self, message: impl Into<String>) -> Result<Hash20, GitError> {
        let message = message.into();
        let config = Config::load(self.git_dir.join("config"))?;
        let (name, email) = match (config.user_name(), config.user_email()) {
            (Some(n), Some(e)) => (n.to_string(), e.to_string()),
            _ => {
                return Err(GitError::Validation {
                    field: "user",
                    message: "user.name and user.email must be set in .git/config".into(),
                });
            }
        };
        let (when, tz_offset_minutes) = self.clock.now();
        let person = CommitPerson::new(name, email, when, tz_offset_minutes)?;

        let tree_hash = crate::write_tree::build_tree_from_index(&self.store, &self.index)?;
        let parent_hash = self.refs.resolve_head()?;

        let commit = Commit {
            tree_hash,
            parent_hashes: parent_hash.into_iter().collect(),
            author: person.clone(),
            committer: person,
            message,
        };
        let commit_hash = self.store.write(&Object::Commit(commit))?;

        match self.refs.head_branch()? {
            Some(branch) => self.refs.write_ref(&format!("refs/heads/{branch}"), commit_hash)?,
            None => {
                return Err(GitError::Conflict {
                    reason: "cannot commit in a detached-HEAD state".into(),
                });
            }
        }
        info!(hash = %commit_hash, "created commit");
        Ok(commit_hash)
    }

    pub fn create_branch(&self, name: &str, at: Hash20) -> Result<(), GitError> {
        self.refs.write_ref(&format!("refs/heads/{name}"), at)
    }

    pub fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        match self.refs.read_ref(&format!("refs/heads/{name}")) {
            Ok(RefValue::Direct(_)) => {}
            Ok(RefValue::Symbolic(_)) => {
                return Err(GitError::Conflict {
                    reason: format!("refs/heads/{name} is not a direct ref"),
                });
            }
            Err(_) => {
                return Err(GitError::InvalidName {
                    what: "branch",
                    value: name.to_string(),
                });
            }
        }
        self.refs.write_symbolic_ref("HEAD", &format!("refs/heads/{name}"))
    }

    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        self.refs.head_branch()
    }

    pub fn current_head(&self) -> Result<Option<Hash20>, GitError> {
        self.refs.resolve_head()
    }

    pub fn list_branches(&self) -> Result<Vec<String>, GitError> {
        let heads_dir = self.git_dir.join("refs").join("heads");
        let mut names = Vec::new();
        let entries = match std::fs::read_dir(&heads_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(GitError::Io(e)),
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
