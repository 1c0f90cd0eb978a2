use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::GitError;

/// `{ is_ignored(relative_path, is_directory) -> bool }`.
pub trait IgnoreEngine {
    fn is_ignored(&self, relative_path: &str, is_directory: bool) -> bool;
}

#[derive(Clone, Copy, Debug)]
pub struct FileStat {
    pub size: u64,
    pub mtime_ms: u64,
    pub ctime_ms: u64,
    pub mode: u32,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// `{ walk(root) -> stream<(relative_path, stat)>, read_file(path) -> bytes }`.
/// Modeled as owned `Vec`s rather than an async stream: everything here
/// runs to completion on one thread, so there is nothing to interleave
/// with.
pub trait WorkingTreeEnumerator {
    fn walk(&self) -> Result<Vec<(String, FileStat)>, GitError>;
    fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, GitError>;
}

/// Backs both collaborator traits with the `ignore` crate's `.gitignore`
/// matcher, plus a recursive directory walk for everything else.
pub struct FsWorkingTree {
    root: PathBuf,
    gitignore: Gitignore,
}

impl FsWorkingTree {
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut builder = GitignoreBuilder::new(&root);
        let _ = builder.add(root.join(".gitignore"));
        let gitignore = builder.build().unwrap_or_else(|_| Gitignore::empty());
        FsWorkingTree { root, gitignore }
    }

    fn stat_of(metadata: &std::fs::Metadata) -> FileStat {
        FileStat {
            size: metadata.len(),
            mtime_ms: (metadata.mtime() as u64) * 1000 + (metadata.mtime_nsec() as u64) / 1_000_000,
            ctime_ms: (metadata.ctime() as u64) * 1000 + (metadata.ctime_nsec() as u64) / 1_000_000,
            mode: metadata.permissions().mode(),
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            uid: metadata.uid(),
            gid: metadata.gid(),
            is_dir: metadata.is_dir(),
            is_symlink: metadata.file_type().is_symlink(),
        }
    }

    fn walk_dir(&self, dir: &Path, out: &mut Vec<(String, FileStat)>) -> Result<(), GitError> {
        let mut children: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
        children.sort_by_key(|e| e.file_name());
        for child in children {
            if child.file_name() == ".git" {
                continue;
            }
            let path = child.path();
            let metadata = child.metadata()?;
            let relative = path
                .strip_prefix(&self.root)
                .expect("walked path is under root")
                .to_string_lossy()
                .replace('\\', "/");
            if metadata.is_dir() {
                if self.is_ignored(&relative, true) {
                    continue;
                }
                self.walk_dir(&path, out)?;
            } else {
                out.push((relative, Self::stat_of(&metadata)));
            }
        }
        Ok(())
    }
}

impl IgnoreEngine for FsWorkingTree {
    fn is_ignored(&self, relative_path: &str, is_directory: bool) -> bool {
        self.gitignore
            .matched(relative_path, is_directory)
            .is_ignore()
    }
}

impl WorkingTreeEnumerator for FsWorkingTree {
    fn walk(&self) -> Result<Vec<(String, FileStat)>, GitError> {
        let mut out = Vec::new();
        self.walk_dir(&self.root, &mut out)?;
        Ok(out)
    }

    fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, GitError> {
        Ok(std::fs::read(self.root.join(relative_path))?)
    }
}
