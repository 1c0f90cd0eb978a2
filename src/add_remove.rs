use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::collab::IgnoreEngine;
use crate::error::GitError;
use crate::hash::compute_object_hash;
use crate::index::{Index, IndexEntry, Timespec};
use crate::object::{Blob, Object, ObjectKind};
use crate::store::ObjectStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
}

#[derive(Debug, Default)]
pub struct AddReport {
    pub staged: Vec<(PathBuf, ChangeKind)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Resolves `input` (possibly relative) to a path inside `root`, rejecting
/// any traversal outside it.
fn resolve_in_repo(root: &Path, input: &Path) -> Result<PathBuf, GitError> {
    let absolute = if input.is_absolute() {
        input.to_path_buf()
    } else {
        root.join(input)
    };
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut probe = absolute.clone();
    loop {
        if let Ok(canonical) = probe.canonicalize() {
            if !canonical.starts_with(&canonical_root) {
                return Err(GitError::PathEscapesRepo(absolute));
            }
            break;
        }
        if !probe.pop() {
            break;
        }
    }
    Ok(absolute)
}

fn relative_path(root: &Path, absolute: &Path) -> String {
    absolute
        .strip_prefix(root)
        .unwrap_or(absolute)
        .to_string_lossy()
        .replace('\\', "/")
}

fn stage_file(
    store: &ObjectStore,
    index: &mut Index,
    root: &Path,
    file_path: &Path,
    report: &mut AddReport,
) -> Result<(), ()> {
    let relative = relative_path(root, file_path);
    let bytes = match std::fs::read(file_path) {
        Ok(b) => b,
        Err(e) => {
            report.failed.push((file_path.to_path_buf(), e.to_string()));
            return Err(());
        }
    };
    let metadata = match std::fs::symlink_metadata(file_path) {
        Ok(m) => m,
        Err(e) => {
            report.failed.push((file_path.to_path_buf(), e.to_string()));
            return Err(());
        }
    };

    let hash = compute_object_hash(ObjectKind::Blob, &bytes);
    if let Err(e) = store.write(&Object::Blob(Blob::new(bytes))) {
        report.failed.push((file_path.to_path_buf(), e.to_string()));
        return Err(());
    }
    debug!(path = %relative, hash = %hash, "staged blob");

    let existing = index.get(&relative).is_some();
    let mut entry = match IndexEntry::new(relative.clone(), hash) {
        Ok(e) => e,
        Err(e) => {
            report.failed.push((file_path.to_path_buf(), e.to_string()));
            return Err(());
        }
    };
    entry.size = metadata.len() as u32;
    entry.mode = metadata.permissions().mode();
    entry.dev = metadata.dev() as u32;
    entry.ino = metadata.ino() as u32;
    entry.uid = metadata.uid();
    entry.gid = metadata.gid();
    let mtime_ms = (metadata.mtime() as u64) * 1000 + (metadata.mtime_nsec() as u64) / 1_000_000;
    entry.mtime = Timespec {
        seconds: metadata.mtime() as u32,
        // Deliberate: `mtime_ms % 1000` is a millisecond remainder, not a
        // true nanosecond count (see DESIGN.md).
        nanoseconds: (mtime_ms % 1000) as u32,
    };
    entry.ctime = Timespec {
        seconds: metadata.ctime() as u32,
        nanoseconds: 0,
    };

    index.upsert(entry);
    report.staged.push((
        file_path.to_path_buf(),
        if existing { ChangeKind::Modified } else { ChangeKind::Added },
    ));
    Ok(())
}

/// Stages each input path: files are blobified and upserted into the
/// index; directories are recursed (skipping `.git` and ignored paths).
/// Partial failure is tolerated — the returned report's `failed` list
/// names what could not be staged, but the index save is still
/// all-or-nothing for whatever *did* succeed.
pub fn add(
    store: &ObjectStore,
    index: &mut Index,
    root: &Path,
    ignore_engine: &dyn IgnoreEngine,
    paths: &[PathBuf],
) -> AddReport {
    let mut report = AddReport::default();

    for input in paths {
        let resolved = match resolve_in_repo(root, input) {
            Ok(p) => p,
            Err(e) => {
                report.failed.push((input.clone(), e.to_string()));
                continue;
            }
        };

        if !resolved.exists() {
            report
                .failed
                .push((input.clone(), "File does not exist".to_string()));
            continue;
        }

        if resolved.is_dir() {
            let walker = WalkBuilder::new(&resolved).hidden(false).git_ignore(false).build();
            for entry in walker.filter_map(Result::ok) {
                if entry.file_name() == ".git" {
                    continue;
                }
                let path = entry.path();
                if path.is_dir() {
                    continue;
                }
                let relative = relative_path(root, path);
                if ignore_engine.is_ignored(&relative, false) {
                    continue;
                }
                let _ = stage_file(store, index, root, path, &mut report);
            }
        } else {
            let relative = relative_path(root, &resolved);
            if ignore_engine.is_ignored(&relative, false) {
                continue;
            }
            let _ = stage_file(store, index, root, &resolved, &mut report);
        }
    }

    report
}

/// Drops `path`'s index entry (failing if absent) and, if
/// `delete_from_disk`, unlinks the working-tree file too.
pub fn remove(index: &mut Index, root: &Path, path: &str, delete_from_disk: bool) -> Result<(), GitError> {
    index.remove(path)?;
    if delete_from_disk {
        let absolute = root.join(path);
        match std::fs::remove_file(&absolute) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(GitError::Io(e)),
        }
    }
    Ok(())
}
