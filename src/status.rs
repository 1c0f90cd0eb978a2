use std::collections::BTreeMap;

use crate::collab::{FileStat, IgnoreEngine, WorkingTreeEnumerator};
use crate::error::GitError;
use crate::hash::{Hash20, compute_object_hash};
use crate::index::{Index, WorkingStat, is_entry_modified};
use crate::object::ObjectKind;
use crate::store::ObjectStore;
use crate::tree_walker::walk_commit;

/// Seven-bucket reconciliation of HEAD / index / working tree. Every path
/// reachable from their union (minus ignored) appears in exactly one
/// bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub staged_added: Vec<String>,
    pub staged_modified: Vec<String>,
    pub staged_deleted: Vec<String>,
    pub unstaged_modified: Vec<String>,
    pub unstaged_deleted: Vec<String>,
    pub untracked: Vec<String>,
    pub ignored: Vec<String>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged_added.is_empty()
            && self.staged_modified.is_empty()
            && self.staged_deleted.is_empty()
            && self.unstaged_modified.is_empty()
            && self.unstaged_deleted.is_empty()
            && self.untracked.is_empty()
    }
}

pub fn status(
    store: &ObjectStore,
    index: &Index,
    head_commit: Option<Hash20>,
    working_tree: &dyn WorkingTreeEnumerator,
    ignore_engine: &dyn IgnoreEngine,
) -> Result<StatusReport, GitError> {
    let head_files: BTreeMap<String, Hash20> = match head_commit {
        Some(hash) => walk_commit(store, &hash)?,
        None => BTreeMap::new(),
    };

    let working_files: BTreeMap<String, FileStat> = working_tree.walk()?.into_iter().collect();

    let mut report = StatusReport::default();

    for entry in &index.entries {
        match head_files.get(&entry.path) {
            Some(head_hash) if *head_hash != entry.content_hash => {
                report.staged_modified.push(entry.path.clone());
            }
            Some(_) => {}
            None => report.staged_added.push(entry.path.clone()),
        }

        match working_files.get(&entry.path) {
            None => report.unstaged_deleted.push(entry.path.clone()),
            Some(stat) => {
                let working_stat = WorkingStat {
                    size: stat.size as u32,
                    mtime_ms: stat.mtime_ms,
                };
                let modified = match is_entry_modified(entry, &working_stat) {
                    Some(result) => result,
                    None => {
                        let bytes = working_tree.read_file(&entry.path)?;
                        let current_hash = compute_object_hash(ObjectKind::Blob, &bytes);
                        current_hash != entry.content_hash
                    }
                };
                if modified {
                    report.unstaged_modified.push(entry.path.clone());
                }
            }
        }
    }

    for path in head_files.keys() {
        if index.get(path).is_none() {
            report.staged_deleted.push(path.clone());
        }
    }

    for (path, _stat) in &working_files {
        if index.get(path).is_some() {
            continue;
        }
        if ignore_engine.is_ignored(path, false) {
            report.ignored.push(path.clone());
        } else {
            report.untracked.push(path.clone());
        }
    }

    report.staged_added.sort();
    report.staged_modified.sort();
    report.staged_deleted.sort();
    report.unstaged_modified.sort();
    report.unstaged_deleted.sort();
    report.untracked.sort();
    report.ignored.sort();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_object_hash;
    use crate::index::IndexEntry;
    use crate::object::{Blob, Commit, CommitPerson, Mode, Object, Tree, TreeEntry};
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MockWorkingTree {
        files: HashMap<String, (Vec<u8>, FileStat)>,
    }

    impl WorkingTreeEnumerator for MockWorkingTree {
        fn walk(&self) -> Result<Vec<(String, FileStat)>, GitError> {
            Ok(self.files.iter().map(|(p, (_, s))| (p.clone(), *s)).collect())
        }

        fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, GitError> {
            Ok(self.files[relative_path].0.clone())
        }
    }

    struct MockIgnore {
        ignored: RefCell<Vec<String>>,
    }

    impl IgnoreEngine for MockIgnore {
        fn is_ignored(&self, relative_path: &str, _is_directory: bool) -> bool {
            self.ignored.borrow().iter().any(|p| p == relative_path)
        }
    }

    fn stat(content: &[u8]) -> FileStat {
        FileStat {
            size: content.len() as u64,
            mtime_ms: 0,
            ctime_ms: 0,
            mode: 0o100644,
            dev: 0,
            ino: 0,
            uid: 0,
            gid: 0,
            is_dir: false,
            is_symlink: false,
        }
    }

    #[test]
    fn status_classification_seven_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path());

        let h1 = store.write(&Object::Blob(Blob::new(b"content-1".to_vec()))).unwrap();
        let h2 = store.write(&Object::Blob(Blob::new(b"content-2".to_vec()))).unwrap();
        let h3 = store.write(&Object::Blob(Blob::new(b"content-3".to_vec()))).unwrap();
        let ha = store.write(&Object::Blob(Blob::new(b"content-a".to_vec()))).unwrap();

        let head_tree = Tree::new(vec![
            TreeEntry::new(Mode::RegularFile, "b.txt", h1).unwrap(),
            TreeEntry::new(Mode::RegularFile, "c.txt", h2).unwrap(),
            TreeEntry::new(Mode::RegularFile, "d.txt", h3).unwrap(),
        ]);
        let head_tree_hash = store.write(&Object::Tree(head_tree)).unwrap();
        let commit = Commit {
            tree_hash: head_tree_hash,
            parent_hashes: vec![],
            author: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            committer: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            message: "init".into(),
        };
        let commit_hash = store.write(&Object::Commit(commit)).unwrap();

        let mut index = Index::empty();
        index.upsert(IndexEntry::new("a.txt", ha).unwrap());
        index.upsert(IndexEntry::new("b.txt", h1).unwrap());
        index.upsert(IndexEntry::new("d.txt", h3).unwrap());

        let working_b_modified = b"content-1-modified".to_vec();
        let working_tree = MockWorkingTree {
            files: HashMap::from([
                ("a.txt".to_string(), (b"content-a".to_vec(), stat(b"content-a"))),
                (
                    "b.txt".to_string(),
                    (working_b_modified.clone(), stat(&working_b_modified)),
                ),
                ("u.txt".to_string(), (b"u".to_vec(), stat(b"u"))),
                ("ignored.txt".to_string(), (b"ig".to_vec(), stat(b"ig"))),
            ]),
        };
        let ignore_engine = MockIgnore {
            ignored: RefCell::new(vec!["ignored.txt".to_string()]),
        };

        let report = status(&store, &index, Some(commit_hash), &working_tree, &ignore_engine).unwrap();

        assert_eq!(report.staged_added, vec!["a.txt"]);
        assert_eq!(report.staged_deleted, vec!["c.txt"]);
        assert_eq!(report.unstaged_modified, vec!["b.txt"]);
        assert_eq!(report.unstaged_deleted, vec!["d.txt"]);
        assert_eq!(report.untracked, vec!["u.txt"]);
        assert_eq!(report.ignored, vec!["ignored.txt"]);
        assert!(report.staged_modified.is_empty());
    }

    #[test]
    fn unborn_head_reports_everything_staged_as_added() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path());
        let hash = compute_object_hash(ObjectKind::Blob, b"x");
        store.write(&Object::Blob(Blob::new(b"x".to_vec()))).unwrap();

        let mut index = Index::empty();
        index.upsert(IndexEntry::new("x.txt", hash).unwrap());

        let working_tree = MockWorkingTree {
            files: HashMap::from([("x.txt".to_string(), (b"x".to_vec(), stat(b"x")))]),
        };
        let ignore_engine = MockIgnore {
            ignored: RefCell::new(vec![]),
        };

        let report = status(&store, &index, None, &working_tree, &ignore_engine).unwrap();
        assert_eq!(report.staged_added, vec!["x.txt"]);
        assert!(report.unstaged_modified.is_empty());
    }
}
