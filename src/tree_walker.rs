use std::collections::BTreeMap;

use crate::error::GitError;
use crate::hash::Hash20;
use crate::object::{Mode, Object, ObjectKind};
use crate::store::ObjectStore;

/// Depth-first enumeration of a commit's tree into `path -> blob hash`.
/// Trees are a content-addressed DAG so no cycle is possible; recursion
/// depth is bounded by the repository's own directory depth.
pub fn walk_commit(store: &ObjectStore, commit_hash: &Hash20) -> Result<BTreeMap<String, Hash20>, GitError> {
    let commit = match store.read_kind(commit_hash, ObjectKind::Commit)? {
        Object::Commit(c) => c,
        _ => unreachable!("read_kind already asserted Commit"),
    };
    let mut out = BTreeMap::new();
    walk_tree(store, &commit.tree_hash, "", &mut out)?;
    Ok(out)
}

fn walk_tree(
    store: &ObjectStore,
    tree_hash: &Hash20,
    prefix: &str,
    out: &mut BTreeMap<String, Hash20>,
) -> Result<(), GitError> {
    let tree = match store.read_kind(tree_hash, ObjectKind::Tree)? {
        Object::Tree(t) => t,
        _ => unreachable!("read_kind already asserted Tree"),
    };
    for entry in &tree.entries {
        let path = format!("{prefix}{}", entry.name);
        match entry.mode {
            Mode::Directory => {
                walk_tree(store, &entry.target_hash, &format!("{path}/"), out)?;
            }
            Mode::RegularFile | Mode::Executable | Mode::Symlink => {
                out.insert(path, entry.target_hash);
            }
            Mode::Gitlink => {
                // Opaque to callers: the referenced commit hash stands in
                // for the submodule's content at this path.
                out.insert(path, entry.target_hash);
            }
        }
    }
    Ok(())
}
