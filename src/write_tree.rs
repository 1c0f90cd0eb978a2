use std::collections::BTreeMap;

use crate::error::GitError;
use crate::hash::Hash20;
use crate::index::Index;
use crate::object::{Mode, Object, Tree, TreeEntry};
use crate::store::ObjectStore;

/// Builds the tree object (and every nested subtree) implied by the flat,
/// slash-separated paths in the index, writes them all to the object
/// store, and returns the root tree's hash.
enum Node {
    File { hash: Hash20, mode: Mode },
    Dir(BTreeMap<String, Node>),
}

pub fn build_tree_from_index(store: &ObjectStore, index: &Index) -> Result<Hash20, GitError> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for entry in &index.entries {
        insert_entry(&mut root, &entry.path, entry.content_hash, mode_of(entry.mode));
    }
    write_dir(store, &root)
}

fn mode_of(raw: u32) -> Mode {
    const S_IFMT: u32 = 0o170000;
    const S_IFLNK: u32 = 0o120000;
    if raw & S_IFMT == S_IFLNK {
        Mode::Symlink
    } else if raw & 0o111 != 0 {
        Mode::Executable
    } else {
        Mode::RegularFile
    }
}

fn insert_entry(root: &mut BTreeMap<String, Node>, path: &str, hash: Hash20, mode: Mode) {
    let mut components = path.split('/').peekable();
    let mut current = root;
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            current.insert(component.to_string(), Node::File { hash, mode });
        } else {
            let entry = current
                .entry(component.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            current = match entry {
                Node::Dir(children) => children,
                Node::File { .. } => unreachable!("path component collides with a staged file"),
            };
        }
    }
}

fn write_dir(store: &ObjectStore, dir: &BTreeMap<String, Node>) -> Result<Hash20, GitError> {
    let mut entries = Vec::with_capacity(dir.len());
    for (name, node) in dir {
        match node {
            Node::File { hash, mode } => {
                entries.push(TreeEntry::new(*mode, name.clone(), *hash)?);
            }
            Node::Dir(children) => {
                let hash = write_dir(store, children)?;
                entries.push(TreeEntry::new(Mode::Directory, name.clone(), hash)?);
            }
        }
    }
    store.write(&Object::Tree(Tree::new(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use crate::object::ObjectKind;

    fn blob_hash(bytes: &[u8]) -> Hash20 {
        crate::hash::compute_object_hash(ObjectKind::Blob, bytes)
    }

    #[test]
    fn empty_index_produces_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path());
        let index = Index::empty();
        let hash = build_tree_from_index(&store, &index).unwrap();
        assert_eq!(hash.display_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn nested_paths_build_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path());
        store.write(&Object::Blob(crate::object::Blob::new(b"a".to_vec()))).unwrap();
        store.write(&Object::Blob(crate::object::Blob::new(b"b".to_vec()))).unwrap();

        let mut index = Index::empty();
        index.upsert(IndexEntry::new("a.txt", blob_hash(b"a")).unwrap());
        index.upsert(IndexEntry::new("sub/b.txt", blob_hash(b"b")).unwrap());

        let root_hash = build_tree_from_index(&store, &index).unwrap();
        let root = match store.read(&root_hash).unwrap() {
            Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(root.entries.len(), 2);
        let sub_entry = root.entries.iter().find(|e| e.name == "sub").unwrap();
        assert_eq!(sub_entry.mode, Mode::Directory);
        let sub_tree = match store.read(&sub_entry.target_hash).unwrap() {
            Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(sub_tree.entries[0].name, "b.txt");
    }
}
