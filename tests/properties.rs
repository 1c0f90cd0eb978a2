//! Property tests covering round-trip, hash stability, tree sort
//! invariance, and index round-trip/sort across randomized inputs.

use proptest::prelude::*;

use rsgit::hash::{Hash20, compute_object_hash};
use rsgit::index::{Index, IndexEntry};
use rsgit::object::{Mode, ObjectKind, Tree, TreeEntry};

fn arb_hash() -> impl Strategy<Value = Hash20> {
    prop::collection::vec(any::<u8>(), 20).prop_map(|bytes| {
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&bytes);
        Hash20::from_bytes(buf)
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,12}".prop_filter("names must be distinct from '.' and '..'", |s| {
        s != "." && s != ".."
    })
}

proptest! {
    /// Serialize -> parse round-trips, and the hash of a tree
    /// depends only on its canonical serialization.
    #[test]
    fn tree_round_trips_and_hash_is_stable(
        names in prop::collection::hash_set(arb_name(), 0..8),
        hashes in prop::collection::vec(arb_hash(), 0..8),
    ) {
        let entries: Vec<TreeEntry> = names
            .into_iter()
            .zip(hashes)
            .map(|(name, hash)| TreeEntry::new(Mode::RegularFile, name, hash).unwrap())
            .collect();
        let tree = Tree::new(entries);

        let serialized_once = tree.serialize();
        let parsed = Tree::parse(&serialized_once).unwrap();
        let serialized_twice = parsed.serialize();
        prop_assert_eq!(&serialized_once, &serialized_twice);

        let hash_a = compute_object_hash(ObjectKind::Tree, &serialized_once);
        let hash_b = compute_object_hash(ObjectKind::Tree, &serialized_twice);
        prop_assert_eq!(hash_a, hash_b);
    }

    /// Serializing always emits entries in canonical (directory
    /// trailing-slash) order, regardless of insertion order.
    #[test]
    fn tree_serialize_always_sorts(
        names in prop::collection::hash_set(arb_name(), 1..8),
    ) {
        let entries: Vec<TreeEntry> = names
            .into_iter()
            .map(|name| TreeEntry::new(Mode::RegularFile, name, Hash20::from_bytes([0; 20])).unwrap())
            .collect();
        let tree = Tree::new(entries);
        let serialized = tree.serialize();
        let parsed = Tree::parse(&serialized).unwrap();

        let mut sorted_names: Vec<&str> = parsed.entries.iter().map(|e| e.name.as_str()).collect();
        let mut expected = sorted_names.clone();
        expected.sort();
        prop_assert_eq!(&sorted_names, &expected);
        sorted_names.dedup();
        prop_assert_eq!(sorted_names.len(), parsed.entries.len());
    }

    /// index load(save(idx)) == idx, in canonical sorted order,
    /// regardless of insertion order.
    #[test]
    fn index_round_trips_and_sorts(
        names in prop::collection::hash_set(arb_name(), 0..8),
        hashes in prop::collection::vec(arb_hash(), 0..8),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::empty();
        for (name, hash) in names.into_iter().zip(hashes) {
            index.upsert(IndexEntry::new(name, hash).unwrap());
        }
        index.save(&path).unwrap();
        let loaded = Index::load(&path).unwrap();

        prop_assert_eq!(loaded.entries.len(), index.entries.len());
        let mut paths: Vec<&str> = loaded.entries.iter().map(|e| e.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        prop_assert_eq!(&paths, &sorted);
        paths.dedup();
        prop_assert_eq!(paths.len(), loaded.entries.len());
    }
}
