/// Opaque file content. No substructure, no validation — any byte sequence
/// is a valid blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub content: Vec<u8>,
}

impl Blob {
    pub fn new(content: Vec<u8>) -> Self {
        Blob { content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_object_hash;
    use crate::object::ObjectKind;

    #[test]
    fn empty_blob_hash_is_well_known() {
        let blob = Blob::new(Vec::new());
        let hash = compute_object_hash(ObjectKind::Blob, &blob.content);
        assert_eq!(hash.display_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }
}
