mod blob;
mod commit;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::{Commit, CommitPerson};
pub use tag::Tag;
pub use tree::{Mode, Tree, TreeEntry};

use std::str::FromStr;

use crate::error::GitError;
use crate::hash::{Hash20, compute_object_hash};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(GitError::MalformedObject {
                kind: "object",
                reason: format!("unknown object kind {other:?}"),
            }),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sum type over the four canonical object kinds. Immutable once built;
/// `hash` recomputes the digest from the current serialization on each call.
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    pub fn content(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.content.clone(),
            Object::Tree(t) => t.serialize(),
            Object::Commit(c) => c.serialize(),
            Object::Tag(t) => t.serialize(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content().len() as u64
    }

    pub fn hash(&self) -> Hash20 {
        compute_object_hash(self.kind(), &self.content())
    }

    pub fn parse(kind: ObjectKind, content: &[u8]) -> Result<Object, GitError> {
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(Blob::new(content.to_vec())),
            ObjectKind::Tree => Object::Tree(Tree::parse(content)?),
            ObjectKind::Commit => Object::Commit(Commit::parse(content)?),
            ObjectKind::Tag => Object::Tag(Tag::parse(content)?),
        })
    }
}
