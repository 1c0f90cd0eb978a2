use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::GitError;
use crate::hash::{Hash20, compute_object_hash, frame, parse_frame, zlib_compress, zlib_decompress};
use crate::object::{Object, ObjectKind};

/// Persists and retrieves framed+zlib-compressed objects keyed by hash,
/// under `<git_dir>/objects/xx/yyyy...`.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn open(git_dir: impl AsRef<Path>) -> Self {
        ObjectStore {
            objects_dir: git_dir.as_ref().join("objects"),
        }
    }

    fn path_for(&self, hash: &Hash20) -> PathBuf {
        let hex = hash.display_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    pub fn has(&self, hash: &Hash20) -> bool {
        self.path_for(hash).is_file()
    }

    /// Computes the hash, frames and compresses the content, and writes it
    /// via create-temp-then-rename. A second write of the same hash is a
    /// cheap no-op: loose objects are content-addressed and therefore
    /// write-once.
    pub fn write(&self, object: &Object) -> Result<Hash20, GitError> {
        let kind = object.kind();
        let content = object.content();
        let hash = compute_object_hash(kind, &content);
        if self.has(&hash) {
            return Ok(hash);
        }
        let framed = frame(kind, &content);
        let compressed = zlib_compress(&framed)?;

        let dir = self.objects_dir.join(&hash.display_hex()[..2]);
        std::fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&compressed)?;
        tmp.flush()?;
        let target = self.path_for(&hash);
        // Benign race: a concurrent writer of the same hash produces
        // byte-identical output, so losing the rename race is harmless.
        match tmp.persist_noclobber(&target) {
            Ok(_) => {}
            Err(e) if target.is_file() => drop(e),
            Err(e) => return Err(e.error.into()),
        }
        Ok(hash)
    }

    pub fn read(&self, hash: &Hash20) -> Result<Object, GitError> {
        let path = self.path_for(hash);
        let compressed = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(*hash)
            } else {
                GitError::Io(e)
            }
        })?;
        let framed = zlib_decompress(&compressed)?;
        let nul_pos = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::MalformedObject {
                kind: "object",
                reason: "missing NUL header terminator".into(),
            })?;
        let header = std::str::from_utf8(&framed[..nul_pos]).map_err(|_| GitError::MalformedObject {
            kind: "object",
            reason: "header is not valid UTF-8".into(),
        })?;
        let (kind_str, _size) = header.split_once(' ').ok_or_else(|| GitError::MalformedObject {
            kind: "object",
            reason: "header missing space separator".into(),
        })?;
        let kind: ObjectKind = kind_str.parse()?;
        let content = parse_frame(&framed, Some(kind))?;
        Object::parse(kind, &content)
    }

    pub fn read_kind(&self, hash: &Hash20, expected: ObjectKind) -> Result<Object, GitError> {
        let object = self.read(hash)?;
        if object.kind() != expected {
            return Err(GitError::WrongKind {
                expected: expected.as_str(),
                actual: object.kind().as_str(),
            });
        }
        Ok(object)
    }
}

impl From<tempfile::PersistError> for GitError {
    fn from(e: tempfile::PersistError) -> Self {
        GitError::Io(e.error)
    }
}
