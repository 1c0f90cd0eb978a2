use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use sha1::{Digest, Sha1};

use crate::error::GitError;
use crate::object::ObjectKind;

/// A raw 20-byte SHA-1 digest. Map keys and equality always compare the raw
/// bytes; hex is purely a display/parse format, never the representation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash20([u8; 20]);

impl Hash20 {
    pub const LEN: usize = 20;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Hash20(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn display_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters of this hash. Never stored, only derived.
    pub fn short(&self, len: usize) -> ShortHash<'_> {
        ShortHash { hash: self, len }
    }
}

impl fmt::Display for Hash20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_hex())
    }
}

impl fmt::Debug for Hash20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash20({})", self.display_hex())
    }
}

impl TryFrom<&[u8]> for Hash20 {
    type Error = GitError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != 20 {
            return Err(GitError::MalformedObject {
                kind: "hash",
                reason: format!("expected 20 bytes, got {}", value.len()),
            });
        }
        let mut buf = [0u8; 20];
        buf.copy_from_slice(value);
        Ok(Hash20(buf))
    }
}

impl FromStr for Hash20 {
    type Err = GitError;

    /// Accepts any-case hex; normalizes to lowercase at this ingress
    /// boundary. No other comparison in the crate is ever case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(GitError::InvalidName {
                what: "hash",
                value: s.to_string(),
            });
        }
        let lower = s.to_ascii_lowercase();
        let bytes = hex::decode(&lower).map_err(|_| GitError::InvalidName {
            what: "hash",
            value: s.to_string(),
        })?;
        Hash20::try_from(bytes.as_slice())
    }
}

/// A borrowed, never-stored view over the first `len` hex characters of a hash.
pub struct ShortHash<'a> {
    hash: &'a Hash20,
    len: usize,
}

impl fmt::Display for ShortHash<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.hash.display_hex();
        f.write_str(&full[..self.len.min(full.len())])
    }
}

/// Hashes `kind SP size NUL content` — never materializes the whole frame
/// when `content` is large; callers that have the bytes already in memory
/// should prefer `frame` below.
pub fn compute_object_hash(kind: ObjectKind, content: &[u8]) -> Hash20 {
    let mut hasher = Sha1::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b" ");
    hasher.update(content.len().to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(content);
    let digest = hasher.finalize();
    Hash20::try_from(digest.as_slice()).expect("sha1 digest is always 20 bytes")
}

/// Produces the exact framed byte sequence that gets hashed and (after zlib)
/// stored on disk: `kind SP size NUL content`.
pub fn frame(kind: ObjectKind, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 16);
    out.extend_from_slice(kind.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(content.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(content);
    out
}

/// Splits a framed buffer back into its kind and content, verifying the
/// declared size against the actual remainder length.
pub fn parse_frame(bytes: &[u8], expected_kind: Option<ObjectKind>) -> Result<Vec<u8>, GitError> {
    let nul_pos = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GitError::MalformedObject {
            kind: "object",
            reason: "missing NUL header terminator".into(),
        })?;
    let header =
        std::str::from_utf8(&bytes[..nul_pos]).map_err(|_| GitError::MalformedObject {
            kind: "object",
            reason: "header is not valid UTF-8".into(),
        })?;
    let (kind_str, size_str) = header.split_once(' ').ok_or_else(|| GitError::MalformedObject {
        kind: "object",
        reason: "header missing space separator".into(),
    })?;
    let kind = ObjectKind::from_str(kind_str)?;
    if let Some(expected) = expected_kind {
        if expected != kind {
            return Err(GitError::WrongKind {
                expected: expected.as_str(),
                actual: kind.as_str(),
            });
        }
    }
    if size_str.is_empty() || !size_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GitError::MalformedObject {
            kind: "object",
            reason: format!("size {size_str:?} is not an unsigned decimal"),
        });
    }
    let declared_size: usize = size_str.parse().map_err(|_| GitError::MalformedObject {
        kind: "object",
        reason: format!("size {size_str:?} does not fit in memory"),
    })?;
    let content = &bytes[nul_pos + 1..];
    if content.len() != declared_size {
        return Err(GitError::MalformedObject {
            kind: "object",
            reason: format!(
                "declared size {declared_size} does not match content length {}",
                content.len()
            ),
        });
    }
    Ok(content.to_vec())
}

pub fn zlib_compress(content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    encoder.finish()
}

pub fn zlib_decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
