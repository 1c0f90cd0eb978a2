use std::io::Write;
use std::path::Path;

use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use crate::error::GitError;
use crate::hash::Hash20;
use crate::index::entry::{IndexEntry, Timespec, index_entry_cmp};

const SIGNATURE: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const FIXED_ENTRY_LEN: usize = 62;

#[derive(Debug, Clone, Default)]
pub struct Index {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn empty() -> Self {
        Index {
            version: VERSION,
            entries: Vec::new(),
        }
    }

    /// Upserts by path (stage 0), replacing any existing entry at that path.
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter().position(|e| e.path == entry.path) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
        self.entries.sort_by(index_entry_cmp);
    }

    pub fn remove(&mut self, path: &str) -> Result<(), GitError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.path == path)
            .ok_or_else(|| GitError::Validation {
                field: "path",
                message: format!("no staged entry for {path:?}"),
            })?;
        self.entries.remove(idx);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Index, GitError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Index::empty()),
            Err(e) => return Err(GitError::Io(e)),
        };

        if bytes.len() < 12 + 20 {
            return Err(GitError::InvalidIndex {
                reason: "truncated header".into(),
            });
        }
        if &bytes[0..4] != SIGNATURE {
            return Err(GitError::InvalidIndex {
                reason: "signature".into(),
            });
        }
        let version = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(GitError::InvalidIndex {
                reason: format!("unsupported version {version}"),
            });
        }
        let entry_count = u32::from_be_bytes(bytes[8..12].try_into().unwrap()) as usize;

        let checksum_start = bytes.len() - 20;
        let mut hasher = Sha1::new();
        hasher.update(&bytes[..checksum_start]);
        let computed: [u8; 20] = hasher.finalize().into();
        if computed != bytes[checksum_start..] {
            return Err(GitError::InvalidIndex {
                reason: "checksum".into(),
            });
        }

        let mut entries = Vec::with_capacity(entry_count);
        let mut cursor = 12usize;
        for _ in 0..entry_count {
            if cursor + FIXED_ENTRY_LEN > checksum_start {
                return Err(GitError::InvalidIndex {
                    reason: "truncated entry".into(),
                });
            }
            let field = |off: usize| -> u32 {
                u32::from_be_bytes(bytes[cursor + off..cursor + off + 4].try_into().unwrap())
            };
            let ctime = Timespec {
                seconds: field(0),
                nanoseconds: field(4),
            };
            let mtime = Timespec {
                seconds: field(8),
                nanoseconds: field(12),
            };
            let dev = field(16);
            let ino = field(20);
            let mode = field(24);
            let uid = field(28);
            let gid = field(32);
            let size = field(36);
            let content_hash = Hash20::try_from(&bytes[cursor + 40..cursor + 60])?;
            let flags = u16::from_be_bytes(bytes[cursor + 60..cursor + 62].try_into().unwrap());
            let (assume_valid, extended, stage) = IndexEntry::unpack_flags(flags);
            if extended {
                return Err(GitError::InvalidIndex {
                    reason: "extended flag bit set in v2 index".into(),
                });
            }

            let name_start = cursor + FIXED_ENTRY_LEN;
            let name_nul = bytes[name_start..checksum_start]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| GitError::InvalidIndex {
                    reason: "unterminated entry name".into(),
                })?;
            let name_end = name_start + name_nul;
            let path = String::from_utf8(bytes[name_start..name_end].to_vec()).map_err(|_| {
                GitError::InvalidIndex {
                    reason: "entry path is not valid UTF-8".into(),
                }
            })?;

            let raw_len = FIXED_ENTRY_LEN + name_nul + 1;
            let padded_len = raw_len.div_ceil(8) * 8;
            cursor += padded_len;

            entries.push(IndexEntry {
                ctime,
                mtime,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
                content_hash,
                assume_valid,
                extended,
                stage,
                path,
            });
        }

        Ok(Index { version, entries })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GitError> {
        let path = path.as_ref();
        let mut entries = self.entries.clone();
        entries.sort_by(index_entry_cmp);

        let mut out = Vec::new();
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());

        for entry in &entries {
            out.extend_from_slice(&entry.ctime.seconds.to_be_bytes());
            out.extend_from_slice(&entry.ctime.nanoseconds.to_be_bytes());
            out.extend_from_slice(&entry.mtime.seconds.to_be_bytes());
            out.extend_from_slice(&entry.mtime.nanoseconds.to_be_bytes());
            out.extend_from_slice(&entry.dev.to_be_bytes());
            out.extend_from_slice(&entry.ino.to_be_bytes());
            out.extend_from_slice(&entry.mode.to_be_bytes());
            out.extend_from_slice(&entry.uid.to_be_bytes());
            out.extend_from_slice(&entry.gid.to_be_bytes());
            out.extend_from_slice(&entry.size.to_be_bytes());
            out.extend_from_slice(entry.content_hash.as_bytes());
            out.extend_from_slice(&entry.flags_packed().to_be_bytes());
            out.extend_from_slice(entry.path.as_bytes());
            out.push(0);
            let raw_len = FIXED_ENTRY_LEN + entry.path.len() + 1;
            let padded_len = raw_len.div_ceil(8) * 8;
            out.resize(out.len() + (padded_len - raw_len), 0);
        }

        let mut hasher = Sha1::new();
        hasher.update(&out);
        let checksum: [u8; 20] = hasher.finalize().into();
        out.extend_from_slice(&checksum);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&out)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| GitError::Io(e.error))?;
        Ok(())
    }
}
