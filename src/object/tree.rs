use crate::error::GitError;
use crate::hash::Hash20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Directory,
    RegularFile,
    Executable,
    Symlink,
    Gitlink,
}

impl Mode {
    /// ASCII-octal literal exactly as it is serialized: no leading zero
    /// except that directories are `40000` (5 chars); everything else is
    /// 6 chars.
    pub fn as_ascii(self) -> &'static str {
        match self {
            Mode::Directory => "40000",
            Mode::RegularFile => "100644",
            Mode::Executable => "100755",
            Mode::Symlink => "120000",
            Mode::Gitlink => "160000",
        }
    }

    /// Parsers must accept both `40000` and `040000` for directories.
    pub fn parse(s: &str) -> Result<Mode, GitError> {
        Ok(match s {
            "40000" | "040000" => Mode::Directory,
            "100644" => Mode::RegularFile,
            "100755" => Mode::Executable,
            "120000" => Mode::Symlink,
            "160000" => Mode::Gitlink,
            other => {
                return Err(GitError::MalformedObject {
                    kind: "tree",
                    reason: format!("unknown mode {other:?}"),
                });
            }
        })
    }

    pub fn is_directory(self) -> bool {
        matches!(self, Mode::Directory)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: Mode,
    pub name: String,
    pub target_hash: Hash20,
}

impl TreeEntry {
    pub fn new(mode: Mode, name: impl Into<String>, target_hash: Hash20) -> Result<Self, GitError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(TreeEntry {
            mode,
            name,
            target_hash,
        })
    }

    /// The sort key: directory names get a trailing `/` appended before
    /// comparison, so `dir` sorts as `dir/` — after `dir.txt`, before `dir2`.
    fn sort_key(&self) -> String {
        if self.mode.is_directory() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Free function so both the parser (to assert canonical order) and the
/// serializer (to sort) use the identical predicate.
pub fn tree_entry_cmp(a: &TreeEntry, b: &TreeEntry) -> std::cmp::Ordering {
    a.sort_key().as_bytes().cmp(b.sort_key().as_bytes())
}

fn validate_name(name: &str) -> Result<(), GitError> {
    if name.is_empty() {
        return Err(GitError::MalformedObject {
            kind: "tree",
            reason: "entry name is empty".into(),
        });
    }
    if name.contains('/') || name.contains('\0') {
        return Err(GitError::MalformedObject {
            kind: "tree",
            reason: format!("entry name {name:?} contains '/' or NUL"),
        });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Tree { entries }
    }

    pub fn parse(content: &[u8]) -> Result<Tree, GitError> {
        let mut entries = Vec::new();
        let mut cursor = 0usize;
        let mut seen_names = std::collections::HashSet::new();
        while cursor < content.len() {
            let space = find_byte(content, cursor, b' ').ok_or_else(|| GitError::MalformedObject {
                kind: "tree",
                reason: "missing space after mode".into(),
            })?;
            let mode_str =
                std::str::from_utf8(&content[cursor..space]).map_err(|_| GitError::MalformedObject {
                    kind: "tree",
                    reason: "mode is not valid UTF-8".into(),
                })?;
            let mode = Mode::parse(mode_str)?;
            let nul = find_byte(content, space + 1, 0).ok_or_else(|| GitError::MalformedObject {
                kind: "tree",
                reason: "missing NUL after name".into(),
            })?;
            let name =
                std::str::from_utf8(&content[space + 1..nul]).map_err(|_| GitError::MalformedObject {
                    kind: "tree",
                    reason: "name is not valid UTF-8".into(),
                })?;
            validate_name(name)?;
            let hash_start = nul + 1;
            let hash_end = hash_start + Hash20::LEN;
            if hash_end > content.len() {
                return Err(GitError::MalformedObject {
                    kind: "tree",
                    reason: "truncated entry hash".into(),
                });
            }
            let target_hash = Hash20::try_from(&content[hash_start..hash_end])?;
            if !seen_names.insert(name.to_string()) {
                return Err(GitError::MalformedObject {
                    kind: "tree",
                    reason: format!("duplicate entry name {name:?}"),
                });
            }
            entries.push(TreeEntry {
                mode,
                name: name.to_string(),
                target_hash,
            });
            cursor = hash_end;
        }
        // A foreign tree's sort order IS part of its identity: re-sorting
        // would change the hash on re-serialize, so an out-of-order or
        // duplicate tree is rejected rather than repaired.
        for pair in entries.windows(2) {
            if tree_entry_cmp(&pair[0], &pair[1]) != std::cmp::Ordering::Less {
                return Err(GitError::MalformedObject {
                    kind: "tree",
                    reason: format!(
                        "entries not in canonical order: {:?} before {:?}",
                        pair[0].name, pair[1].name
                    ),
                });
            }
        }
        Ok(Tree { entries })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut entries = self.entries.clone();
        entries.sort_by(tree_entry_cmp);
        let mut out = Vec::new();
        for entry in &entries {
            out.extend_from_slice(entry.mode.as_ascii().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.target_hash.as_bytes());
        }
        out
    }
}

fn find_byte(haystack: &[u8], start: usize, needle: u8) -> Option<usize> {
    haystack[start..]
        .iter()
        .position(|&b| b == needle)
        .map(|pos| pos + start)
}
