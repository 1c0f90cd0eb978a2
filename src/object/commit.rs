use crate::error::GitError;
use crate::hash::Hash20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPerson {
    pub name: String,
    pub email: String,
    pub when: i64,
    pub tz_offset_minutes: i32,
}

impl CommitPerson {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: i64,
        tz_offset_minutes: i32,
    ) -> Result<Self, GitError> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(GitError::Validation {
                field: "name",
                message: "must not be empty".into(),
            });
        }
        if email.trim().is_empty() || !email.contains('@') {
            return Err(GitError::Validation {
                field: "email",
                message: "must be non-empty and contain '@'".into(),
            });
        }
        Ok(CommitPerson {
            name,
            email,
            when,
            tz_offset_minutes,
        })
    }

    /// `Name <email> unixsec ±HHMM`.
    pub fn format_for_git(&self) -> String {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let abs = self.tz_offset_minutes.unsigned_abs();
        let hours = abs / 60;
        let minutes = abs % 60;
        format!(
            "{} <{}> {} {}{:02}{:02}",
            self.name, self.email, self.when, sign, hours, minutes
        )
    }

    fn parse(line: &str) -> Result<Self, GitError> {
        let bad = || GitError::MalformedObject {
            kind: "commit",
            reason: format!("person line {line:?} does not match 'Name <email> ts tz'"),
        };
        let lt = line.find(" <").ok_or_else(bad)?;
        let name = &line[..lt];
        let rest = &line[lt + 2..];
        let gt = rest.find("> ").ok_or_else(bad)?;
        let email = &rest[..gt];
        if email.contains('>') || !email.contains('@') {
            return Err(bad());
        }
        let rest = &rest[gt + 2..];
        let (ts_str, tz_str) = rest.split_once(' ').ok_or_else(bad)?;
        let when: i64 = ts_str.parse().map_err(|_| bad())?;
        if tz_str.len() != 5 || !(tz_str.starts_with('+') || tz_str.starts_with('-')) {
            return Err(bad());
        }
        let sign: i32 = if tz_str.starts_with('-') { -1 } else { 1 };
        let hours: i32 = tz_str[1..3].parse().map_err(|_| bad())?;
        let minutes: i32 = tz_str[3..5].parse().map_err(|_| bad())?;
        CommitPerson::new(name, email, when, sign * (hours * 60 + minutes))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree_hash: Hash20,
    pub parent_hashes: Vec<Hash20>,
    pub author: CommitPerson,
    pub committer: CommitPerson,
    pub message: String,
}

impl Commit {
    pub fn is_initial(&self) -> bool {
        self.parent_hashes.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() >= 2
    }

    pub fn parse(content: &[u8]) -> Result<Commit, GitError> {
        let text = std::str::from_utf8(content).map_err(|_| GitError::MalformedObject {
            kind: "commit",
            reason: "content is not valid UTF-8".into(),
        })?;
        let (header, message) = split_header_and_message(text)?;

        let mut tree_hash = None;
        let mut parent_hashes = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in header.lines() {
            if let Some(rest) = line.strip_prefix("tree ") {
                if tree_hash.is_some() {
                    return Err(GitError::MalformedObject {
                        kind: "commit",
                        reason: "multiple tree lines".into(),
                    });
                }
                tree_hash = Some(rest.parse::<Hash20>()?);
            } else if let Some(rest) = line.strip_prefix("parent ") {
                parent_hashes.push(rest.parse::<Hash20>()?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(CommitPerson::parse(rest)?);
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(CommitPerson::parse(rest)?);
            } else {
                return Err(GitError::MalformedObject {
                    kind: "commit",
                    reason: format!("unknown header line {line:?}"),
                });
            }
        }

        Ok(Commit {
            tree_hash: tree_hash.ok_or_else(|| GitError::Validation {
                field: "tree",
                message: "missing tree line".into(),
            })?,
            parent_hashes,
            author: author.ok_or_else(|| GitError::Validation {
                field: "author",
                message: "missing author line".into(),
            })?,
            committer: committer.ok_or_else(|| GitError::Validation {
                field: "committer",
                message: "missing committer line".into(),
            })?,
            message: message.to_string(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree_hash));
        for parent in &self.parent_hashes {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push_str(&format!("author {}\n", self.author.format_for_git()));
        out.push_str(&format!("committer {}\n", self.committer.format_for_git()));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }
}

fn split_header_and_message(text: &str) -> Result<(&str, &str), GitError> {
    match text.find("\n\n") {
        Some(pos) => Ok((&text[..pos], &text[pos + 2..])),
        None => Err(GitError::MalformedObject {
            kind: "commit",
            reason: "missing blank line separating header from message".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_hash() -> Hash20 {
        "4b825dc642cb6eb9a060e54bf8d69288fbee4904".parse().unwrap()
    }

    fn parent_hash() -> Hash20 {
        "a1b2c3d4e5f60718293a4b5c6d7e8f9012345678".parse().unwrap()
    }

    #[test]
    fn person_timezone_round_trips() {
        let person = CommitPerson::new("X", "x@y", 1609459200, 330).unwrap();
        assert_eq!(person.format_for_git(), "X <x@y> 1609459200 +0530");
        let reparsed = CommitPerson::parse("X <x@y> 1609459200 +0530").unwrap();
        assert_eq!(reparsed, person);
    }

    #[test]
    fn negative_timezone_formats_with_minus_sign() {
        let person = CommitPerson::new("X", "x@y", 1609459200, -330).unwrap();
        assert_eq!(person.format_for_git(), "X <x@y> 1609459200 -0530");
    }

    #[test]
    fn commit_round_trip_is_byte_identical() {
        let commit = Commit {
            tree_hash: tree_hash(),
            parent_hashes: vec![parent_hash()],
            author: CommitPerson::new("John Doe", "john@example.com", 1609459200, 0).unwrap(),
            committer: CommitPerson::new("John Doe", "john@example.com", 1609459200, 0).unwrap(),
            message: "Initial commit".to_string(),
        };
        let serialized = commit.serialize();
        let parsed = Commit::parse(&serialized).unwrap();
        assert_eq!(parsed, commit);
        assert_eq!(parsed.serialize(), serialized);
    }

    #[test]
    fn zero_parents_is_initial_commit() {
        let commit = Commit {
            tree_hash: tree_hash(),
            parent_hashes: vec![],
            author: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            committer: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            message: String::new(),
        };
        assert!(commit.is_initial());
        assert!(!commit.is_merge());
    }

    #[test]
    fn two_parents_is_merge() {
        let commit = Commit {
            tree_hash: tree_hash(),
            parent_hashes: vec![parent_hash(), parent_hash()],
            author: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            committer: CommitPerson::new("A", "a@b", 0, 0).unwrap(),
            message: String::new(),
        };
        assert!(commit.is_merge());
    }

    #[test]
    fn unknown_header_line_is_rejected() {
        let content = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\nbogus foo\n\nmsg";
        assert!(Commit::parse(content).is_err());
    }

    #[test]
    fn message_may_be_empty() {
        let content = format!("tree {}\nauthor A <a@b> 0 +0000\ncommitter A <a@b> 0 +0000\n\n", tree_hash());
        let commit = Commit::parse(content.as_bytes()).unwrap();
        assert_eq!(commit.message, "");
    }
}
