use std::collections::BTreeMap;
use std::path::Path;

use crate::error::GitError;

/// Minimal `.git/config` reader/writer: section headers, `key = value`
/// lines, `;`/`#` comments. Only `[user]` and `[core]` are consulted by
/// this crate; everything else is preserved verbatim so `init`-written
/// files stay a complete, Git-readable config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config, GitError> {
        let text = match std::fs::read_to_string(path.as_ref()) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::new()),
            Err(e) => return Err(GitError::Io(e)),
        };
        let mut config = Config::new();
        let mut current_section = String::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(stripped) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                current_section = stripped.trim().to_string();
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config
                    .sections
                    .entry(current_section.clone())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GitError> {
        let mut out = String::new();
        for (section, entries) in &self.sections {
            out.push_str(&format!("[{section}]\n"));
            for (key, value) in entries {
                out.push_str(&format!("\t{key} = {value}\n"));
            }
        }
        std::fs::write(path, out)?;
        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn user_name(&self) -> Option<&str> {
        self.get("user", "name")
    }

    pub fn user_email(&self) -> Option<&str> {
        self.get("user", "email")
    }

    /// The default layout `init` writes: `[core] repositoryformatversion = 0`,
    /// `filemode = true`, `bare = false`.
    pub fn default_core() -> Config {
        let mut config = Config::new();
        config.set("core", "repositoryformatversion", "0");
        config.set("core", "filemode", "true");
        config.set("core", "bare", "false");
        config
    }
}
