//! User configuration.
//!
//! Read from `~/.cadmium/config.json`. Every field is optional; a missing file
//! means all defaults. The auth token can also come from `CADMIUM_TOKEN`,
//! which wins over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};

pub const TOKEN_ENV: &str = "CADMIUM_TOKEN";

/// Single-character bindings for the chat view's mode keys.
///
/// Arrow keys, escape, enter and backspace are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub compose: char,
    pub select: char,
    pub reply: char,
    pub attachments: char,
    pub open: char,
    pub copy: char,
    pub quit: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            compose: 'i',
            select: 's',
            reply: 'r',
            attachments: 'a',
            open: 'o',
            copy: 'c',
            quit: 'q',
        }
    }
}

impl KeyBindings {
    fn all(&self) -> [(&'static str, char); 7] {
        [
            ("compose", self.compose),
            ("select", self.select),
            ("reply", self.reply),
            ("attachments", self.attachments),
            ("open", self.open),
            ("copy", self.copy),
            ("quit", self.quit),
        ]
    }

    /// Reject bindings that would make two actions indistinguishable.
    pub fn validate(&self) -> Result<()> {
        let all = self.all();
        for (i, (name, key)) in all.iter().enumerate() {
            if key.is_control() || key.is_whitespace() {
                bail!("key for `{name}` must be a printable character");
            }
            if let Some((other, _)) = all[i + 1..].iter().find(|(_, k)| k == key) {
                bail!("`{name}` and `{other}` are both bound to `{key}`");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub token: Option<String>,
    pub api_base: String,
    /// Initial history limit, and how much it grows when scrolling past it.
    pub history_step: usize,
    /// Frames before a channel's messages are refetched.
    pub refresh_frames: u32,
    /// Frame period in milliseconds.
    pub tick_ms: u64,
    pub request_timeout_secs: u64,
    pub keys: KeyBindings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://discordapp.com/api/v9".to_string(),
            history_step: 50,
            refresh_frames: 500,
            tick_ms: 50,
            request_timeout_secs: 30,
            keys: KeyBindings::default(),
        }
    }
}

impl Config {
    /// Replace the token when an override is present and non-empty.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
        self
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `~/.cadmium`, falling back to the current directory without `$HOME`.
pub fn data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".cadmium")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        serde_json::from_str(&raw).with_context(|| format!("Invalid config JSON at {}", path.display()))?;
    config
        .keys
        .validate()
        .with_context(|| format!("Invalid key bindings in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load(&dir.path().join("config.json"))?;
        assert_eq!(config, Config::default());
        assert_eq!(config.history_step, 50);
        assert_eq!(config.refresh_frames, 500);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"token": "abc", "keys": {"quit": "x"}}"#)?;
        let config = load(&path)?;
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.keys.quit, 'x');
        assert_eq!(config.keys.reply, 'r');
        assert_eq!(config.tick_ms, 50);
        Ok(())
    }

    #[test]
    fn test_duplicate_bindings_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"keys": {"open": "c"}}"#)?;
        let err = load(&path).err().map(|e| format!("{e:#}"));
        assert!(err.is_some_and(|e| e.contains("`open` and `copy`")));
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json")?;
        assert!(load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_token_override() {
        let base = Config { token: Some("file".into()), ..Config::default() };
        assert_eq!(base.clone().with_token_override(None).token.as_deref(), Some("file"));
        assert_eq!(base.clone().with_token_override(Some("  ".into())).token.as_deref(), Some("file"));
        assert_eq!(base.with_token_override(Some("env\n".into())).token.as_deref(), Some("env"));
    }
}
