//! Configuration management for patchwright
//!
//! Stores settings in ~/.config/patchwright/config.toml

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_PATH_ENV: &str = "PATCHWRIGHT_SCHEMA_PATH";
pub const MODEL_ENV: &str = "PATCHWRIGHT_MODEL";

/// Where the bundled descriptor lives relative to a checkout or install root.
pub const DESCRIPTOR_RELATIVE_PATH: &str = "schemas/minilogue-xd/voice-parameters.json";

/// Unset limits fall back to the suggestion service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit descriptor path. Skips discovery when set.
    pub schema_path: Option<PathBuf>,
    pub model: Option<String>,
    /// Controls per group rendered into the system prompt.
    pub prompt_subset_limit: Option<usize>,
    pub max_prompt_chars: Option<usize>,
}

impl Config {
    fn sanitize(&mut self) {
        if self.prompt_subset_limit == Some(0) {
            self.prompt_subset_limit = None;
        }
        if self.max_prompt_chars == Some(0) {
            self.max_prompt_chars = None;
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            self.model = None;
        }
        if self
            .schema_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.schema_path = None;
        }
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("patchwright"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Load config from disk with environment overrides applied.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load the file at `path`, or defaults when it is missing or corrupt.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str::<Config>(&content) {
            Ok(mut config) => {
                config.sanitize();
                config
            }
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Overlay `PATCHWRIGHT_*` values. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(SCHEMA_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.schema_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model = Some(model.trim().to_string());
        }
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/patchwright/config.toml".to_string())
    }

    /// Descriptor to load: `explicit`, then the configured path, then
    /// discovery from the working and executable directories.
    pub fn resolve_schema_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit.or(self.schema_path.as_deref()) {
            return Ok(path.to_path_buf());
        }
        match discover_descriptor(&default_search_roots()) {
            Some(path) => Ok(path),
            None => bail!(
                "Could not locate '{}' from the working directory or the executable directory. \
                 Pass --schema or set {}.",
                DESCRIPTOR_RELATIVE_PATH,
                SCHEMA_PATH_ENV
            ),
        }
    }
}

/// Current directory and the directory holding the running executable.
pub fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(dir);
    }
    roots
}

/// First `DESCRIPTOR_RELATIVE_PATH` found walking up from each root in turn.
pub fn discover_descriptor(roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().find_map(|root| {
        root.ancestors()
            .map(|dir| dir.join(DESCRIPTOR_RELATIVE_PATH))
            .find(|candidate| candidate.is_file())
    })
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("toml.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
