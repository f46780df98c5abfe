//! Configuration file support
//!
//! Loads settings from ~/.relex.toml (or %USERPROFILE%\.relex.toml on Windows)
//!
//! Example:
//! ```toml
//! max-line-length = 20000
//! rehighlight-batch = 128
//!
//! [extensions]
//! h = "cpp"
//! conf = "sh"
//!
//! [theme]
//! Comment = "green italic"
//! Error = "white on red bold"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{RelexError, Result};
use crate::syntax::{Color, Format, Language, Style, DEFAULT_MAX_LINE_LENGTH};

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Lines longer than this are not highlighted
    pub max_line_length: usize,
    /// Deferred relex tasks run per pump
    pub rehighlight_batch: usize,
    /// File extension to language name overrides
    pub extensions: HashMap<String, String>,
    /// Format name to style overrides
    pub theme: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            rehighlight_batch: 64,
            extensions: HashMap::new(),
            theme: HashMap::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".relex.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".relex.toml"))
        }
    }

    /// Load configuration from file
    ///
    /// Never fails: a missing file gives the defaults, a broken one is
    /// reported and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };
        match Self::load_from(&path) {
            Ok(Some(config)) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Ok(None) => Config::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring configuration");
                Config::default()
            }
        }
    }

    /// Load from `path`; `None` if there is no such file
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.max_line_length = config.max_line_length.clamp(256, 1_000_000);
        config.rehighlight_batch = config.rehighlight_batch.max(1);
        Ok(config)
    }

    /// Language for a file: extension overrides first, then detection
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
        let overridden = ext
            .and_then(|ext| self.extensions.get(&ext))
            .and_then(|name| match Language::from_name(name) {
                Ok(lang) => Some(lang),
                Err(e) => {
                    warn!(error = %e, "bad extension override");
                    None
                }
            });
        overridden.or_else(|| Language::detect(path))
    }

    /// Parse the theme overrides
    pub fn theme_styles(&self) -> Result<HashMap<Format, Style>> {
        self.theme
            .iter()
            .map(|(name, spec)| {
                let format = Format::from_name(name).ok_or_else(|| RelexError::UnknownFormat(name.clone()))?;
                Ok((format, parse_style(spec)?))
            })
            .collect()
    }
}

/// Parse a style like `"bright-red on black bold"`
pub fn parse_style(spec: &str) -> Result<Style> {
    let mut style = Style::default();
    let mut words = spec.split_whitespace();
    while let Some(word) = words.next() {
        match word.to_lowercase().as_str() {
            "bold" => style.bold = true,
            "italic" => style.italic = true,
            "underline" => style.underline = true,
            "reverse" => style.reverse = true,
            "on" => {
                let name = words.next().unwrap_or_default();
                style.bg = Color::from_name(name).ok_or_else(|| RelexError::UnknownColor(name.to_string()))?;
            }
            _ => {
                style.fg = Color::from_name(word).ok_or_else(|| RelexError::UnknownColor(word.to_string()))?;
            }
        }
    }
    Ok(style)
}
