use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::core::constants::{DEFAULT_HOST, WS_PATH};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Chat server `host[:port]`; the endpoint becomes `ws://<host>/ws`
    pub host: Option<String>,
    /// Full endpoint URL, overrides `host`
    pub url: Option<String>,
    /// Enable markdown rendering in the chat area
    pub markdown: Option<bool>,
    /// Enable syntax highlighting for fenced code blocks when markdown is enabled
    pub syntax: Option<bool>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
}

/// Keys accepted by `tether set` and `tether unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Host,
    Url,
    Markdown,
    Syntax,
    Theme,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Host,
        ConfigKey::Url,
        ConfigKey::Markdown,
        ConfigKey::Syntax,
        ConfigKey::Theme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Host => "host",
            ConfigKey::Url => "url",
            ConfigKey::Markdown => "markdown",
            ConfigKey::Syntax => "syntax",
            ConfigKey::Theme => "theme",
        }
    }

    pub fn parse(key: &str) -> Result<Self, SettingError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(key.trim()))
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue { key: ConfigKey, value: String },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
                write!(
                    f,
                    "Unknown config key '{key}'. Known keys: {}",
                    known.join(", ")
                )
            }
            SettingError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{value}' for {}", key.as_str())
            }
        }
    }
}

impl StdError for SettingError {}

#[derive(Debug)]
pub enum EndpointError {
    Invalid {
        endpoint: String,
        source: url::ParseError,
    },
    /// Only `ws` and `wss` endpoints can carry the chat protocol.
    UnsupportedScheme(String),
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::Invalid { endpoint, source } => {
                write!(f, "Invalid endpoint '{endpoint}': {source}")
            }
            EndpointError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported endpoint scheme '{scheme}', expected ws or wss")
            }
        }
    }
}

impl StdError for EndpointError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EndpointError::Invalid { source, .. } => Some(source),
            EndpointError::UnsupportedScheme(_) => None,
        }
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

fn parse_toggle(key: ConfigKey, value: &str) -> Result<bool, SettingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(SettingError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

impl Config {
    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax.unwrap_or(true)
    }

    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Resolves the WebSocket endpoint. An explicit `url` wins over `host`.
    pub fn endpoint(&self) -> Result<Url, EndpointError> {
        let raw = match &self.url {
            Some(url) => url.trim().to_string(),
            None => format!("ws://{}{}", self.host_or_default().trim(), WS_PATH),
        };
        let url = Url::parse(&raw).map_err(|source| EndpointError::Invalid {
            endpoint: raw.clone(),
            source,
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), SettingError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SettingError::InvalidValue {
                key,
                value: value.to_string(),
            });
        }
        match key {
            ConfigKey::Host => self.host = Some(trimmed.to_string()),
            ConfigKey::Url => self.url = Some(trimmed.to_string()),
            ConfigKey::Markdown => self.markdown = Some(parse_toggle(key, trimmed)?),
            ConfigKey::Syntax => self.syntax = Some(parse_toggle(key, trimmed)?),
            ConfigKey::Theme => {
                let theme = trimmed.to_ascii_lowercase();
                if crate::ui::theme::Theme::by_name(&theme).is_none() {
                    return Err(SettingError::InvalidValue {
                        key,
                        value: value.to_string(),
                    });
                }
                self.theme = Some(theme);
            }
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Host => self.host = None,
            ConfigKey::Url => self.url = None,
            ConfigKey::Markdown => self.markdown = None,
            ConfigKey::Syntax => self.syntax = None,
            ConfigKey::Theme => self.theme = None,
        }
    }
}
