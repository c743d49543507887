use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single header rewrite applied to matching requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderOverride {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl HeaderOverride {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// A URL pattern restricting where a profile's overrides apply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlFilter {
    pub pattern: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl UrlFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            enabled: true,
        }
    }
}

/// A named, user-defined set of header overrides and URL filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestProfile {
    /// Stable identity; generated as a UUID v4 string for new profiles
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub headers: Vec<HeaderOverride>,
    #[serde(default, rename = "urlFilters", alias = "url_filters")]
    pub url_filters: Vec<UrlFilter>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RequestProfile {
    /// Creates an enabled, empty profile with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_profile_id(),
            name: name.into(),
            headers: Vec::new(),
            url_filters: Vec::new(),
            enabled: true,
        }
    }

    /// Creates a profile with an explicit id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(name)
        }
    }

    /// Headers that will actually be sent
    pub fn active_headers(&self) -> impl Iterator<Item = &HeaderOverride> {
        self.headers
            .iter()
            .filter(|h| h.enabled && !h.name.trim().is_empty())
    }

    /// Filters that restrict this profile; empty means "every URL"
    pub fn active_url_filters(&self) -> impl Iterator<Item = &UrlFilter> {
        self.url_filters
            .iter()
            .filter(|f| f.enabled && !f.pattern.trim().is_empty())
    }
}

/// Generates a new unique profile id
pub fn generate_profile_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

/// Global state of override application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PauseFlag {
    /// Overrides are applied
    #[default]
    Active,
    /// Overrides are suspended; requests pass through unmodified
    Paused,
}

impl PauseFlag {
    pub fn from_paused(is_paused: bool) -> Self {
        if is_paused {
            PauseFlag::Paused
        } else {
            PauseFlag::Active
        }
    }

    pub fn is_paused(self) -> bool {
        self == PauseFlag::Paused
    }

    pub fn toggled(self) -> Self {
        match self {
            PauseFlag::Active => PauseFlag::Paused,
            PauseFlag::Paused => PauseFlag::Active,
        }
    }
}

impl fmt::Display for PauseFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseFlag::Active => write!(f, "Active"),
            PauseFlag::Paused => write!(f, "Paused"),
        }
    }
}

/// Tab shown in the profile actions panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileActionsTab {
    #[default]
    Headers,
    UrlFilters,
}

impl fmt::Display for ProfileActionsTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileActionsTab::Headers => write!(f, "headers"),
            ProfileActionsTab::UrlFilters => write!(f, "url-filters"),
        }
    }
}

/// Visibility of the import/export dialogs; the flags are independent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalState {
    pub export_open: bool,
    pub import_open: bool,
    pub import_from_extension_open: bool,
}
