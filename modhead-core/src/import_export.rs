//! Profile import and export
//!
//! Profiles are exchanged as a JSON array in the same shape they are stored
//! in. Profiles exported by the common third-party header extension can also
//! be imported; they are converted on the way in.

use serde::Deserialize;
use std::io::Read;

use crate::error::ImportError;
use crate::models::{HeaderOverride, RequestProfile, UrlFilter};

/// Reads a whole file as text, rejecting content that is not valid UTF-8
pub fn read_json_file<R: Read>(mut reader: R) -> Result<String, ImportError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| ImportError::NotText)
}

/// Serializes profiles as a pretty JSON array
pub fn export_profiles(profiles: &[RequestProfile]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(profiles)
}

/// Parses exported profiles; accepts an array or a single profile object
///
/// Ids are kept as written; the store replaces missing or colliding ids when
/// the profiles are added.
pub fn parse_profiles(json: &str) -> Result<Vec<RequestProfile>, ImportError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<RequestProfile>),
        One(RequestProfile),
    }

    let profiles = match serde_json::from_str::<OneOrMany>(json) {
        Ok(OneOrMany::Many(profiles)) => profiles,
        Ok(OneOrMany::One(profile)) => vec![profile],
        // Re-parse as an array for a precise error message
        Err(_) => serde_json::from_str::<Vec<RequestProfile>>(json)?,
    };

    if profiles.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(profiles)
}

#[derive(Debug, Deserialize)]
struct ExtensionHeader {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionUrlFilter {
    #[serde(default)]
    url_regex: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionProfile {
    #[serde(default)]
    title: String,
    #[serde(default)]
    headers: Vec<ExtensionHeader>,
    #[serde(default)]
    url_filters: Vec<ExtensionUrlFilter>,
}

fn enabled_by_default() -> bool {
    true
}

/// Parses the export format of the third-party header extension
///
/// Each entry's `title`, `headers` and `urlFilters` map onto a new profile with
/// a fresh id. Untitled entries are named by position.
pub fn parse_extension_export(json: &str) -> Result<Vec<RequestProfile>, ImportError> {
    let exported: Vec<ExtensionProfile> = serde_json::from_str(json)?;
    if exported.is_empty() {
        return Err(ImportError::Empty);
    }

    let profiles = exported
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = if entry.title.trim().is_empty() {
                format!("Profile {}", index + 1)
            } else {
                entry.title
            };
            let mut profile = RequestProfile::new(name);
            profile.headers = entry
                .headers
                .into_iter()
                .filter(|h| !h.name.trim().is_empty())
                .map(|h| HeaderOverride {
                    name: h.name,
                    value: h.value,
                    enabled: h.enabled,
                })
                .collect();
            profile.url_filters = entry
                .url_filters
                .into_iter()
                .filter(|f| !f.url_regex.trim().is_empty())
                .map(|f| UrlFilter {
                    pattern: f.url_regex,
                    enabled: f.enabled,
                })
                .collect();
            profile
        })
        .collect();

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_file_returns_text_verbatim() {
        let content = read_json_file(r#"{"x":1}"#.as_bytes()).unwrap();
        assert_eq!(content, r#"{"x":1}"#);
    }

    #[test]
    fn test_read_json_file_rejects_binary() {
        let bytes: &[u8] = &[0xff, 0xfe, 0x00, 0x80];
        let err = read_json_file(bytes).unwrap_err();
        assert!(matches!(err, ImportError::NotText));
        assert_eq!(err.to_string(), "File content is not text");
    }

    #[test]
    fn test_export_then_parse_keeps_order() {
        let mut a = RequestProfile::with_id("a", "Alpha");
        a.headers.push(HeaderOverride::new("X-A", "1"));
        let b = RequestProfile::with_id("b", "Beta");

        let json = export_profiles(&[a.clone(), b.clone()]).unwrap();
        assert!(json.contains("urlFilters"));
        assert_eq!(parse_profiles(&json).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_parse_single_object() {
        let profiles = parse_profiles(r#"{"id": "solo", "name": "Solo"}"#).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, "solo");
    }

    #[test]
    fn test_parse_rejects_invalid_and_empty() {
        assert!(matches!(
            parse_profiles("not json").unwrap_err(),
            ImportError::InvalidJson(_)
        ));
        assert!(matches!(parse_profiles("[]").unwrap_err(), ImportError::Empty));
    }

    #[test]
    fn test_parse_extension_export() {
        let json = r#"[
            {
                "title": "Staging",
                "headers": [
                    {"name": "X-Env", "value": "staging", "enabled": true},
                    {"name": "", "value": "dropped"},
                    {"name": "X-Debug", "value": "1", "enabled": false}
                ],
                "urlFilters": [{"urlRegex": "||staging.example.com"}]
            },
            {"headers": []}
        ]"#;

        let profiles = parse_extension_export(json).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Staging");
        assert_eq!(profiles[0].headers.len(), 2);
        assert!(!profiles[0].headers[1].enabled);
        assert_eq!(profiles[0].url_filters[0].pattern, "||staging.example.com");
        assert_eq!(profiles[1].name, "Profile 2");
        assert_ne!(profiles[0].id, profiles[1].id);
    }
}
