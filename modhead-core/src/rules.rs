//! Header override rules
//!
//! Profiles are compiled into a flat, ordered list of [`OverrideRule`]s, the
//! form the host network layer consumes. Rules carry a subset of the browser's
//! declarative URL filter syntax:
//!
//! - `*` matches any run of characters
//! - a leading `|` anchors the pattern at the start of the URL
//! - a leading `||` anchors the pattern at a domain boundary of the host
//! - a trailing `|` anchors the pattern at the end of the URL
//!
//! Without anchors a pattern matches anywhere in the URL. Matching ignores case.

use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::models::{PauseFlag, RequestProfile};

/// What a rule does to its header
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeaderOperation {
    Set,
    Remove,
}

/// A single compiled header rewrite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideRule {
    pub id: u32,
    /// Higher priorities are applied later and therefore win
    pub priority: u32,
    pub profile_id: String,
    pub header: String,
    pub operation: HeaderOperation,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "urlFilter", skip_serializing_if = "Option::is_none")]
    pub url_filter: Option<String>,
}

impl OverrideRule {
    /// Returns true if this rule applies to `url`
    pub fn matches(&self, url: &str) -> bool {
        match &self.url_filter {
            None => true,
            Some(pattern) => url_filter_matches(pattern, url),
        }
    }
}

/// Compiles the rule set for the current state; paused state yields no rules
pub fn compile_rules(profiles: &[RequestProfile], pause: PauseFlag) -> Vec<OverrideRule> {
    if pause.is_paused() {
        return Vec::new();
    }

    let mut rules = Vec::new();
    let mut next_id = 1;

    for (index, profile) in profiles.iter().enumerate() {
        if !profile.enabled {
            continue;
        }
        let priority = index as u32 + 1;
        let filters: Vec<Option<String>> = {
            let active: Vec<_> = profile
                .active_url_filters()
                .map(|f| Some(f.pattern.trim().to_string()))
                .collect();
            if active.is_empty() {
                vec![None]
            } else {
                active
            }
        };

        for header in profile.active_headers() {
            let operation = if header.value.is_empty() {
                HeaderOperation::Remove
            } else {
                HeaderOperation::Set
            };
            for filter in &filters {
                rules.push(OverrideRule {
                    id: next_id,
                    priority,
                    profile_id: profile.id.clone(),
                    header: header.name.trim().to_string(),
                    operation,
                    value: header.value.clone(),
                    url_filter: filter.clone(),
                });
                next_id += 1;
            }
        }
    }

    rules
}

/// Rewrites `headers` for a request to `url`
///
/// Header names compare case-insensitively. Rules are applied in ascending
/// priority order, so a later profile overrides an earlier one.
pub fn apply_rules(
    rules: &[OverrideRule],
    url: &str,
    headers: &[(String, String)],
) -> Vec<(String, String)> {
    let mut result = headers.to_vec();

    let mut matching: Vec<&OverrideRule> = rules.iter().filter(|r| r.matches(url)).collect();
    matching.sort_by_key(|r| (r.priority, r.id));

    for rule in matching {
        result.retain(|(name, _)| !name.eq_ignore_ascii_case(&rule.header));
        if rule.operation == HeaderOperation::Set {
            result.push((rule.header.clone(), rule.value.clone()));
        }
    }

    result
}

/// Tests a URL filter pattern against a URL
pub fn url_filter_matches(pattern: &str, url: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();

    if pattern.is_empty() {
        return true;
    }

    let (body, end_anchor) = match pattern.strip_suffix('|') {
        Some(rest) if !rest.is_empty() && !rest.ends_with('|') => (rest, true),
        _ => (pattern.as_str(), false),
    };

    if let Some(rest) = body.strip_prefix("||") {
        return domain_matches(rest, end_anchor, url);
    }

    let url = url.to_ascii_lowercase();
    match body.strip_prefix('|') {
        Some(rest) => wildcard_matches(rest, true, end_anchor, &url),
        None => wildcard_matches(body, false, end_anchor, &url),
    }
}

/// Matches a `||` pattern starting at each label of the parsed host
///
/// The text tried from a label runs from that label through the port, path,
/// query and fragment, so credentials in the URL never take part.
/// Unparsable URLs and URLs without a host do not match.
fn domain_matches(pattern: &str, end_anchor: bool, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let after_host = parsed[Position::AfterHost..].to_ascii_lowercase();

    let label_starts = std::iter::once(0).chain(host.match_indices('.').map(|(i, _)| i + 1));
    for start in label_starts {
        let text = format!("{}{}", &host[start..], after_host);
        if wildcard_matches(pattern, true, end_anchor, &text) {
            return true;
        }
    }
    false
}

/// Glob match where `*` is the only wildcard
///
/// Unanchored sides behave as if the pattern were padded with `*`. Runs in
/// O(pattern * text) by resuming from the most recent star instead of
/// backtracking through every earlier one.
fn wildcard_matches(pattern: &str, start_anchor: bool, end_anchor: bool, text: &str) -> bool {
    let mut glob = Vec::with_capacity(pattern.len() + 2);
    if !start_anchor {
        glob.push(b'*');
    }
    glob.extend_from_slice(pattern.as_bytes());
    if !end_anchor {
        glob.push(b'*');
    }
    let text = text.as_bytes();

    let (mut p, mut t) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(p) {
            Some(&b'*') => {
                last_star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match last_star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    last_star = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    glob[p..].iter().all(|&c| c == b'*')
}
