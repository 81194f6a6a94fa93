//! Raw birthday entries from async listing payloads.
//!
//! Payload contract (`async-birthdays-v1`):
//!
//! - the body may start with the `for (;;);` anti-hijacking guard;
//! - the rest is JSON carrying one or more `{"__html": "..."}` blobs anywhere
//!   in the tree;
//! - each birthday inside a blob is an element with `class="_43q7"` holding,
//!   in order, a profile `href`, a `data-tooltip-content` and an `<img>`
//!   whose `alt` is the display name.
//!
//! Every `_43q7` marker must produce a complete match. A partial match means
//! the markup changed and is reported as a structural error instead of
//! silently dropping friends.

use std::sync::LazyLock;

use friendcal_core::decode_entities;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Prefix upstream puts in front of JSON responses.
pub const GUARD_PREFIX: &str = "for (;;);";

const ENTRY_MARKER: &str = r#"class="_43q7""#;

const PROFILE_ID_PREFIX: &str = "profile.php?id=";

static ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)class="_43q7".*?href="https://www\.facebook\.com/(.*?)".*?data-tooltip-content="(.*?)">.*?alt="(.*?)".*?/>"#,
    )
    .expect("Invalid birthday entry regex")
});

/// Removes the anti-hijacking guard if present.
pub fn strip_guard_prefix(payload: &str) -> &str {
    payload.strip_prefix(GUARD_PREFIX).unwrap_or(payload)
}

/// Strips the guard and parses the remaining JSON.
pub fn decode_guarded_json(payload: &str, what: &str) -> ProviderResult<Value> {
    serde_json::from_str(strip_guard_prefix(payload)).map_err(|e| {
        debug!(payload, "undecodable payload");
        ProviderError::invalid_response(format!("{what} is not valid JSON: {e}")).with_source(e)
    })
}

/// How an entry refers to the person's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileToken {
    /// Numeric identifier, usable as-is.
    Id(String),
    /// Custom slug that must be resolved to an identifier.
    Vanity(String),
}

impl ProfileToken {
    /// Classifies the path after the site root.
    pub fn parse(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix(PROFILE_ID_PREFIX) {
            let id: String = rest.chars().take_while(char::is_ascii_digit).collect();
            if !id.is_empty() {
                return Self::Id(id);
            }
        }
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            return Self::Id(token.to_string());
        }
        let vanity = token.split(['?', '/']).next().unwrap_or(token);
        Self::Vanity(vanity.to_string())
    }
}

/// One birthday entry before date normalization and alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub token: ProfileToken,
    /// Tooltip text, entity-decoded, still carrying the name and marks.
    pub tooltip: String,
    pub name: String,
}

/// Extracts every birthday entry from an async listing payload.
///
/// # Errors
///
/// Returns an invalid-response error when the payload is not JSON, holds no
/// HTML blob, or has a marker that does not yield a complete entry.
pub fn extract_entries(payload: &str) -> ProviderResult<Vec<RawEntry>> {
    let json = decode_guarded_json(payload, "birthday listing")?;

    let mut blobs = Vec::new();
    collect_html(&json, &mut blobs);
    if blobs.is_empty() {
        debug!(payload, "no __html blob in birthday listing");
        return Err(ProviderError::invalid_response(
            "birthday listing has no __html content",
        ));
    }

    let mut entries = Vec::new();
    let mut markers = 0;
    for html in blobs {
        markers += html.matches(ENTRY_MARKER).count();
        entries.extend(ENTRY_REGEX.captures_iter(html).map(|caps| RawEntry {
            token: ProfileToken::parse(&decode_entities(&caps[1])),
            tooltip: decode_entities(&caps[2]),
            name: decode_entities(&caps[3]),
        }));
    }

    if markers != entries.len() {
        debug!(payload, markers, matched = entries.len(), "entry count mismatch");
        return Err(ProviderError::invalid_response(format!(
            "found {markers} birthday markers but parsed {} entries",
            entries.len()
        )));
    }

    debug!(count = entries.len(), "extracted birthday entries");
    Ok(entries)
}

fn collect_html<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("__html", Value::String(html)) => out.push(html),
                    _ => collect_html(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_html(item, out)),
        _ => {}
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::json;

    pub fn entry_html(token: &str, tooltip: &str, name: &str) -> String {
        format!(
            r#"<li class="_43q7"><a href="https://www.facebook.com/{token}" data-hovercard="x"><div data-tooltip-content="{tooltip}"><img class="img" src="p.jpg" alt="{name}" /></div></a></li>"#
        )
    }

    /// Wraps HTML the way the async endpoint does.
    pub fn listing(html: &str) -> String {
        let body = json!({
            "__ar": 1,
            "payload": null,
            "domops": [["replace", "#birthdays_monthly", false, {"__html": html}]],
        });
        format!("for (;;);{body}")
    }
}
