//! Inbound body shape detection.
//!
//! The body is only inspected for which well-known keys are present; values
//! are never validated or transformed. A key is present when it appears in the
//! top-level JSON object, even with a `null` value. Values are skipped
//! unparsed, so out-of-range numbers or lone surrogates in them do not hide
//! the keys.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;

use crate::routing::UpstreamPath;

/// Key carried only by login payloads.
const LOGIN_KEY: &str = "LoginType";

/// Keys carried by registration payloads.
const REGISTRATION_KEYS: [&str; 2] = ["FullName", "UserName"];

/// Recognised shapes of an inbound JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Object with a `LoginType` key.
    Login,
    /// Object with a `FullName` or `UserName` key (and no `LoginType`).
    Registration,
    /// Anything else, including malformed JSON and non-object values.
    Unrecognized,
}

impl BodyShape {
    /// Classify a raw body. Parse failures classify as [`BodyShape::Unrecognized`].
    pub fn sniff(body: &[u8]) -> Self {
        let Ok(fields) = serde_json::from_slice::<BTreeMap<String, IgnoredAny>>(body) else {
            return BodyShape::Unrecognized;
        };

        if fields.contains_key(LOGIN_KEY) {
            BodyShape::Login
        } else if REGISTRATION_KEYS.iter().any(|key| fields.contains_key(*key)) {
            BodyShape::Registration
        } else {
            BodyShape::Unrecognized
        }
    }

    /// Upstream path implied by this shape, if any.
    pub fn upstream_path(self) -> Option<UpstreamPath> {
        match self {
            BodyShape::Login => Some(UpstreamPath::Login),
            BodyShape::Registration => Some(UpstreamPath::Register),
            BodyShape::Unrecognized => None,
        }
    }
}
