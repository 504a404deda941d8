//! Input envelope handed to adapters

/// An immutable payload together with its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    payload: String,
    mime_type: String,
}

impl Content {
    pub fn new(payload: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Compare a declared MIME type against a supported one, ignoring
/// parameters (`;charset=...`), surrounding whitespace and case.
pub fn mime_matches(declared: &str, supported: &str) -> bool {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case(supported)
}
