use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static GUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:\{[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\}",
        r"|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})$",
    ))
    .expect("GUID pattern is a valid regex")
});

/// Opaque owner of a credential pair.
///
/// Stored verbatim, braces included, so lookups by user compare the exact
/// string the pair was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserGuid(pub String);

impl UserGuid {
    /// 8-4-4-4-12 hex groups, optionally wrapped in one pair of braces.
    pub fn is_well_formed(candidate: &str) -> bool {
        GUID_PATTERN.is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserGuid {
    fn from(value: &str) -> Self {
        UserGuid(value.to_string())
    }
}
