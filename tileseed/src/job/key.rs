//! Job identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the tileset a seeding job belongs to.
///
/// Keys become part of lock file names, so only ASCII alphanumerics, `-`
/// and `_` are accepted. Numeric ids from the registry are accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawKey", into = "String")]
pub struct JobKey(String);

impl JobKey {
    /// Create a key, validating that it is safe to embed in a file name.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidJobKey> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw.len() <= 128
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidJobKey(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for JobKey {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobKey {
    type Err = InvalidJobKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<JobKey> for String {
    fn from(key: JobKey) -> Self {
        key.0
    }
}

/// Registry ids may be stored as JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawKey {
    Number(u64),
    Text(String),
}

impl TryFrom<RawKey> for JobKey {
    type Error = InvalidJobKey;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        match raw {
            RawKey::Number(n) => Ok(JobKey::from(n)),
            RawKey::Text(s) => JobKey::new(s),
        }
    }
}

/// Rejected job key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job key '{0}': use 1-128 ASCII letters, digits, '-' or '_'")]
pub struct InvalidJobKey(pub String);
