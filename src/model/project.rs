//! Project model for ptsync.
//!
//! A project pairs a remote ParaTranz project id with the local locale
//! directory its files live in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("Invalid project id: {s}"))
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A remote project bound to the local locale directory it translates into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Locale directory name under the base directory (e.g. `zh-HANS`).
    pub locale: String,
}

impl Project {
    pub fn new(id: ProjectId, locale: impl Into<String>) -> Self {
        Self {
            id,
            locale: locale.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_parse() {
        assert_eq!("9588".parse::<ProjectId>(), Ok(ProjectId(9588)));
        assert_eq!(" 42 ".parse::<ProjectId>(), Ok(ProjectId(42)));
        assert!("abc".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_project_id_serializes_as_number() {
        let json = serde_json::to_string(&ProjectId(9797)).unwrap();
        assert_eq!(json, "9797");
    }
}
