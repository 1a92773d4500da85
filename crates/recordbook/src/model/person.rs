//! Key programmers and key users of a program.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which list of people on a program an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    /// A key programmer.
    Programmer,
    /// A key user.
    User,
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Programmer => write!(f, "programmer"),
            Self::User => write!(f, "user"),
        }
    }
}

impl FromStr for PersonRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "programmer" => Ok(Self::Programmer),
            "user" => Ok(Self::User),
            other => Err(Error::validation(format!("unknown person role: {other}"))),
        }
    }
}

/// An insertion-ordered set of trimmed, non-blank names.
///
/// Matching is case-sensitive after trimming. Serialized as a plain list;
/// deserialization goes through [`PersonSet::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PersonSet {
    names: Vec<String>,
}

impl PersonSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Add `name` unless it is blank or already present.
    ///
    /// Returns `true` if the set changed.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Remove `name` if present.
    ///
    /// Returns `true` if the set changed.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        self.names.len() != before
    }

    /// Whether `name` (after trimming) is a member.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|existing| existing == name)
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for PersonSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl From<Vec<String>> for PersonSet {
    fn from(names: Vec<String>) -> Self {
        names.iter().map(String::as_str).collect()
    }
}

impl From<PersonSet> for Vec<String> {
    fn from(set: PersonSet) -> Self {
        set.names
    }
}

/// Parses the legacy comma-separated form, e.g. `"Jane Doe, John Roe"`.
impl FromStr for PersonSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',').collect())
    }
}

impl fmt::Display for PersonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates_after_trim() {
        let mut set = PersonSet::new();
        assert!(set.insert("Jane Doe"));
        assert!(!set.insert("  Jane Doe "));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Jane Doe"]);
    }

    #[test]
    fn test_insert_is_case_sensitive() {
        let mut set = PersonSet::new();
        set.insert("jane");
        set.insert("Jane");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_ignores_blank() {
        let mut set = PersonSet::new();
        assert!(!set.insert("   "));
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut set: PersonSet = "Jane Doe".parse().unwrap();
        assert!(!set.remove("John Roe"));
        assert!(set.remove(" Jane Doe"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_parse_legacy_list() {
        let set: PersonSet = "Jane Doe, John Roe,,Jane Doe , ".parse().unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Jane Doe", "John Roe"]);
        assert_eq!(set.to_string(), "Jane Doe, John Roe");
    }

    #[test]
    fn test_serializes_as_list() {
        let set: PersonSet = "a, b".parse().unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_deserialize_trims_and_deduplicates() {
        let set: PersonSet =
            serde_json::from_str(r#"["Jane Doe","Jane Doe"," Jane Doe ","","John Roe"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "Jane Doe, John Roe");
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("programmer".parse::<PersonRole>().unwrap(), PersonRole::Programmer);
        assert_eq!(" user ".parse::<PersonRole>().unwrap(), PersonRole::User);
        assert!("manager".parse::<PersonRole>().unwrap_err().is_validation());
        assert_eq!(PersonRole::User.to_string(), "user");
    }
}
