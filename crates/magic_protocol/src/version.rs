//! Data model release tags.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a version tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Version tag is empty")]
    Empty,

    #[error("Invalid version tag \"{tag}\": component \"{component}\" is not a number")]
    InvalidComponent { tag: String, component: String },
}

/// A MagIC data model release, e.g. `2.5` or `3.0`.
///
/// Ordering compares the dotted components numerically, so `2.10` sorts after
/// `2.9`. Trailing zero components are not significant (`3` == `3.0`), but the
/// tag is displayed exactly as written.
#[derive(Debug, Clone)]
pub struct DataModelVersion {
    tag: String,
    parts: Vec<u32>,
}

impl DataModelVersion {
    /// Parse a version tag. Surrounding whitespace is ignored.
    pub fn parse(tag: &str) -> Result<Self, VersionError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = tag
            .split('.')
            .map(|component| {
                component
                    .parse::<u32>()
                    .map_err(|_| VersionError::InvalidComponent {
                        tag: tag.to_string(),
                        component: component.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
        }

        Ok(Self {
            tag: tag.to_string(),
            parts,
        })
    }

    /// The tag as it was written.
    pub fn as_str(&self) -> &str {
        &self.tag
    }
}

impl FromStr for DataModelVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DataModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl PartialEq for DataModelVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for DataModelVersion {}

impl Hash for DataModelVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for DataModelVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataModelVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl Serialize for DataModelVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag)
    }
}

impl<'de> Deserialize<'de> for DataModelVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::parse(&tag).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let v = DataModelVersion::parse(" 2.5 ").unwrap();
        assert_eq!(v.as_str(), "2.5");
        assert_eq!(v.to_string(), "2.5");
    }

    #[test]
    fn test_numeric_ordering() {
        let v29: DataModelVersion = "2.9".parse().unwrap();
        let v210: DataModelVersion = "2.10".parse().unwrap();
        let v30: DataModelVersion = "3.0".parse().unwrap();
        assert!(v29 < v210);
        assert!(v210 < v30);
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        let a: DataModelVersion = "3".parse().unwrap();
        let b: DataModelVersion = "3.0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(b.as_str(), "3.0");
    }

    #[test]
    fn test_invalid_tags() {
        assert_eq!(DataModelVersion::parse("  "), Err(VersionError::Empty));
        let err = DataModelVersion::parse("2.x").unwrap_err();
        assert!(matches!(err, VersionError::InvalidComponent { ref component, .. } if component == "x"));
        assert!(DataModelVersion::parse("2..5").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let v: DataModelVersion = serde_json::from_str("\"2.4\"").unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"2.4\"");
        assert!(serde_json::from_str::<DataModelVersion>("\"two\"").is_err());
    }
}
