//! Java version parsing and range checks.
//!
//! Versions are dot-separated integer tuples. Comparison zero-pads the shorter
//! tuple, so `11`, `11.0` and `11.0.0` are all equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A version string that could not be turned into a numeric tuple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version string: {0:?}")]
pub struct VersionParseError(pub String);

/// Numeric version tuple of a Java runtime (e.g. `17.0.2`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JavaVersion {
    parts: Vec<u32>,
}

impl JavaVersion {
    /// Parse a version as reported by a runtime or written in settings.
    ///
    /// Build metadata and pre-release tags are dropped, so `17.0.2+8` parses
    /// as `17.0.2` and `21-ea` as `21`. Only the leading numeric portion of
    /// each component is kept and parsing stops at the first component
    /// without a leading digit. The legacy `1.x` scheme is folded onto the
    /// modern one (`1.8.0_292` becomes `8.0.292`). A trailing `x` stands for
    /// any later update, as in `21.x`.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim().trim_matches('"');
        let release = trimmed.split(['+', '-']).next().unwrap_or_default();
        let mut parts = Vec::new();

        for component in release.split(['.', '_']) {
            if component.eq_ignore_ascii_case("x") && !parts.is_empty() {
                parts.push(u32::MAX);
                break;
            }
            let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            let value = digits
                .parse::<u32>()
                .map_err(|_| VersionParseError(input.to_string()))?;
            parts.push(value);
        }

        if parts.is_empty() {
            return Err(VersionParseError(input.to_string()));
        }

        if parts.len() >= 2 && parts[0] == 1 {
            parts.remove(0);
        }

        Ok(Self { parts })
    }

    /// Version consisting of a single feature release, e.g. `17`.
    pub fn from_major(major: u32) -> Self {
        Self { parts: vec![major] }
    }

    /// Inclusive ceiling covering every update of a feature release, so a
    /// maximum of `21` still admits `21.0.5`. Written as `21.x`.
    pub fn feature_ceiling(major: u32) -> Self {
        Self {
            parts: vec![major, u32::MAX],
        }
    }

    /// Leading component (the feature release for modern runtimes).
    pub fn major(&self) -> u32 {
        self.parts[0]
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }
}

impl Ord for JavaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for JavaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for JavaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for JavaVersion {}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|&part| {
                if part == u32::MAX {
                    "x".to_string()
                } else {
                    part.to_string()
                }
            })
            .collect();
        write!(f, "{}", rendered.join("."))
    }
}

impl FromStr for JavaVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JavaVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JavaVersion> for String {
    fn from(value: JavaVersion) -> Self {
        value.to_string()
    }
}

/// Inclusive range check: `min <= version <= max`.
pub fn is_compatible(version: &JavaVersion, min: &JavaVersion, max: &JavaVersion) -> bool {
    min <= version && version <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> JavaVersion {
        JavaVersion::parse(s).unwrap()
    }

    #[test]
    fn test_compatible_within_range() {
        assert!(is_compatible(&v("11.0.2"), &v("11"), &v("21")));
        assert!(!is_compatible(&v("22"), &v("11"), &v("21")));
        assert!(!is_compatible(&v("10.0.9"), &v("11"), &v("21")));
    }

    #[test]
    fn test_compatible_is_reflexive_at_bounds() {
        assert!(is_compatible(&v("11"), &v("11"), &v("21")));
        assert!(is_compatible(&v("21"), &v("11"), &v("21")));
        assert!(is_compatible(&v("21.0.0"), &v("11"), &v("21")));
    }

    #[test]
    fn test_upper_bound_counts_patch_releases() {
        // 21.0.3 is above the tuple 21.0.0
        assert!(!is_compatible(&v("21.0.3"), &v("11"), &v("21")));
        assert!(is_compatible(&v("21.0.3"), &v("11"), &v("21.99")));
        assert!(is_compatible(
            &v("21.0.3"),
            &v("11"),
            &JavaVersion::feature_ceiling(21)
        ));
        assert!(!is_compatible(
            &v("22"),
            &v("11"),
            &JavaVersion::feature_ceiling(21)
        ));
    }

    #[test]
    fn test_feature_ceiling_written_as_x() {
        let ceiling = JavaVersion::feature_ceiling(21);
        assert_eq!(ceiling.to_string(), "21.x");
        assert_eq!(v("21.x"), ceiling);
        assert!(JavaVersion::parse("x").is_err());
    }

    #[test]
    fn test_zero_padding_equality() {
        assert_eq!(v("17"), v("17.0.0"));
        assert!(v("17.0.1") > v("17"));
    }

    #[test]
    fn test_parse_vendor_suffixes() {
        assert_eq!(v("17.0.2+8").parts(), &[17, 0, 2]);
        assert_eq!(v("21-ea").parts(), &[21]);
        assert_eq!(v("\"11.0.19\"").parts(), &[11, 0, 19]);
    }

    #[test]
    fn test_parse_legacy_scheme() {
        let legacy = v("1.8.0_292");
        assert_eq!(legacy.major(), 8);
        assert_eq!(legacy.to_string(), "8.0.292");
        assert!(legacy < v("11"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(JavaVersion::parse("").is_err());
        assert!(JavaVersion::parse("openjdk").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("17.0.2")).unwrap();
        assert_eq!(json, "\"17.0.2\"");
        let back: JavaVersion = serde_json::from_str("\"21\"").unwrap();
        assert_eq!(back, v("21"));
    }
}
