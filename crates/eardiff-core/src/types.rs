//! Fingerprint types shared across eardiff
//!
//! A [`Fingerprint`] identifies one entry of a flattened archive tree by its
//! [`QualifiedPath`] and the CRC-32 recorded for its stored bytes.
//!
//! # Textual form
//! ```text
//! lib/inner.jar:META-INF/MANIFEST.MF:2942193713
//! └───────────┘ └──────────────────┘ └────────┘
//!  container     entry name           checksum
//! ```
//! Segments are joined with `:`. A `:` or `\` that appears inside a segment
//! is written as `\:` or `\\`, so the textual form always parses back into
//! the same segments. Comparisons never look at the textual form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Separator between path segments and before the checksum
pub const DELIMITER: char = ':';

/// Escape character for delimiters inside a segment
pub const ESCAPE: char = '\\';

/// Errors produced when parsing the textual fingerprint form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFingerprintError {
    #[error("Empty fingerprint")]
    Empty,

    #[error("Missing checksum in {0:?}")]
    MissingChecksum(String),

    #[error("Invalid checksum {0:?}")]
    InvalidChecksum(String),

    #[error("Dangling escape at end of {0:?}")]
    DanglingEscape(String),

    #[error("Invalid escape sequence \\{escaped} in {input:?}")]
    InvalidEscape { input: String, escaped: char },
}

/// Entry name prefixed by every enclosing container name
///
/// The root path has no segments; the top-level entry `a.txt` is the single
/// segment `["a.txt"]`; `a.txt` inside `lib/inner.jar` is
/// `["lib/inner.jar", "a.txt"]`.
///
/// The root is only ever a descent prefix. Its textual form is empty, and
/// the empty string parses as the single empty segment `[""]` (an entry
/// with an empty name), never as the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedPath {
    segments: Vec<String>,
}

impl QualifiedPath {
    /// The empty prefix used for top-level entries
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from raw segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of `name` nested directly below this path
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(name.into());
        Self { segments }
    }

    /// Container names followed by the entry name
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Entry name without container prefix
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path of the enclosing container, `None` for the root
    pub fn parent(&self) -> Option<QualifiedPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Number of nested containers above the entry
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Whether this is the empty top-level prefix
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", DELIMITER)?;
            }
            write_escaped(f, segment)?;
        }
        Ok(())
    }
}

impl FromStr for QualifiedPath {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            segments: split_escaped(s)?,
        })
    }
}

impl Serialize for QualifiedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for QualifiedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity and content state of one archive entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Fully qualified entry path
    pub path: QualifiedPath,
    /// CRC-32 of the entry's uncompressed bytes
    pub checksum: u32,
}

impl Fingerprint {
    /// Fingerprint of the entry at `path` with the given CRC-32
    pub fn new(path: QualifiedPath, checksum: u32) -> Self {
        Self { path, checksum }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path, DELIMITER, self.checksum)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseFingerprintError::Empty);
        }

        let mut segments = split_escaped(s)?;
        if segments.len() < 2 {
            return Err(ParseFingerprintError::MissingChecksum(s.to_string()));
        }

        let raw = segments.pop().unwrap_or_default();
        let checksum = raw
            .parse::<u32>()
            .map_err(|_| ParseFingerprintError::InvalidChecksum(raw.clone()))?;

        Ok(Self {
            path: QualifiedPath { segments },
            checksum,
        })
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    for c in segment.chars() {
        if c == DELIMITER || c == ESCAPE {
            write!(f, "{}", ESCAPE)?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

/// Split on unescaped delimiters, resolving escapes
fn split_escaped(input: &str) -> Result<Vec<String>, ParseFingerprintError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(escaped @ (DELIMITER | ESCAPE)) => current.push(escaped),
                Some(escaped) => {
                    return Err(ParseFingerprintError::InvalidEscape {
                        input: input.to_string(),
                        escaped,
                    })
                }
                None => return Err(ParseFingerprintError::DanglingEscape(input.to_string())),
            },
            DELIMITER => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    Ok(segments)
}
