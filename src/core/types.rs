//! core::types
//!
//! Strong types for values read out of plumbing output.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (SHA)
//! - [`FileMode`] - Octal file mode from index and tree listings
//! - [`ObjectKind`] - Object type column of a tree listing
//!
//! # Validation
//!
//! These types enforce validity at construction time. A listing row that
//! fails to produce one of them is malformed input, never a silently
//! defaulted value.
//!
//! # Examples
//!
//! ```
//! use plumbview::core::types::{FileMode, Oid};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! let mode = FileMode::parse("120000").unwrap();
//! assert!(mode.is_symlink());
//!
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(FileMode::parse("12x").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid file mode: {0}")]
    InvalidMode(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use plumbview::core::types::Oid;
///
/// // Create from hex string (normalized to lowercase)
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
///
/// // Zero OID is what diff-files reports for unhashed worktree content
/// let zero = Oid::zero();
/// assert!(zero.is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// The zero OID (40 zeros for SHA-1).
    const ZERO_SHA1: &'static str = "0000000000000000000000000000000000000000";

    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Create the zero/null OID (40 zeros).
    pub fn zero() -> Self {
        Self(Self::ZERO_SHA1.to_string())
    }

    /// Check if this is the zero/null OID.
    ///
    /// Raw diff output uses the zero OID for a side that has not been
    /// hashed (worktree content) or does not exist.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    /// Check whether `candidate` has the shape of a full object id.
    ///
    /// Used by line-oriented parsers to recognize header lines without
    /// allocating.
    pub fn looks_like(candidate: &str) -> bool {
        (candidate.len() == 40 || candidate.len() == 64)
            && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters. If `len` exceeds the OID length,
    /// returns the full OID.
    ///
    /// # Example
    ///
    /// ```
    /// use plumbview::core::types::Oid;
    ///
    /// let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
    /// assert_eq!(oid.short(7), "abc123d");
    /// assert_eq!(oid.short(400).len(), 40);
    /// ```
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Validate an object id.
    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file mode as printed by plumbing commands (`100644`, `040000`, ...).
///
/// Stored as the numeric value of the octal string. Displayed back as six
/// octal digits, which is how `ls-files` and `diff-*` print it (`ls-tree`
/// prints trees as `040000` too).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileMode(u32);

impl FileMode {
    const TYPE_MASK: u32 = 0o170000;
    const TREE: u32 = 0o040000;
    const SYMLINK: u32 = 0o120000;
    const GITLINK: u32 = 0o160000;

    /// Parse an octal mode string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidMode` for empty or non-octal input.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        if raw.is_empty() || raw.len() > 7 {
            return Err(TypeError::InvalidMode(raw.to_string()));
        }
        u32::from_str_radix(raw, 8)
            .map(Self)
            .map_err(|_| TypeError::InvalidMode(raw.to_string()))
    }

    /// The mode raw diff output reports for a missing side.
    pub fn none() -> Self {
        Self(0)
    }

    /// Mode of a directory entry.
    pub fn tree() -> Self {
        Self(Self::TREE)
    }

    /// Numeric value of the mode.
    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn is_tree(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::TREE
    }

    pub fn is_symlink(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::SYMLINK
    }

    /// Submodule commit entry.
    pub fn is_gitlink(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::GITLINK
    }

    pub fn is_executable(&self) -> bool {
        !self.is_tree() && !self.is_gitlink() && self.0 & 0o111 != 0
    }
}

impl TryFrom<String> for FileMode {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_string()
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.0)
    }
}

/// The object type column of an `ls-tree` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Tree,
    Blob,
    /// A gitlink: the commit a submodule is pinned to.
    Commit,
    Tag,
    /// A symbolic link listed under its own type name.
    Link,
}

impl ObjectKind {
    /// Parse a type column, returning `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tree" => Some(Self::Tree),
            "blob" => Some(Self::Blob),
            "commit" => Some(Self::Commit),
            "tag" => Some(Self::Tag),
            "link" => Some(Self::Link),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Link => "link",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
