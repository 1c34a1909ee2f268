//! Positional element addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InspectError;

/// Address of an element as the sequence of element-child indices walked from
/// the document's root element.
///
/// The empty path is the root element itself. Paths are positional: inserting
/// or removing an earlier sibling shifts every path below that point, so a path
/// is only meaningful against the tree it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(Vec<u32>);

impl ElementPath {
    /// The root element's path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: impl Into<Vec<u32>>) -> Self {
        Self(indices.into())
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps below the root element.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of this element's `index`-th element child.
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Path of the parent element, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Whether `self` is `other` or lies below it.
    pub fn starts_with(&self, other: &ElementPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl From<Vec<u32>> for ElementPath {
    fn from(indices: Vec<u32>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for ElementPath {
    type Err = InspectError;

    /// Accepts `/0/2`, `0/2`, `0.2` and `[0, 2]`, one separator style per
    /// path. `/`, `[]` and the empty string are the root. Empty segments are
    /// rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            |reason: &str| InspectError::InvalidMessage(format!("invalid path '{}': {}", s, reason));

        let trimmed = s.trim();
        let (body, separator) = match trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => (inner.trim(), ','),
            None if trimmed.contains('/') => {
                if trimmed.contains(['.', ',']) {
                    return Err(invalid("mixed separators"));
                }
                (trimmed.strip_prefix('/').unwrap_or(trimmed), '/')
            }
            None => {
                if trimmed.contains(',') {
                    return Err(invalid("comma-separated paths need brackets"));
                }
                (trimmed, '.')
            }
        };
        if body.is_empty() {
            return Ok(Self::root());
        }

        let mut indices = Vec::new();
        for part in body.split(separator) {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            let index = part.parse::<u32>().map_err(|_| {
                InspectError::InvalidMessage(format!("invalid path segment '{}' in '{}'", part, s))
            })?;
            indices.push(index);
        }
        Ok(Self(indices))
    }
}
