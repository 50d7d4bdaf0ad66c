//! Store paths
//!
//! A path addresses a node in the tree as `/`-separated segments, e.g.
//! `blogs/{blog_id}/likes`.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters a segment may not contain.
const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a `/`-separated path. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment(segment).map_err(|_| StoreError::InvalidPath(raw.to_string()))?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath(String::new()));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Append a child segment.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment (the key of this node within its parent).
    pub fn key(&self) -> &str {
        // segments is never empty
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True when `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &StorePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// True when one path is an ancestor of (or equal to) the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() || segment.contains('/') || segment.contains(FORBIDDEN) {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl TryFrom<String> for StorePath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StorePath::parse(&value)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.to_string()
    }
}

impl std::str::FromStr for StorePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorePath::parse(s)
    }
}
