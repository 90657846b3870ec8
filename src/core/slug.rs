//! Plugin slug parsing: `@author/name` or `@author/name:version`.

use std::fmt;

use crate::error::{TensorifyError, TensorifyResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug {
    pub author: String,
    pub name: String,
    pub version: Option<String>,
}

impl Slug {
    pub fn parse(raw: &str) -> TensorifyResult<Self> {
        let invalid = || TensorifyError::InvalidSlug(raw.to_string());

        let rest = raw.trim().strip_prefix('@').ok_or_else(invalid)?;
        let (author, tail) = rest.split_once('/').ok_or_else(invalid)?;
        let (name, version) = match tail.split_once(':') {
            Some((name, version)) if !version.is_empty() => (name, Some(version.to_string())),
            Some(_) => return Err(invalid()),
            None => (tail, None),
        };

        if author.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            author: author.to_string(),
            name: name.to_string(),
            version,
        })
    }

    /// `@author/name` without any version.
    pub fn base(&self) -> String {
        format!("@{}/{}", self.author, self.name)
    }

    /// `@author/name:version` as expected by the update API.
    pub fn with_version(&self, version: &str) -> String {
        format!("{}:{}", self.base(), version)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "@{}/{}:{}", self.author, self.name, v),
            None => write!(f, "@{}/{}", self.author, self.name),
        }
    }
}

/// Base slug of a raw string, or the trimmed input when it doesn't parse.
pub fn base_slug(raw: &str) -> String {
    Slug::parse(raw)
        .map(|s| s.base())
        .unwrap_or_else(|_| raw.trim().to_string())
}
