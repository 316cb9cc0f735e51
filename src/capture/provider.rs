//! Content references for files handed to the camera.
//!
//! The camera never sees raw paths. It gets a `content://` URI that only the
//! provider can turn back into a file under its root.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

const SCHEME: &str = "content://";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentUri {
    authority: String,
    path: String,
}

impl FromStr for ContentUri {
    type Err = String;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let (authority, path) = uri
            .strip_prefix(SCHEME)
            .and_then(|rest| rest.split_once('/'))
            .filter(|(authority, path)| !authority.is_empty() && !path.is_empty())
            .ok_or_else(|| format!("not a content URI: {}", uri))?;
        Ok(Self {
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", SCHEME, self.authority, self.path)
    }
}

/// Issues and resolves content URIs for files under `root`.
#[derive(Clone, Debug)]
pub struct FileProvider {
    authority: String,
    root: PathBuf,
}

impl FileProvider {
    pub fn new(authority: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            authority: authority.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a URI for `file`, or `None` if it is outside the root.
    pub fn uri_for(&self, file: &Path) -> Option<ContentUri> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let segments = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        if segments.is_empty() {
            return None;
        }
        Some(ContentUri {
            authority: self.authority.clone(),
            path: segments.join("/"),
        })
    }

    /// Maps a URI issued by this provider back to its file.
    pub fn resolve(&self, uri: &ContentUri) -> Option<PathBuf> {
        if uri.authority != self.authority {
            return None;
        }
        let mut path = self.root.clone();
        for segment in uri.path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}
