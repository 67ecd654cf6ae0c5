//! Content sources: where a document's text comes from.
//!
//! A document enters the index either as a file on disk or as inline text
//! paired with a URL-like identifier. Both are resolved to the same
//! [`ResolvedDocument`] before analysis, so the rest of the engine never
//! cares which one it was.
//!
//! # Examples
//!
//! ```
//! use lectern::document::ContentSource;
//!
//! let source = ContentSource::text("mem://greeting", "hello world");
//! assert_eq!(source.identifier().unwrap(), "mem://greeting");
//!
//! let resolved = source.resolve().unwrap();
//! assert_eq!(resolved.content, "hello world");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LecternError, Result};

/// URL scheme used for file identifiers.
pub const FILE_SCHEME: &str = "file://";

/// A document's content, before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A file on disk. The identifier is the `file://` URL of its
    /// canonical path. `mime_hint`, if given, must be a `text/*` type.
    File {
        path: PathBuf,
        mime_hint: Option<String>,
    },
    /// Already extracted text with a caller-chosen identifier.
    Text { url: String, content: String },
}

/// A document ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub identifier: String,
    pub content: String,
}

impl ContentSource {
    /// A file source without a MIME hint.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        ContentSource::File {
            path: path.into(),
            mime_hint: None,
        }
    }

    /// A file source with a MIME hint.
    pub fn file_with_mime<P: Into<PathBuf>, S: Into<String>>(path: P, mime_hint: S) -> Self {
        ContentSource::File {
            path: path.into(),
            mime_hint: Some(mime_hint.into()),
        }
    }

    /// An inline text source.
    pub fn text<U: Into<String>, C: Into<String>>(url: U, content: C) -> Self {
        ContentSource::Text {
            url: url.into(),
            content: content.into(),
        }
    }

    /// The identifier this source will be indexed under. Checks the
    /// identifier and MIME hint but does not read any content.
    pub fn identifier(&self) -> Result<String> {
        match self {
            ContentSource::File { path, mime_hint } => {
                if let Some(mime) = mime_hint {
                    check_mime(path, mime)?;
                }
                let canonical = fs::canonicalize(path).map_err(|e| {
                    LecternError::indexing(path.display().to_string(), e.to_string())
                })?;
                let identifier = file_url(&canonical);
                validate_identifier(&identifier)?;
                Ok(identifier)
            }
            ContentSource::Text { url, .. } => {
                validate_identifier(url)?;
                Ok(url.clone())
            }
        }
    }

    /// Read the content.
    pub fn resolve(self) -> Result<ResolvedDocument> {
        let identifier = self.identifier()?;
        let content = match self {
            ContentSource::File { path, .. } => {
                let bytes = fs::read(&path)
                    .map_err(|e| LecternError::indexing(identifier.as_str(), e.to_string()))?;
                String::from_utf8(bytes).map_err(|_| {
                    LecternError::indexing(identifier.as_str(), "content is not valid UTF-8")
                })?
            }
            ContentSource::Text { content, .. } => content,
        };

        Ok(ResolvedDocument {
            identifier,
            content,
        })
    }
}

/// Reject empty identifiers and identifiers containing whitespace.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(LecternError::indexing(identifier, "identifier is empty"));
    }
    if identifier.chars().any(char::is_whitespace) {
        return Err(LecternError::indexing(
            identifier,
            "identifier contains whitespace",
        ));
    }
    Ok(())
}

fn check_mime(path: &Path, mime: &str) -> Result<()> {
    if mime.trim().to_ascii_lowercase().starts_with("text/") {
        Ok(())
    } else {
        Err(LecternError::indexing(
            path.display().to_string(),
            format!("unsupported content type {mime}"),
        ))
    }
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let encoded = path.replace('%', "%25").replace(' ', "%20");
    if encoded.starts_with('/') {
        format!("{FILE_SCHEME}{encoded}")
    } else {
        format!("{FILE_SCHEME}/{encoded}")
    }
}
