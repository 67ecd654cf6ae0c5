//! The interface for adding documents from the indexing lane.

use std::path::Path;

use crate::document::ContentSource;
use crate::error::Result;
use crate::index::posting::DocId;

/// Adds and removes documents.
///
/// Implemented by the handle passed to [`crate::SearchIndex::on_index_lane`]
/// closures. Every call applies synchronously on the indexing lane; the
/// changes become searchable at the next flush.
pub trait Indexer {
    /// Index a file. The document identifier is the `file://` URL of the
    /// file's canonical path. `mime_hint`, if given, must be `text/*`.
    fn add_file(&mut self, path: &Path, mime_hint: Option<&str>) -> Result<DocId> {
        let source = match mime_hint {
            Some(mime) => ContentSource::file_with_mime(path, mime),
            None => ContentSource::file(path),
        };
        self.add(source)
    }

    /// Index inline text under a URL-like identifier.
    fn add_text(&mut self, url: &str, content: &str) -> Result<DocId> {
        self.add(ContentSource::text(url, content))
    }

    /// Index any content source. Re-adding an identifier replaces the
    /// document.
    fn add(&mut self, source: ContentSource) -> Result<DocId>;

    /// Remove a document. Returns whether it was live.
    fn remove(&mut self, identifier: &str) -> Result<bool>;
}
