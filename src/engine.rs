//! The search index facade.
//!
//! [`SearchIndex`] is the structure handed to applications. It owns the
//! inverted index and runs work on two independent lanes:
//!
//! - the **indexing lane**, one worker thread applying adds and removals in
//!   submission order;
//! - the **search lane**, a rayon pool evaluating searches concurrently.
//!
//! Every search starts by flushing buffered mutations and taking the
//! published reader in one step under the index lock, so it sees a
//! consistent snapshot that later indexing never changes.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use lectern::document::ContentSource;
//! use lectern::engine::SearchIndex;
//! use lectern::engine::config::IndexConfig;
//! use lectern::search::options::SearchOptions;
//!
//! let index = SearchIndex::new(IndexConfig::default()).unwrap();
//! index
//!     .add_document(ContentSource::text("mem://fruit", "apples and pears"))
//!     .unwrap()
//!     .wait()
//!     .unwrap();
//!
//! let matches: Vec<_> = index
//!     .search("apples", SearchOptions::DEFAULT, 10, Duration::from_secs(1))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(matches[0].identifier, "mem://fruit");
//! ```

pub mod config;
pub mod indexer;
pub mod lane;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::document::ContentSource;
use crate::engine::config::IndexConfig;
use crate::engine::indexer::Indexer;
use crate::engine::lane::{IndexingLane, PendingDocument, PendingWork};
use crate::error::{LecternError, Result};
use crate::index::inverted::{IndexStats, InvertedIndex};
use crate::index::reader::IndexReader;
use crate::index::snapshot::{self, IndexSnapshot};
use crate::query::parser::QueryParser;
use crate::query::plan::QueryCompiler;
use crate::search::matches::SearchOutcome;
use crate::search::options::SearchOptions;
use crate::search::scoring::Scorer;
use crate::search::session::{CancellationToken, SearchSession, SessionLimits};
use crate::search::stream::SearchStream;

struct Inner {
    config: IndexConfig,
    analyzer: Arc<dyn Analyzer>,
    index: Arc<Mutex<InvertedIndex>>,
    search_pool: ThreadPool,
    lane: IndexingLane,
}

/// A full-text search index. Cheap to clone; clones share the index.
#[derive(Clone)]
pub struct SearchIndex {
    inner: Arc<Inner>,
}

impl SearchIndex {
    /// Create an empty index with the standard analyzer.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let analyzer = Arc::new(StandardAnalyzer::from_config(&config));
        Self::with_analyzer(config, analyzer)
    }

    /// Create an empty index that normalizes text with `analyzer`.
    pub fn with_analyzer(config: IndexConfig, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        Self::from_index(config, analyzer, InvertedIndex::new())
    }

    fn from_index(
        config: IndexConfig,
        analyzer: Arc<dyn Analyzer>,
        index: InvertedIndex,
    ) -> Result<Self> {
        config.validate()?;

        let search_pool = ThreadPoolBuilder::new()
            .num_threads(config.search_threads)
            .thread_name(|i| format!("lectern-search-{i}"))
            .build()
            .map_err(|e| LecternError::internal(format!("Failed to create thread pool: {e}")))?;

        let index = Arc::new(Mutex::new(index));
        let lane = IndexingLane::start(Arc::clone(&index), Arc::clone(&analyzer))?;

        info!(
            "search index ready: analyzer {}, {} search threads",
            analyzer.name(),
            config.search_threads
        );
        Ok(SearchIndex {
            inner: Arc::new(Inner {
                config,
                analyzer,
                index,
                search_pool,
                lane,
            }),
        })
    }

    /// The configuration this index was created with.
    pub fn config(&self) -> &IndexConfig {
        &self.inner.config
    }

    /// Queue a document for indexing. Returns once queued; an invalid
    /// identifier fails here, unreadable content fails on the returned
    /// handle. Re-adding an identifier replaces the document.
    pub fn add_document(&self, source: ContentSource) -> Result<PendingDocument> {
        let identifier = source.identifier()?;
        debug!("queueing {identifier}");
        self.inner.lane.add(source)
    }

    /// Queue the removal of a document. The handle reports whether it was
    /// live.
    pub fn remove_document(&self, identifier: &str) -> Result<PendingWork<bool>> {
        self.inner.lane.remove(identifier.to_string())
    }

    /// Run a batch of indexing calls on the indexing lane, then flush.
    ///
    /// `actions` must use the [`Indexer`] it is given. Waiting on lane work
    /// from inside it, [`SearchIndex::flush`] included, fails with
    /// `InvalidArgument`.
    ///
    /// ```
    /// use lectern::engine::SearchIndex;
    /// use lectern::engine::config::IndexConfig;
    ///
    /// let index = SearchIndex::new(IndexConfig::default()).unwrap();
    /// let added = index
    ///     .on_index_lane(|indexer| {
    ///         indexer.add_text("mem://a", "first document").unwrap();
    ///         indexer.add_text("mem://b", "second document").unwrap();
    ///         2
    ///     })
    ///     .unwrap()
    ///     .wait()
    ///     .unwrap();
    /// assert_eq!(added, 2);
    /// assert_eq!(index.stats().live_documents, 2);
    /// ```
    pub fn on_index_lane<T, F>(&self, actions: F) -> Result<PendingWork<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Indexer) -> T + Send + 'static,
    {
        self.inner.lane.submit(move |indexer| {
            let value = actions(&mut *indexer);
            indexer.flush();
            Ok(value)
        })
    }

    /// Wait for all queued indexing work, then make it searchable.
    /// Fails with `InvalidArgument` when called from the indexing lane.
    pub fn flush(&self) -> Result<()> {
        self.inner.lane.barrier_flush()?;
        Ok(())
    }

    /// Flush buffered mutations and take the published reader atomically.
    fn flushed_reader(&self) -> Arc<IndexReader> {
        let mut index = self.inner.index.lock();
        index.flush();
        index.reader()
    }

    /// Start a search.
    ///
    /// Buffered mutations are flushed first. Malformed queries fail
    /// immediately; evaluation then runs on the search pool while the
    /// returned stream delivers batches of at most `limit` matches within
    /// the `time` budget.
    pub fn search(
        &self,
        query: &str,
        options: SearchOptions,
        limit: usize,
        time: Duration,
    ) -> Result<SearchStream> {
        if limit == 0 {
            return Err(LecternError::invalid_argument("limit must be at least 1"));
        }

        let config = &self.inner.config;
        let reader = self.flushed_reader();
        let scorer = if options.no_relevance_scores {
            Scorer::neutral()
        } else {
            Scorer::relevance()
        };

        let compiler = QueryCompiler::new(
            &reader,
            self.inner.analyzer.as_ref(),
            scorer,
            config.max_wildcard_expansions,
        );
        let plan = if options.find_similar {
            compiler.compile_similar(query)?
        } else {
            let tree = QueryParser::new()
                .with_space_means_or(options.space_means_or)
                .with_min_substring_literal(config.min_substring_literal)
                .with_max_depth(config.max_query_depth)
                .parse(query)?;
            compiler.compile(&tree)?
        };

        let session = SearchSession::new(
            reader,
            plan,
            scorer,
            SessionLimits {
                limit,
                time,
                chunk_size: config.evaluation_chunk_size,
            },
            CancellationToken::new(),
        );
        debug!(
            "search {} started for {query:?} with {options:?}",
            session.id()
        );
        Ok(SearchStream::spawn(&self.inner.search_pool, session))
    }

    /// Run a search to its end without blocking the async runtime.
    pub async fn search_all(
        &self,
        query: &str,
        options: SearchOptions,
        limit: usize,
        time: Duration,
    ) -> Result<SearchOutcome> {
        let stream = self.search(query, options, limit, time)?;
        tokio::task::spawn_blocking(move || stream.collect_outcome())
            .await
            .map_err(|e| LecternError::internal(format!("search task failed: {e}")))?
    }

    /// Current index statistics.
    pub fn stats(&self) -> IndexStats {
        self.inner.index.lock().stats()
    }

    /// Serialize the index as of a forced flush. Work still queued on the
    /// indexing lane is not included; call [`SearchIndex::flush`] first to
    /// wait for it.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let reader = self.flushed_reader();
        snapshot::encode(&IndexSnapshot::capture(&reader))
    }

    /// Rebuild an index from [`SearchIndex::snapshot`] bytes. Document ids
    /// and identifiers are preserved.
    pub fn restore(bytes: &[u8], config: IndexConfig) -> Result<Self> {
        let index = snapshot::decode(bytes)?.into_index()?;
        let analyzer = Arc::new(StandardAnalyzer::from_config(&config));
        Self::from_index(config, analyzer, index)
    }

    /// Write a snapshot to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.snapshot()?;
        std::fs::write(path.as_ref(), bytes)?;
        info!("saved index to {}", path.as_ref().display());
        Ok(())
    }

    /// Load an index saved with [`SearchIndex::save_to`].
    pub fn open<P: AsRef<Path>>(path: P, config: IndexConfig) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        info!("loading index from {}", path.as_ref().display());
        Self::restore(&bytes, config)
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("analyzer", &self.inner.analyzer.name())
            .field("config", &self.inner.config)
            .finish()
    }
}
