//! The indexing lane.
//!
//! A single worker thread applies every index mutation in submission
//! order. Callers enqueue work and get a [`PendingWork`] handle back; a
//! failure of one document is reported on its handle and never stops the
//! lane. Waiting on a handle from inside a job running on the lane is an
//! error, since that work is queued behind the waiting job.

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, unbounded};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::analysis::analyzer::{Analyzer, term_occurrences};
use crate::document::ContentSource;
use crate::engine::indexer::Indexer;
use crate::error::{LecternError, Result};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::DocId;

const LANE_NAME: &str = "lectern-indexing";

type LaneJob = Box<dyn FnOnce(&mut LaneIndexer<'_>) + Send + 'static>;

enum LaneCommand {
    Run(LaneJob),
    Shutdown,
}

/// The result of work queued on the indexing lane.
#[derive(Debug)]
#[must_use = "dropping the handle discards the outcome of the queued work"]
pub struct PendingWork<T> {
    receiver: Receiver<Result<T>>,
    lane_thread: ThreadId,
}

/// A queued document add.
pub type PendingDocument = PendingWork<DocId>;

impl<T> PendingWork<T> {
    /// Block until the work has been applied on the lane.
    ///
    /// Fails with `InvalidArgument` when called from a job on the lane
    /// while the work is still queued.
    pub fn wait(self) -> Result<T> {
        match self.receiver.try_recv() {
            Ok(result) => return result,
            Err(TryRecvError::Disconnected) => return Err(LecternError::lane_closed(LANE_NAME)),
            Err(TryRecvError::Empty) => {}
        }
        if thread::current().id() == self.lane_thread {
            return Err(LecternError::invalid_argument(format!(
                "cannot wait for queued work from the {LANE_NAME} thread"
            )));
        }
        self.receiver
            .recv()
            .map_err(|_| LecternError::lane_closed(LANE_NAME))?
    }

    /// The outcome, if the work has already been applied.
    pub fn try_wait(&self) -> Option<Result<T>> {
        self.receiver.try_recv().ok()
    }
}

/// The [`Indexer`] handed to work running on the lane.
pub struct LaneIndexer<'a> {
    index: &'a Mutex<InvertedIndex>,
    analyzer: &'a dyn Analyzer,
}

impl LaneIndexer<'_> {
    /// Merge buffered mutations so they become searchable.
    pub fn flush(&mut self) -> bool {
        self.index.lock().flush()
    }
}

impl Indexer for LaneIndexer<'_> {
    fn add(&mut self, source: ContentSource) -> Result<DocId> {
        // Read and analyze before taking the lock so searches are only
        // blocked for the actual posting update.
        let document = source.resolve()?;
        let occurrences = term_occurrences(self.analyzer, &document.content)
            .map_err(|e| LecternError::indexing(document.identifier.as_str(), e.to_string()))?;

        let doc_id = self.index.lock().upsert(&document.identifier, occurrences);
        Ok(doc_id)
    }

    fn remove(&mut self, identifier: &str) -> Result<bool> {
        Ok(self.index.lock().remove(identifier).is_some())
    }
}

/// Handle on the lane's worker thread. Dropping it drains the queue and
/// joins the worker.
pub struct IndexingLane {
    sender: Sender<LaneCommand>,
    worker: Option<JoinHandle<()>>,
    worker_thread: ThreadId,
}

impl IndexingLane {
    /// Start the worker.
    pub fn start(index: Arc<Mutex<InvertedIndex>>, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let (sender, receiver) = unbounded::<LaneCommand>();

        let worker = thread::Builder::new()
            .name(LANE_NAME.to_string())
            .spawn(move || {
                info!("{LANE_NAME} lane started");
                let mut indexer = LaneIndexer {
                    index: &index,
                    analyzer: analyzer.as_ref(),
                };
                for command in receiver {
                    match command {
                        LaneCommand::Run(job) => job(&mut indexer),
                        LaneCommand::Shutdown => break,
                    }
                }
                info!("{LANE_NAME} lane stopped");
            })?;

        Ok(IndexingLane {
            sender,
            worker_thread: worker.thread().id(),
            worker: Some(worker),
        })
    }

    /// Queue `job` and return a handle on its result.
    pub fn submit<T, F>(&self, job: F) -> Result<PendingWork<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut LaneIndexer<'_>) -> Result<T> + Send + 'static,
    {
        let (reply, receiver) = bounded(1);
        let boxed: LaneJob = Box::new(move |indexer: &mut LaneIndexer<'_>| {
            // The caller may have dropped its handle.
            let _ = reply.send(job(indexer));
        });
        self.sender
            .send(LaneCommand::Run(boxed))
            .map_err(|_| LecternError::lane_closed(LANE_NAME))?;
        Ok(PendingWork {
            receiver,
            lane_thread: self.worker_thread,
        })
    }

    /// Queue a document add.
    pub fn add(&self, source: ContentSource) -> Result<PendingDocument> {
        self.submit(move |indexer| {
            let result = indexer.add(source);
            match &result {
                Ok(doc_id) => debug!("indexed document {doc_id}"),
                Err(e) => warn!("{e}"),
            }
            result
        })
    }

    /// Queue a removal.
    pub fn remove(&self, identifier: String) -> Result<PendingWork<bool>> {
        self.submit(move |indexer| indexer.remove(&identifier))
    }

    /// Wait for all previously queued work, then flush.
    pub fn barrier_flush(&self) -> Result<bool> {
        self.submit(|indexer| Ok(indexer.flush()))?.wait()
    }
}

impl Drop for IndexingLane {
    fn drop(&mut self) {
        let _ = self.sender.send(LaneCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            // The last handle can be dropped by a job running on the lane
            // itself; joining would then wait forever.
            if self.worker_thread != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;

    fn lane() -> (IndexingLane, Arc<Mutex<InvertedIndex>>) {
        let index = Arc::new(Mutex::new(InvertedIndex::new()));
        let lane = IndexingLane::start(Arc::clone(&index), Arc::new(StandardAnalyzer::new())).unwrap();
        (lane, index)
    }

    #[test]
    fn test_work_applies_in_order() {
        let (lane, index) = lane();
        let first = lane.add(ContentSource::text("mem://a", "apple")).unwrap();
        let second = lane.add(ContentSource::text("mem://b", "banana")).unwrap();
        let removed = lane.remove("mem://a".to_string()).unwrap();

        assert_eq!(first.wait().unwrap(), 0);
        assert_eq!(second.wait().unwrap(), 1);
        assert!(removed.wait().unwrap());

        assert!(lane.barrier_flush().unwrap());
        assert_eq!(index.lock().reader().live_documents(), &[1]);
    }

    #[test]
    fn test_waiting_from_the_lane_fails() {
        let (lane, _index) = lane();
        let lane = Arc::new(lane);

        let inner = Arc::clone(&lane);
        let outcome = lane
            .submit(move |_| {
                let flushed = inner.barrier_flush();
                let queued = inner.add(ContentSource::text("mem://late", "late words"))?;
                Ok((flushed, queued.wait()))
            })
            .unwrap()
            .wait()
            .unwrap();

        assert!(matches!(outcome.0, Err(LecternError::InvalidArgument(_))));
        assert!(matches!(outcome.1, Err(LecternError::InvalidArgument(_))));
        // The lane keeps working afterwards.
        assert!(lane.barrier_flush().unwrap());
    }

    #[test]
    fn test_failure_does_not_stop_lane() {
        let (lane, index) = lane();
        let bad = lane.add(ContentSource::file("/definitely/not/here.txt")).unwrap();
        let good = lane.add(ContentSource::text("mem://ok", "fine words")).unwrap();

        assert!(matches!(bad.wait(), Err(LecternError::Indexing { .. })));
        assert!(good.wait().is_ok());
        lane.barrier_flush().unwrap();
        assert_eq!(index.lock().reader().live_count(), 1);
    }
}
