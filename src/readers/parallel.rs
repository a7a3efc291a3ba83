//! Concurrent multi-file line reader.
//!
//! One job per input file runs on a dedicated rayon pool. Jobs push lines into a
//! single bounded crossbeam channel, which caps memory at `queue_capacity` lines no
//! matter how many files are open. The consumer drains that channel through the
//! [`Iterator`] impl.
//!
//! ```text
//!   file 0 ──job──┐
//!   file 1 ──job──┼──► bounded queue ──► ParallelLineReader::next ──► caller
//!   file n ──job──┘          ▲
//!                error slot ─┘ (first error only)
//! ```
//!
//! ## Job protocol
//! A job pushes every line of its file in order, then pushes `Done`. If its
//! file fails, it records the error in the one-slot error channel *before* pushing
//! `Done`, so the consumer never undercounts finished jobs. Before each push the job
//! checks the shared stop flag, and it exits quietly once the flag is set or the
//! consumer has gone away.
//!
//! ## Error surfacing
//! The consumer checks the error slot when a queue read times out with the queue
//! empty, and right after a `Done` from a job that failed. The slot is filled before
//! that `Done` is pushed, and a job's lines precede its error, so in FIFO order every
//! line read from a failing file before the failure is yielded before the error. Lines that *other* files still have in flight at
//! that point are dropped. Only the first error is kept; later ones are discarded.
//!
//! ## Shutdown
//! [`close`](ParallelLineReader::close) sets the stop flag, disconnects the queue
//! and blocks until every job (including jobs the pool had not started yet) has
//! returned. `Drop` calls `close`, so a reader cannot leak running jobs.

use crate::error::{DatasetError, Result};
use crate::io::lines::LineSource;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use crossbeam::sync::WaitGroup;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Upper bound on the automatically chosen worker count.
pub const MAX_AUTO_WORKERS: usize = 32;

/// How long a blocked push or pull waits before re-checking the stop flag / error slot.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolve the worker count for `files` input files.
///
/// `None` picks `min(available cores, 32, files)`; an explicit count is capped at
/// `files`. The result is at least 1.
///
/// # Errors
/// [`DatasetError::Config`] for `Some(0)`.
pub fn resolve_workers(requested: Option<usize>, files: usize) -> Result<usize> {
    let workers = match requested {
        Some(0) => return Err(DatasetError::Config("workers must be at least 1".into())),
        Some(n) => n,
        None => num_cpus::get().min(MAX_AUTO_WORKERS),
    };
    Ok(workers.min(files).max(1))
}

enum Message {
    Line(String),
    Done { failed: bool },
}

/// Lines from many files, read concurrently, merged into one stream.
///
/// Order is preserved within a file; across files it depends on timing.
pub struct ParallelLineReader {
    queue: Option<Receiver<Message>>,
    errors: Receiver<DatasetError>,
    stop: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    jobs: Option<WaitGroup>,
    pool: Option<ThreadPool>,
    remaining: usize,
}

impl ParallelLineReader {
    /// Start one job per file.
    ///
    /// # Errors
    /// [`DatasetError::Config`] for an empty file list, zero workers or zero queue
    /// capacity; [`DatasetError::ThreadPool`] if the pool cannot be built.
    pub fn spawn(
        files: Vec<PathBuf>,
        workers: Option<usize>,
        queue_capacity: usize,
    ) -> Result<Self> {
        if files.is_empty() {
            return Err(DatasetError::Config(
                "parallel reader needs at least one file".into(),
            ));
        }
        if queue_capacity == 0 {
            return Err(DatasetError::Config("queue_capacity must be at least 1".into()));
        }
        let workers = resolve_workers(workers, files.len())?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("jsonl-reader-{i}"))
            .build()?;
        debug!(
            files = files.len(),
            workers, queue_capacity, "starting parallel line reader"
        );

        let (tx, rx) = channel::bounded(queue_capacity);
        let (err_tx, err_rx) = channel::bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicUsize::new(0));
        let jobs = WaitGroup::new();
        let remaining = files.len();

        for path in files {
            let job = Job {
                source: LineSource::new(path),
                queue: tx.clone(),
                errors: err_tx.clone(),
                stop: Arc::clone(&stop),
                active: Arc::clone(&active),
                _done: jobs.clone(),
            };
            active.fetch_add(1, Ordering::SeqCst);
            pool.spawn(move || job.run());
        }

        Ok(Self {
            queue: Some(rx),
            errors: err_rx,
            stop,
            active,
            jobs: Some(jobs),
            pool: Some(pool),
            remaining,
        })
    }

    /// Jobs that have not returned yet.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop all jobs and wait for them to return. Safe to call more than once.
    pub fn close(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // blocked pushes fail fast once the receiver is gone
        self.queue = None;
        if let Some(jobs) = self.jobs.take() {
            jobs.wait();
        }
        self.pool = None;
    }

    fn fail(&mut self, err: DatasetError) -> Option<Result<String>> {
        self.close();
        Some(Err(err))
    }
}

impl Iterator for ParallelLineReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let queue = self.queue.as_ref()?;
            if self.remaining == 0 {
                self.close();
                return self.errors.try_recv().ok().map(Err);
            }
            match queue.recv_timeout(POLL_INTERVAL) {
                Ok(Message::Line(line)) => return Some(Ok(line)),
                Ok(Message::Done { failed }) => {
                    self.remaining -= 1;
                    if failed && let Ok(err) = self.errors.try_recv() {
                        return self.fail(err);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Ok(err) = self.errors.try_recv() {
                        return self.fail(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.remaining = 0;
                }
            }
        }
    }
}

impl Drop for ParallelLineReader {
    fn drop(&mut self) {
        self.close();
    }
}

struct Job {
    source: LineSource,
    queue: Sender<Message>,
    errors: Sender<DatasetError>,
    stop: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    // dropped last; releases the consumer's `close`
    _done: WaitGroup,
}

impl Job {
    fn run(self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.pump()));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(_) => Some(DatasetError::WorkerPanic(self.source.path().to_path_buf())),
        };
        let failed = match failure {
            Some(err) if !self.stopped() => {
                // slot holds the first error only
                let _ = self.errors.try_send(err);
                true
            }
            _ => false,
        };
        self.push(Message::Done { failed });
        trace!(path = %self.source.path().display(), "reader job finished");
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn pump(&self) -> Result<()> {
        for line in self.source.lines() {
            let line = line?;
            if !self.push(Message::Line(line)) {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Blocking push that gives up once the reader is stopped or dropped.
    fn push(&self, mut msg: Message) -> bool {
        loop {
            if self.stopped() {
                return false;
            }
            match self.queue.send_timeout(msg, POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(back)) => msg = back,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}
