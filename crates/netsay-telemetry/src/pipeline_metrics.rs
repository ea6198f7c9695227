use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared counters for cross-thread pipeline monitoring.
///
/// Cloning is cheap; all clones observe the same counters. The front end,
/// the synthesis worker and the stream session each update their own stage.
#[derive(Clone)]
pub struct PipelineMetrics {
    // Request front end
    pub requests_received: Arc<AtomicU64>,
    pub requests_enqueued: Arc<AtomicU64>,
    pub requests_rejected: Arc<AtomicU64>, // parse/validation drops and closed-queue drops

    // Ingestion queue
    pub queue_depth: Arc<AtomicUsize>, // enqueued, not yet dequeued

    // Synthesis worker
    pub utterances_started: Arc<AtomicU64>,
    pub utterances_completed: Arc<AtomicU64>,
    pub synthesis_errors: Arc<AtomicU64>,

    // Audio sink
    pub chunks_written: Arc<AtomicU64>,
    pub write_shortfalls: Arc<AtomicU64>, // chunks where fewer samples were accepted than requested
    pub samples_emitted: Arc<AtomicU64>,

    pub last_utterance: Arc<RwLock<Option<Instant>>>,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            requests_received: Arc::new(AtomicU64::new(0)),
            requests_enqueued: Arc::new(AtomicU64::new(0)),
            requests_rejected: Arc::new(AtomicU64::new(0)),

            queue_depth: Arc::new(AtomicUsize::new(0)),

            utterances_started: Arc::new(AtomicU64::new(0)),
            utterances_completed: Arc::new(AtomicU64::new(0)),
            synthesis_errors: Arc::new(AtomicU64::new(0)),

            chunks_written: Arc::new(AtomicU64::new(0)),
            write_shortfalls: Arc::new(AtomicU64::new(0)),
            samples_emitted: Arc::new(AtomicU64::new(0)),

            last_utterance: Arc::new(RwLock::new(None)),
        }
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_utterance_started(&self) {
        // The dequeue that starts an utterance frees a queue slot.
        let _ = self
            .queue_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| {
                d.checked_sub(1)
            });
        self.utterances_started.fetch_add(1, Ordering::Relaxed);
        *self.last_utterance.write() = Some(Instant::now());
    }

    pub fn record_utterance_completed(&self) {
        self.utterances_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_synthesis_error(&self) {
        self.synthesis_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk(&self, requested: usize, written: usize) {
        self.chunks_written.fetch_add(1, Ordering::Relaxed);
        self.samples_emitted
            .fetch_add(written as u64, Ordering::Relaxed);
        if written < requested {
            self.write_shortfalls.fetch_add(1, Ordering::Relaxed);
        }
    }
}
