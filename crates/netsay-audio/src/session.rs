//! Per-utterance bridge from the engine's chunk stream to the audio output

use std::sync::Arc;
use std::time::Duration;

use netsay_telemetry::PipelineMetrics;
use netsay_tts::{AudioChunkSink, StreamControl, WaveBuffer};
use tracing::{error, trace, warn};

use crate::output::AudioOutput;

/// Reference per-chunk write timeout.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Streams one utterance to an [`AudioOutput`].
///
/// One session exists per utterance; the worker constructs a fresh one
/// before each synthesis call, which enforces the single-active-session
/// invariant by construction. The output's sample rate is configured from
/// the first chunk (`start == 0`) before any samples are written, and never
/// again for the same utterance. Short writes are logged and counted but do
/// not abort the utterance; the unwritten remainder is not retried.
pub struct StreamSession<'a> {
    output: &'a mut dyn AudioOutput,
    write_timeout: Duration,
    rate_configured: bool,
    samples_emitted: u64,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl<'a> StreamSession<'a> {
    pub fn new(output: &'a mut dyn AudioOutput) -> Self {
        Self {
            output,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            rate_configured: false,
            samples_emitted: 0,
            metrics: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Samples accepted by the output so far.
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }
}

impl AudioChunkSink for StreamSession<'_> {
    fn on_chunk(
        &mut self,
        wave: &WaveBuffer,
        start: usize,
        len: usize,
        last: bool,
    ) -> StreamControl {
        if start == 0 && !self.rate_configured {
            if let Err(e) = self.output.configure(wave.sample_rate) {
                error!(sample_rate = wave.sample_rate, "failed to configure audio output: {}", e);
                return StreamControl::Stop;
            }
            self.rate_configured = true;
        }

        let chunk = &wave.samples[start..start + len];
        match self.output.write(chunk, self.write_timeout) {
            Ok(written) => {
                if written < len {
                    warn!(
                        requested = len,
                        written, "short audio write; continuing without retry"
                    );
                }
                self.samples_emitted += written as u64;
                if let Some(metrics) = &self.metrics {
                    metrics.record_chunk(len, written);
                }
                if last {
                    trace!(samples = self.samples_emitted, "utterance stream complete");
                }
                StreamControl::Continue
            }
            Err(e) => {
                error!("audio write failed: {}", e);
                StreamControl::Stop
            }
        }
    }
}
