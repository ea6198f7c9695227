//! Chunk streaming contract between a synthesis engine and an audio sink

use crate::types::WaveBuffer;

/// Returned by the sink after every chunk; `Stop` aborts the remainder of
/// the utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    Continue,
    Stop,
}

/// Receives PCM chunks as the engine produces them.
///
/// Contract, guaranteed by engines and relied on by sinks:
/// - chunks of one utterance arrive with strictly increasing, non-overlapping
///   `start` offsets, covering `[0, total)` exactly once in aggregate;
/// - `last` is true on exactly the chunk containing the final sample;
/// - the sink is never invoked concurrently or reentrantly (the worker
///   processes one utterance at a time, and engines call synchronously);
/// - the engine checks the returned [`StreamControl`] after every chunk.
///
/// One sink instance serves one utterance.
pub trait AudioChunkSink {
    fn on_chunk(
        &mut self,
        wave: &WaveBuffer,
        start: usize,
        len: usize,
        last: bool,
    ) -> StreamControl;
}

/// Drives a fully rendered wave through a sink in fixed-size chunks,
/// honoring the contract above. Engines that render in one shot (rather
/// than incrementally) use this to present the streaming interface.
///
/// Returns false if the sink stopped the stream early.
pub fn stream_wave(
    wave: &WaveBuffer,
    chunk_samples: usize,
    sink: &mut dyn AudioChunkSink,
) -> bool {
    debug_assert!(chunk_samples > 0);
    let total = wave.samples.len();
    let mut start = 0;
    while start < total {
        let len = chunk_samples.min(total - start);
        let last = start + len == total;
        if sink.on_chunk(wave, start, len, last) == StreamControl::Stop {
            return false;
        }
        start += len;
    }
    true
}
