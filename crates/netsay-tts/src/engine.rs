//! Synthesis engine interface

use crate::error::TtsResult;
use crate::stream::AudioChunkSink;
use crate::types::{SynthesisStats, VoiceSpec};

/// A speech synthesis engine.
///
/// The trait is synchronous: callers run on a dedicated worker thread that
/// fully owns the engine and the audio output, and the engine drives the
/// sink's callback synchronously while `synthesize` is on the stack.
pub trait SynthesisEngine: Send {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Whether the engine can synthesize on this system.
    fn is_available(&self) -> bool;

    /// Load the voice used for all subsequent utterances. Called once at
    /// worker startup; the voice outlives every utterance.
    fn load_voice(&mut self, voice: &VoiceSpec) -> TtsResult<()>;

    /// Synthesize `text`, invoking `sink` zero or more times with audio
    /// chunks per the [`AudioChunkSink`] contract. Returns once the final
    /// chunk has been delivered or the sink stopped the stream.
    fn synthesize(
        &mut self,
        text: &str,
        sink: &mut dyn AudioChunkSink,
    ) -> TtsResult<SynthesisStats>;
}
