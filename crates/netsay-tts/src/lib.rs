//! Synthesis engine abstraction for netsay
//!
//! This crate defines the boundary between the pipeline and a speech
//! synthesis engine: the engine trait, the chunk streaming contract the
//! engine drives during synthesis, and the shared wave/voice types.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod engine;
pub mod error;
pub mod stream;
pub mod types;

pub use engine::SynthesisEngine;
pub use error::{TtsError, TtsResult};
pub use stream::{stream_wave, AudioChunkSink, StreamControl};
pub use types::{SynthesisStats, VoiceSpec, WaveBuffer};

/// Generates unique utterance IDs
static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
