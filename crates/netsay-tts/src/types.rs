//! Core types shared between engines and the audio pipeline

use serde::{Deserialize, Serialize};

/// PCM audio produced by a synthesis engine for one utterance.
///
/// Engines grow `samples` as synthesis proceeds; the streaming sink only
/// ever sees `[start, start + len)` windows into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl WaveBuffer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        frames * 1000 / self.sample_rate as u64
    }
}

/// Voice selection, loaded once when the synthesis worker starts and shared
/// read-only by every utterance it processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSpec {
    /// Engine voice identifier (e.g. "en", "en-gb").
    pub id: String,
    /// Speaking rate in words per minute.
    pub rate_wpm: Option<u32>,
    /// Pitch adjustment, engine-defined scale.
    pub pitch: Option<u32>,
    /// Amplitude, engine-defined scale.
    pub amplitude: Option<u32>,
}

impl Default for VoiceSpec {
    fn default() -> Self {
        Self {
            id: "en".to_string(),
            rate_wpm: None,
            pitch: None,
            amplitude: None,
        }
    }
}

/// Outcome of one synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisStats {
    /// Total samples the engine produced for the utterance.
    pub samples: u64,
    pub sample_rate: u32,
    /// True when the sink returned `Stop` before the final chunk.
    pub stopped_early: bool,
}
