//! eSpeak NG synthesis engine adapter for netsay

use std::io::Cursor;
use std::process::Command;

use netsay_tts::{
    stream_wave, AudioChunkSink, SynthesisEngine, SynthesisStats, TtsError, TtsResult, VoiceSpec,
    WaveBuffer,
};
use tracing::{debug, warn};


/// Samples per chunk handed to the sink. eSpeak renders the whole utterance
/// in one shot; streaming in small chunks keeps the sink's per-chunk write
/// timeout meaningful.
pub const STREAM_CHUNK_SAMPLES: usize = 256;

pub struct EspeakEngine {
    command: Option<String>,
    voice: VoiceSpec,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self {
            command: None,
            voice: VoiceSpec::default(),
        }
    }

    /// Probe for the espeak binary (espeak-ng, falling back to espeak).
    fn probe_command() -> Option<String> {
        for candidate in ["espeak-ng", "espeak"] {
            if Command::new(candidate).arg("--version").output().is_ok() {
                return Some(candidate.to_string());
            }
        }
        None
    }

    /// Build command arguments for one utterance.
    fn build_args(&self, text: &str) -> Vec<String> {
        let mut args = vec!["--stdout".to_string()];
        args.push("-v".to_string());
        args.push(self.voice.id.clone());
        if let Some(rate) = self.voice.rate_wpm {
            args.push("-s".to_string());
            args.push(rate.to_string());
        }
        if let Some(pitch) = self.voice.pitch {
            args.push("-p".to_string());
            args.push(pitch.to_string());
        }
        if let Some(amplitude) = self.voice.amplitude {
            args.push("-a".to_string());
            args.push(amplitude.to_string());
        }
        // Terminate option parsing so leading '-' in text is not an option.
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }
}

/// Parse the WAV bytes espeak writes to stdout into a wave buffer.
fn decode_wav(bytes: &[u8]) -> TtsResult<WaveBuffer> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| TtsError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(TtsError::Decode(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| TtsError::Decode(e.to_string()))?;
    Ok(WaveBuffer {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

impl SynthesisEngine for EspeakEngine {
    fn name(&self) -> &str {
        "eSpeak NG"
    }

    fn is_available(&self) -> bool {
        Self::probe_command().is_some()
    }

    fn load_voice(&mut self, voice: &VoiceSpec) -> TtsResult<()> {
        let command = Self::probe_command().ok_or_else(|| {
            TtsError::EngineNotAvailable("espeak-ng/espeak not found in PATH".to_string())
        })?;
        debug!(command = %command, voice = %voice.id, "loaded espeak voice");
        self.command = Some(command);
        self.voice = voice.clone();
        Ok(())
    }

    fn synthesize(
        &mut self,
        text: &str,
        sink: &mut dyn AudioChunkSink,
    ) -> TtsResult<SynthesisStats> {
        let command = self
            .command
            .as_deref()
            .ok_or_else(|| TtsError::NotInitialized("no voice loaded".to_string()))?;
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("empty text".to_string()));
        }

        let output = Command::new(command).args(self.build_args(text)).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::SynthesisError(format!(
                "{} exited with {}: {}",
                command,
                output.status,
                stderr.trim()
            )));
        }

        let wave = decode_wav(&output.stdout)?;
        debug!(
            samples = wave.len(),
            sample_rate = wave.sample_rate,
            "rendered utterance"
        );

        let completed = stream_wave(&wave, STREAM_CHUNK_SAMPLES, sink);
        if !completed {
            warn!("sink stopped utterance before the final chunk");
        }
        Ok(SynthesisStats {
            samples: wave.len() as u64,
            sample_rate: wave.sample_rate,
            stopped_early: !completed,
        })
    }
}
