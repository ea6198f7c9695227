//! End-to-end pipeline tests with scripted collaborators
//!
//! A scripted engine and output stand in for eSpeak and the audio device so
//! the handoff, ordering and degradation behavior of the worker are
//! observable deterministically.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use netsay_app::request::SpeechRequest;
use netsay_app::synth::{SynthWorker, SynthWorkerHandle, SynthWorkerOptions};
use netsay_audio::AudioOutput;
use netsay_foundation::{AppError, AudioError};
use netsay_telemetry::PipelineMetrics;
use netsay_tts::{
    stream_wave, AudioChunkSink, SynthesisEngine, SynthesisStats, TtsResult, VoiceSpec, WaveBuffer,
};

/// Engine that records what it was asked to speak and emits a fixed-length
/// wave through the sink.
struct ScriptedEngine {
    spoken: Arc<Mutex<Vec<String>>>,
    samples_per_utterance: usize,
    utterance_delay: Duration,
    voice: Option<String>,
}

impl SynthesisEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn load_voice(&mut self, voice: &VoiceSpec) -> TtsResult<()> {
        self.voice = Some(voice.id.clone());
        Ok(())
    }

    fn synthesize(
        &mut self,
        text: &str,
        sink: &mut dyn AudioChunkSink,
    ) -> TtsResult<SynthesisStats> {
        std::thread::sleep(self.utterance_delay);
        self.spoken.lock().unwrap().push(text.to_string());
        let wave = WaveBuffer {
            sample_rate: 8_000,
            channels: 1,
            samples: vec![0; self.samples_per_utterance],
        };
        let completed = stream_wave(&wave, 256, sink);
        Ok(SynthesisStats {
            samples: wave.len() as u64,
            sample_rate: wave.sample_rate,
            stopped_early: !completed,
        })
    }
}

/// Output that accepts at most `accept_per_write` samples per call.
struct ShortOutput {
    accept_per_write: Option<usize>,
}

impl AudioOutput for ShortOutput {
    fn configure(&mut self, _sample_rate: u32) -> Result<(), AudioError> {
        Ok(())
    }

    fn write(&mut self, samples: &[i16], _timeout: Duration) -> Result<usize, AudioError> {
        Ok(self
            .accept_per_write
            .unwrap_or(samples.len())
            .min(samples.len()))
    }
}

struct Fixture {
    queue: mpsc::Sender<SpeechRequest>,
    worker: SynthWorkerHandle,
    spoken: Arc<Mutex<Vec<String>>>,
    metrics: Arc<PipelineMetrics>,
}

fn spawn_pipeline(
    capacity: usize,
    utterance_delay: Duration,
    accept_per_write: Option<usize>,
) -> Result<Fixture, AppError> {
    let (queue_tx, queue_rx) = mpsc::channel(capacity);
    let metrics = Arc::new(PipelineMetrics::new());
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let engine_spoken = spoken.clone();

    let worker = SynthWorker::spawn(
        SynthWorkerOptions {
            voice: VoiceSpec::default(),
            write_timeout: Duration::from_millis(100),
        },
        queue_rx,
        Box::new(move || {
            Ok(Box::new(ScriptedEngine {
                spoken: engine_spoken,
                samples_per_utterance: 600,
                utterance_delay,
                voice: None,
            }) as Box<dyn SynthesisEngine>)
        }),
        Box::new(move || Ok(Box::new(ShortOutput { accept_per_write }) as Box<dyn AudioOutput>)),
        metrics.clone(),
    )?;

    Ok(Fixture {
        queue: queue_tx,
        worker,
        spoken,
        metrics,
    })
}

fn request(text: &str) -> SpeechRequest {
    SpeechRequest {
        id: netsay_tts::next_utterance_id(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn requests_are_synthesized_in_fifo_order() {
    let fixture = spawn_pipeline(8, Duration::ZERO, None).unwrap();

    for text in ["one", "two", "three", "four", "five"] {
        fixture.queue.send(request(text)).await.unwrap();
    }

    // Closing the queue lets the worker drain and exit.
    drop(fixture.queue);
    let worker = fixture.worker;
    tokio::task::spawn_blocking(move || worker.join())
        .await
        .unwrap();

    assert_eq!(
        *fixture.spoken.lock().unwrap(),
        vec!["one", "two", "three", "four", "five"]
    );
    assert_eq!(
        fixture.metrics.utterances_completed.load(Ordering::Relaxed),
        5
    );
}

#[tokio::test]
async fn producer_blocks_when_queue_is_full_and_worker_is_slow() {
    // Capacity 1 and a slow utterance: request 1 is dequeued immediately,
    // request 2 parks in the slot, request 3 must wait for it to free.
    let fixture = spawn_pipeline(1, Duration::from_millis(400), None).unwrap();

    fixture.queue.send(request("a")).await.unwrap();
    fixture.queue.send(request("b")).await.unwrap();

    let blocked = fixture.queue.send(request("c"));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), blocked)
            .await
            .is_err(),
        "third enqueue should block while the queue is full"
    );

    // Once the worker frees a slot the send completes.
    tokio::time::timeout(Duration::from_secs(5), fixture.queue.send(request("c")))
        .await
        .expect("enqueue should unblock")
        .unwrap();

    drop(fixture.queue);
    let worker = fixture.worker;
    tokio::task::spawn_blocking(move || worker.join())
        .await
        .unwrap();
    assert_eq!(*fixture.spoken.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn short_writes_degrade_audio_but_never_abort_synthesis() {
    let fixture = spawn_pipeline(4, Duration::ZERO, Some(100)).unwrap();

    fixture.queue.send(request("clipped")).await.unwrap();
    fixture.queue.send(request("next")).await.unwrap();

    drop(fixture.queue);
    let worker = fixture.worker;
    tokio::task::spawn_blocking(move || worker.join())
        .await
        .unwrap();

    // Both utterances completed despite every chunk being short.
    assert_eq!(*fixture.spoken.lock().unwrap(), vec!["clipped", "next"]);
    assert_eq!(
        fixture.metrics.utterances_completed.load(Ordering::Relaxed),
        2
    );
    assert_eq!(fixture.metrics.synthesis_errors.load(Ordering::Relaxed), 0);
    assert!(fixture.metrics.write_shortfalls.load(Ordering::Relaxed) > 0);
    // Chunks of 256, 256 and 88 samples accept 100, 100 and 88.
    assert_eq!(
        fixture.metrics.samples_emitted.load(Ordering::Relaxed),
        2 * (100 + 100 + 88)
    );
}

#[tokio::test]
async fn worker_init_failure_is_fatal_at_startup() {
    let (_queue_tx, queue_rx) = mpsc::channel::<SpeechRequest>(4);
    let result = SynthWorker::spawn(
        SynthWorkerOptions {
            voice: VoiceSpec::default(),
            write_timeout: Duration::from_millis(100),
        },
        queue_rx,
        Box::new(|| Err(AppError::Tts("no engine installed".to_string()))),
        Box::new(|| Ok(Box::new(ShortOutput { accept_per_write: None }) as Box<dyn AudioOutput>)),
        Arc::new(PipelineMetrics::new()),
    );
    assert!(matches!(result, Err(AppError::Tts(_))));
}
