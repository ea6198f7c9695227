//! Synthesis worker
//!
//! A dedicated thread owns the synthesis engine, the voice, and the audio
//! output for the lifetime of the process. It drains the speech queue one
//! request at a time; synthesis and audio output are fully serialized by
//! construction. There is no shutdown protocol beyond the queue closing,
//! which only happens at process teardown.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{error, info};

use netsay_audio::{AudioOutput, StreamSession};
use netsay_foundation::AppError;
use netsay_telemetry::PipelineMetrics;
use netsay_tts::{SynthesisEngine, VoiceSpec};

use crate::request::SpeechRequest;

pub struct SynthWorkerOptions {
    pub voice: VoiceSpec,
    pub write_timeout: Duration,
}

type EngineFactory =
    Box<dyn FnOnce() -> Result<Box<dyn SynthesisEngine>, AppError> + Send>;
type OutputFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioOutput>, AppError> + Send>;

pub struct SynthWorkerHandle {
    handle: thread::JoinHandle<()>,
}

impl SynthWorkerHandle {
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

pub struct SynthWorker;

impl SynthWorker {
    /// Spawn the worker thread and wait for its initialization handshake.
    ///
    /// The engine and output are constructed on the worker thread itself
    /// (audio backends are not generally movable across threads). An
    /// initialization failure is fatal: it is reported back here and the
    /// pipeline never starts.
    pub fn spawn(
        options: SynthWorkerOptions,
        queue: mpsc::Receiver<SpeechRequest>,
        engine_factory: EngineFactory,
        output_factory: OutputFactory,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<SynthWorkerHandle, AppError> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AppError>>();

        let handle = thread::Builder::new()
            .name("synth-worker".to_string())
            .spawn(move || {
                let (engine, output) = match init(&options, engine_factory, output_factory) {
                    Ok(parts) => {
                        let _ = ready_tx.send(Ok(()));
                        parts
                    }
                    Err(e) => {
                        error!("synthesis worker initialization failed: {}", e);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_loop(engine, output, queue, options, metrics);
            })
            .map_err(|e| AppError::Fatal(format!("failed to spawn synthesis worker: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| AppError::Fatal("synthesis worker exited during startup".to_string()))??;
        Ok(SynthWorkerHandle { handle })
    }
}

fn init(
    options: &SynthWorkerOptions,
    engine_factory: EngineFactory,
    output_factory: OutputFactory,
) -> Result<(Box<dyn SynthesisEngine>, Box<dyn AudioOutput>), AppError> {
    let output = output_factory()?;
    let mut engine = engine_factory()?;
    engine
        .load_voice(&options.voice)
        .map_err(|e| AppError::Tts(e.to_string()))?;
    Ok((engine, output))
}

fn run_loop(
    mut engine: Box<dyn SynthesisEngine>,
    mut output: Box<dyn AudioOutput>,
    mut queue: mpsc::Receiver<SpeechRequest>,
    options: SynthWorkerOptions,
    metrics: Arc<PipelineMetrics>,
) {
    info!(engine = engine.name(), voice = %options.voice.id, "synthesis worker started");

    // Blocks while the queue is empty; requests are processed strictly in
    // FIFO order, one utterance at a time.
    while let Some(request) = queue.blocking_recv() {
        metrics.record_utterance_started();
        let started = Instant::now();

        let mut session = StreamSession::new(output.as_mut())
            .with_timeout(options.write_timeout)
            .with_metrics(metrics.clone());

        match engine.synthesize(&request.text, &mut session) {
            Ok(stats) => {
                metrics.record_utterance_completed();
                info!(
                    id = request.id,
                    samples = stats.samples,
                    sample_rate = stats.sample_rate,
                    stopped_early = stats.stopped_early,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "utterance finished"
                );
            }
            Err(e) => {
                metrics.record_synthesis_error();
                error!(id = request.id, "synthesis failed: {}", e);
            }
        }
        // The request is dropped here; its ownership ends with the
        // utterance.
    }

    info!("speech queue closed, synthesis worker exiting");
}
