//! Pipeline wiring
//!
//! Builds the process-wide pipeline once at startup: the bounded speech
//! queue, the synthesis worker thread that consumes it, and the
//! connectivity supervisor that installs the HTTP front end feeding it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use netsay_audio::{AudioOutput, CpalOutput};
use netsay_foundation::{AppConfig, AppError, LinkStateManager};
use netsay_telemetry::PipelineMetrics;
use netsay_tts::{SynthesisEngine, VoiceSpec};
use netsay_tts_espeak::EspeakEngine;

use crate::http::HttpState;
use crate::net::{ConnectivitySupervisor, StaticLink};
use crate::request::SpeechRequest;
use crate::synth::{SynthWorker, SynthWorkerHandle, SynthWorkerOptions};

/// Handle to the running pipeline.
pub struct AppHandle {
    pub metrics: Arc<PipelineMetrics>,
    pub link: LinkStateManager,
    queue_tx: mpsc::Sender<SpeechRequest>,
    supervisor_shutdown: oneshot::Sender<()>,
    supervisor_handle: JoinHandle<()>,
    worker: SynthWorkerHandle,
}

impl AppHandle {
    /// A producer handle onto the speech queue, for probes and tests.
    pub fn speech_queue(&self) -> mpsc::Sender<SpeechRequest> {
        self.queue_tx.clone()
    }

    /// Stop the async side, then close the queue and wait for the worker
    /// to drain.
    pub async fn shutdown(self) {
        info!("Shutting down netsay runtime...");
        let _ = self.supervisor_shutdown.send(());
        let _ = self.supervisor_handle.await;

        drop(self.queue_tx);
        let worker = self.worker;
        let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        info!("netsay runtime stopped");
    }
}

pub async fn start(config: AppConfig) -> Result<AppHandle, AppError> {
    config.validate()?;
    let listen_addr: SocketAddr = config
        .listen_addr
        .parse()
        .map_err(|e| AppError::Config(format!("listen_addr: {}", e)))?;

    let metrics = Arc::new(PipelineMetrics::new());
    let (queue_tx, queue_rx) = mpsc::channel::<SpeechRequest>(config.queue_capacity);

    let voice = VoiceSpec {
        id: config.voice.id.clone(),
        rate_wpm: config.voice.rate_wpm,
        ..VoiceSpec::default()
    };
    let device = config.audio.device.clone();
    let worker = SynthWorker::spawn(
        SynthWorkerOptions {
            voice,
            write_timeout: config.write_timeout(),
        },
        queue_rx,
        Box::new(|| Ok(Box::new(EspeakEngine::new()) as Box<dyn SynthesisEngine>)),
        Box::new(move || Ok(Box::new(CpalOutput::new(device)) as Box<dyn AudioOutput>)),
        metrics.clone(),
    )?;
    info!("synthesis worker started");

    let http_state = HttpState {
        queue: queue_tx.clone(),
        max_text_bytes: config.max_text_bytes,
        metrics: metrics.clone(),
    };
    let link = LinkStateManager::new();
    let (control, events) = StaticLink::start();
    let (supervisor_shutdown, shutdown_rx) = oneshot::channel();
    let supervisor_handle = ConnectivitySupervisor::new(
        link.clone(),
        control,
        events,
        http_state,
        listen_addr,
        shutdown_rx,
    )
    .spawn();
    info!(addr = %listen_addr, "connectivity supervisor started");

    Ok(AppHandle {
        metrics,
        link,
        queue_tx,
        supervisor_shutdown,
        supervisor_handle,
        worker,
    })
}
