//! Request front end
//!
//! One route, `GET /say?s=<encoded text>`. Every request that reaches the
//! handler is acknowledged with a fixed `"Ok"` body; the acknowledgment
//! means "received and parsed", never that the text was enqueued or
//! synthesized. Parse and validation failures are dropped silently (logged
//! at debug), and a full queue delays the acknowledgment via backpressure
//! rather than dropping the request.

pub mod decode;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use netsay_foundation::AppError;
use netsay_telemetry::PipelineMetrics;
use netsay_tts::next_utterance_id;

use crate::request::SpeechRequest;

/// Fixed acknowledgment body.
pub const ACK_BODY: &str = "Ok";

/// Query key carrying the text to speak.
pub const TEXT_PARAM: &str = "s";

#[derive(Clone)]
pub struct HttpState {
    pub queue: mpsc::Sender<SpeechRequest>,
    pub max_text_bytes: usize,
    pub metrics: Arc<PipelineMetrics>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/say", get(say_handler))
        .with_state(state)
}

#[derive(Debug, Error)]
enum RejectReason {
    #[error("decoded text is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("decoded text is not valid UTF-8")]
    InvalidUtf8,
    #[error("decoded text is empty")]
    Empty,
}

/// Decode and validate the raw parameter value into payload text.
///
/// Over-long text is rejected outright rather than truncated; truncation
/// could split a codepoint and hand the engine corrupt text.
fn decode_text(raw: &str, max_bytes: usize) -> Result<String, RejectReason> {
    let mut buf = raw.as_bytes().to_vec();
    decode::percent_decode_in_place(&mut buf);
    if buf.len() > max_bytes {
        return Err(RejectReason::TooLong {
            len: buf.len(),
            max: max_bytes,
        });
    }
    let text = String::from_utf8(buf).map_err(|_| RejectReason::InvalidUtf8)?;
    if text.trim().is_empty() {
        return Err(RejectReason::Empty);
    }
    Ok(text)
}

pub async fn say_handler(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
) -> &'static str {
    state.metrics.record_request_received();

    if let Some(raw) = query
        .as_deref()
        .filter(|q| !q.is_empty())
        .and_then(|q| decode::query_param(q, TEXT_PARAM))
    {
        match decode_text(raw, state.max_text_bytes) {
            Ok(text) => {
                let request = SpeechRequest {
                    id: next_utterance_id(),
                    text,
                };
                debug!(id = request.id, text = %request.text, "queueing speech request");
                // Suspends while the queue is full; the acknowledgment is
                // delayed accordingly.
                match state.queue.send(request).await {
                    Ok(()) => state.metrics.record_request_enqueued(),
                    Err(send_err) => {
                        // Consumer is gone; the payload is released here and
                        // never referenced again.
                        error!(
                            id = send_err.0.id,
                            "speech queue closed, dropping request"
                        );
                        state.metrics.record_request_rejected();
                    }
                }
            }
            Err(reason) => {
                debug!(%reason, "dropping speech request");
                state.metrics.record_request_rejected();
            }
        }
    }

    // Received and parsed; says nothing about synthesis.
    ACK_BODY
}

/// A bound, serving front end. Dropping the handle leaks the task; use
/// [`ServerHandle::shutdown`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Bind and start serving. Fails if the address is unavailable.
    pub async fn bind(addr: SocketAddr, state: HttpState) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Fatal(format!("failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::Fatal(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = router(state);
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                error!("http server error: {}", e);
            }
        });

        info!(addr = %local_addr, "request front end installed");
        Ok(Self {
            local_addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
        info!(addr = %self.local_addr, "request front end uninstalled");
    }
}
