//! Connectivity supervision
//!
//! A [`LinkMonitor`] collaborator owns association and address acquisition
//! and reports [`LinkEvent`]s; the supervisor feeds them through the
//! foundation state machine and executes the resulting actions, installing
//! or uninstalling the request front end. The state machine alone decides
//! when installs happen; the supervisor only carries them out.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use netsay_foundation::{LinkAction, LinkEvent, LinkStateManager};

use crate::http::{HttpState, ServerHandle};

/// Issues (re)connect attempts. Fire-and-forget; retry policy lives in the
/// link layer, not here.
pub trait LinkControl: Send + Sync {
    fn connect(&self);
}

/// Loopback stand-in for a real link monitor: reports the link up and an
/// address acquired as soon as the supervisor is listening. Useful on hosts
/// where the network is managed elsewhere.
pub struct StaticLink;

impl StaticLink {
    pub fn start() -> (Arc<dyn LinkControl>, mpsc::Receiver<LinkEvent>) {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let _ = tx.send(LinkEvent::LinkUp).await;
            let _ = tx
                .send(LinkEvent::AddressAcquired {
                    addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
                })
                .await;
        });
        (Arc::new(StaticLink), rx)
    }
}

impl LinkControl for StaticLink {
    fn connect(&self) {
        debug!("loopback link: connect is a no-op");
    }
}

pub struct ConnectivitySupervisor {
    link: LinkStateManager,
    control: Arc<dyn LinkControl>,
    events: mpsc::Receiver<LinkEvent>,
    http_state: HttpState,
    listen_addr: SocketAddr,
    server: Option<ServerHandle>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl ConnectivitySupervisor {
    pub fn new(
        link: LinkStateManager,
        control: Arc<dyn LinkControl>,
        events: mpsc::Receiver<LinkEvent>,
        http_state: HttpState,
        listen_addr: SocketAddr,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            link,
            control,
            events,
            http_state,
            listen_addr,
            server: None,
            shutdown_rx,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => {
                        debug!(?event, "link event");
                        for action in self.link.on_event(&event) {
                            self.apply(action).await;
                        }
                    }
                    None => break,
                },
                _ = &mut self.shutdown_rx => break,
            }
        }
        if let Some(server) = self.server.take() {
            server.shutdown().await;
        }
        info!("connectivity supervisor stopped");
    }

    async fn apply(&mut self, action: LinkAction) {
        match action {
            LinkAction::Connect => self.control.connect(),
            LinkAction::InstallFrontEnd => {
                match ServerHandle::bind(self.listen_addr, self.http_state.clone()).await {
                    Ok(handle) => self.server = Some(handle),
                    Err(e) => {
                        error!("failed to install request front end: {}", e);
                        // Clear the installed bit so the next address
                        // acquisition retries.
                        self.link.install_failed();
                    }
                }
            }
            LinkAction::UninstallFrontEnd => {
                if let Some(server) = self.server.take() {
                    server.shutdown().await;
                }
            }
        }
    }
}
