//! Connectivity lifecycle for the request front end.
//!
//! The link layer (Wi-Fi association, DHCP, or the loopback stand-in) feeds
//! [`LinkEvent`]s into a small state machine. The machine is the sole owner
//! of the "front end installed" bit: it decides when the HTTP server is
//! installed or uninstalled, and the supervisor merely executes the emitted
//! [`LinkAction`]s.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Interface is up but not yet associated.
    LinkUp,
    /// Association finished and an address was acquired.
    AddressAcquired { addr: IpAddr },
    /// Link lost, from any state.
    Disconnected,
}

/// Side effects the supervisor must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Fire-and-forget (re)connect attempt; retry policy belongs to the
    /// link layer.
    Connect,
    InstallFrontEnd,
    UninstallFrontEnd,
}

/// Pure transition core, testable without any network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkMachine {
    state: LinkState,
    front_end_installed: bool,
}

impl Default for LinkMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMachine {
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            front_end_installed: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn front_end_installed(&self) -> bool {
        self.front_end_installed
    }

    /// Applies one event and returns the actions it requires. Repeated
    /// events are idempotent: the front end is never installed or
    /// uninstalled twice.
    pub fn step(&mut self, event: &LinkEvent) -> Vec<LinkAction> {
        let mut actions = Vec::new();
        match event {
            LinkEvent::LinkUp => {
                actions.push(LinkAction::Connect);
                self.state = LinkState::Connecting;
            }
            LinkEvent::AddressAcquired { .. } => {
                self.state = LinkState::Connected;
                if !self.front_end_installed {
                    self.front_end_installed = true;
                    actions.push(LinkAction::InstallFrontEnd);
                }
            }
            LinkEvent::Disconnected => {
                actions.push(LinkAction::Connect);
                if self.front_end_installed {
                    self.front_end_installed = false;
                    actions.push(LinkAction::UninstallFrontEnd);
                }
                self.state = LinkState::Disconnected;
            }
        }
        actions
    }

    /// Called by the supervisor when an install action could not be carried
    /// out (bind failure). Clears the bit so the next address acquisition
    /// retries the install.
    pub fn install_failed(&mut self) {
        self.front_end_installed = false;
    }
}

/// Shared wrapper around [`LinkMachine`] with a state-change subscription
/// stream for observers.
#[derive(Clone)]
pub struct LinkStateManager {
    machine: Arc<RwLock<LinkMachine>>,
    state_tx: Sender<LinkState>,
    state_rx: Receiver<LinkState>,
}

impl Default for LinkStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            machine: Arc::new(RwLock::new(LinkMachine::new())),
            state_tx,
            state_rx,
        }
    }

    pub fn on_event(&self, event: &LinkEvent) -> Vec<LinkAction> {
        let mut machine = self.machine.write();
        let before = machine.state();
        let actions = machine.step(event);
        let after = machine.state();
        if before != after {
            tracing::info!("Link state transition: {:?} -> {:?}", before, after);
            let _ = self.state_tx.send(after);
        }
        actions
    }

    pub fn current(&self) -> LinkState {
        self.machine.read().state()
    }

    pub fn front_end_installed(&self) -> bool {
        self.machine.read().front_end_installed()
    }

    pub fn install_failed(&self) {
        self.machine.write().install_failed();
    }

    pub fn subscribe(&self) -> Receiver<LinkState> {
        self.state_rx.clone()
    }
}
