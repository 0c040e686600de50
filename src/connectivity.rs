//! Connectivity signal.
//!
//! Reachability of the endpoint is probed periodically and turned into
//! edge-triggered events: one event per transition, never one per probe.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info};

use crate::error::SyncError;

/// A transition between reachable and unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The endpoint became reachable.
    Online,
    /// The endpoint became unreachable.
    Offline,
}

/// A reachability check.
#[cfg_attr(test, mockall::automock)]
pub trait Probe: Send {
    /// Whether the endpoint can currently be reached.
    fn is_reachable(&self) -> bool;
}

/// Probes reachability by opening a TCP connection to the endpoint.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe the host and port of `url`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the URL has no host or known port.
    pub fn for_url(url: &Url, timeout: Duration) -> Result<Self, SyncError> {
        let host = url
            .host_str()
            .ok_or_else(|| SyncError::Config(format!("URL has no host: {url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SyncError::Config(format!("URL has no known port: {url}")))?;

        Ok(Self {
            host: host.to_string(),
            port,
            timeout,
        })
    }
}

impl Probe for TcpProbe {
    fn is_reachable(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(host = %self.host, error = %e, "could not resolve endpoint");
                return false;
            },
        };

        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok())
    }
}

/// Tracks the last known state and reports transitions.
pub struct ConnectivityMonitor<P> {
    probe: P,
    online: bool,
}

impl<P: Probe> ConnectivityMonitor<P> {
    /// Create a monitor that assumes `initially_online` until the first probe.
    pub const fn new(probe: P, initially_online: bool) -> Self {
        Self {
            probe,
            online: initially_online,
        }
    }

    /// Last known state.
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// Probe once and return an event if the state changed.
    pub fn poll(&mut self) -> Option<ConnectivityEvent> {
        let reachable = self.probe.is_reachable();
        if reachable == self.online {
            return None;
        }

        self.online = reachable;
        let event = if reachable {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        info!(?event, "connectivity changed");
        Some(event)
    }
}

impl<P: Probe + 'static> ConnectivityMonitor<P> {
    /// Poll on a background thread every `interval`, sending events to `events`.
    ///
    /// The thread exits when the handle is stopped or the receiver is dropped.
    pub fn spawn<E>(mut self, interval: Duration, events: Sender<E>) -> MonitorHandle
    where
        E: From<ConnectivityEvent> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::spawn(move || loop {
            if let Some(event) = self.poll() {
                if events.send(event.into()).is_err() {
                    break;
                }
            }

            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        MonitorHandle { stop_tx, join }
    }
}

/// Handle to a running monitor thread.
pub struct MonitorHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the monitor and wait for its thread to exit.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.join.join().is_err() {
            debug!("connectivity monitor thread panicked");
        }
    }
}
