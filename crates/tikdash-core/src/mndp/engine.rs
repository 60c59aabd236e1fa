// ── Discovery engine ──
//
// Active scan: one UDP socket, request re-broadcast on a fixed cadence
// while a spawned reader task pushes decoded announcements into a
// bounded channel; the scan routine drains it until the window
// deadline. Passive listener: same bind, no timer, caller owns
// shutdown through the returned handle.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::CoreError;
use crate::mndp::codec::{self, MNDP_PORT};
use crate::model::DiscoveredDevice;

/// Length of the scan window for an active discovery run.
pub const SCAN_WINDOW: Duration = Duration::from_secs(5);

/// Cadence at which the request is re-broadcast during the window.
/// Repetition compensates for UDP loss and slow responders.
pub const SEND_INTERVAL: Duration = Duration::from_secs(1);

const RECV_BUFFER_LEN: usize = 2048;
const DEVICE_CHANNEL_CAPACITY: usize = 64;

/// Run one active scan with the protocol defaults.
pub async fn discover() -> Vec<DiscoveredDevice> {
    Discovery::default().scan().await
}

/// Discovery engine configuration. The defaults are the protocol's;
/// tests shrink the window and move the port.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub port: u16,
    pub window: Duration,
    pub interval: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            port: MNDP_PORT,
            window: SCAN_WINDOW,
            interval: SEND_INTERVAL,
        }
    }
}

impl Discovery {
    /// Active scan: broadcast requests for the whole window, collect
    /// announcements, and return the per-MAC deduplicated result
    /// (last seen wins).
    ///
    /// Never fails: a socket that cannot bind, or dies mid-scan,
    /// resolves to whatever was collected so far — discovery trouble
    /// must not take the caller down.
    pub async fn scan(&self) -> Vec<DiscoveredDevice> {
        match self.try_scan().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "discovery scan failed; returning empty result");
                Vec::new()
            }
        }
    }

    async fn try_scan(&self) -> Result<Vec<DiscoveredDevice>, CoreError> {
        let socket = Arc::new(bind_discovery_socket(self.port)?);
        info!(port = self.port, "discovery scan started");

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(DEVICE_CHANNEL_CAPACITY);
        let reader = tokio::spawn(receive_task(Arc::clone(&socket), tx, cancel.clone()));

        let request = codec::encode_request();
        let targets = broadcast_targets(self.port);
        debug!(?targets, "broadcast targets");

        let deadline = tokio::time::sleep(self.window);
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval(self.interval);

        let mut found: HashMap<String, DiscoveredDevice> = HashMap::new();

        loop {
            tokio::select! {
                biased;
                () = &mut deadline => break,
                _ = ticker.tick() => {
                    for target in &targets {
                        if let Err(e) = socket.send_to(&request, target).await {
                            debug!(error = %e, %target, "discovery send failed");
                        }
                    }
                }
                received = rx.recv() => {
                    // The reader only quits on socket failure; resolve
                    // with what we have instead of waiting out the window.
                    let Some(device) = received else { break };
                    if let Some(mac) = device.mac_address.clone() {
                        found.insert(mac, device);
                    }
                }
            }
        }

        cancel.cancel();
        let _ = reader.await;

        let mut devices: Vec<DiscoveredDevice> = found.into_values().collect();
        devices.sort_by(|a, b| a.identity.cmp(&b.identity));
        info!(count = devices.len(), "discovery scan complete");
        Ok(devices)
    }

    /// Passive listener: deliver every valid announcement to the
    /// callback, without deduplication, until the returned handle is
    /// closed (or dropped).
    pub fn listen<F>(&self, on_device: F) -> Result<ListenerHandle, CoreError>
    where
        F: Fn(DiscoveredDevice) + Send + 'static,
    {
        let socket = bind_discovery_socket(self.port)?;
        info!(port = self.port, "passive discovery listener active");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(listen_task(socket, on_device, cancel.clone()));
        Ok(ListenerHandle { cancel, task })
    }
}

/// Shutdown handle for a passive listener. Dropping it stops delivery.
pub struct ListenerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop delivering announcements.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the listener task to wind down.
    pub async fn join(mut self) {
        self.cancel.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Socket plumbing ──────────────────────────────────────────────────

/// Bind the discovery socket on all interfaces with address reuse (so
/// concurrent scans can coexist) and broadcast sending enabled.
fn bind_discovery_socket(port: u16) -> Result<UdpSocket, CoreError> {
    let bind_with = || -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        socket.bind(&addr.into())?;
        UdpSocket::from_std(std::net::UdpSocket::from(socket))
    };

    bind_with().map_err(|e| CoreError::Unknown {
        message: format!("cannot bind discovery socket on port {port}: {e}"),
    })
}

/// Destinations for the request packet: the general broadcast address
/// plus the subnet broadcast of every non-loopback IPv4 interface.
/// With no usable interfaces, the general broadcast alone remains.
fn broadcast_targets(port: u16) -> Vec<SocketAddr> {
    let mut targets = vec![SocketAddr::from((Ipv4Addr::BROADCAST, port))];

    match if_addrs::get_if_addrs() {
        Ok(interfaces) => {
            for iface in interfaces {
                if iface.is_loopback() {
                    continue;
                }
                if let if_addrs::IfAddr::V4(ref v4) = iface.addr {
                    let target =
                        SocketAddr::from((subnet_broadcast(v4.ip, v4.netmask), port));
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot enumerate interfaces; using the general broadcast only");
        }
    }

    targets
}

/// `broadcast = address | !netmask`, per octet.
fn subnet_broadcast(address: Ipv4Addr, netmask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(address) | !u32::from(netmask))
}

// ── Receive paths ────────────────────────────────────────────────────

async fn receive_task(
    socket: Arc<UdpSocket>,
    tx: mpsc::Sender<DiscoveredDevice>,
    cancel: CancellationToken,
) {
    let mut buffer = vec![0u8; RECV_BUFFER_LEN];

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = socket.recv_from(&mut buffer) => match received {
                Ok((len, source)) => {
                    if let Some(device) = decode_datagram(&buffer[..len], source) {
                        if tx.send(device).await.is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    // Dropping the sender resolves the scan with the
                    // devices collected so far.
                    debug!(error = %e, "discovery receive failed");
                    break;
                }
            }
        }
    }
}

async fn listen_task<F>(socket: UdpSocket, on_device: F, cancel: CancellationToken)
where
    F: Fn(DiscoveredDevice) + Send + 'static,
{
    let mut buffer = vec![0u8; RECV_BUFFER_LEN];

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = socket.recv_from(&mut buffer) => match received {
                Ok((len, source)) => {
                    if let Some(device) = decode_datagram(&buffer[..len], source) {
                        on_device(device);
                    }
                }
                Err(e) => warn!(error = %e, "discovery listener receive failed"),
            }
        }
    }

    debug!("discovery listener stopped");
}

/// Decode one datagram and stamp provenance. Returns `None` for noise:
/// malformed payloads and our own request echoed back both decode to
/// devices without MAC or identity.
fn decode_datagram(datagram: &[u8], source: SocketAddr) -> Option<DiscoveredDevice> {
    let mut device = codec::decode(datagram);

    if !device.is_usable() {
        trace!(%source, len = datagram.len(), "skipping datagram without mac/identity");
        return None;
    }

    device.source_address = Some(source.ip());
    device.discovered_at = Some(Utc::now());
    debug!(
        identity = device.identity.as_deref().unwrap_or_default(),
        mac = device.mac_address.as_deref().unwrap_or_default(),
        %source,
        "discovered device"
    );
    Some(device)
}
