use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::datagram::{decode_hazard, encode_position};
use super::mailbox::{SnapshotMailbox, TelemetrySnapshot};
use crate::error::TelemetryError;

/// Largest UDP payload; a full grid datagram is roughly 16 KiB.
const MAX_DATAGRAM: usize = 65_536;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub bind_host: String,
    pub rx_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
    /// Upper bound on how long shutdown waits for a blocked receive.
    pub shutdown_poll_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            rx_port: 8000,
            remote_host: "127.0.0.1".into(),
            remote_port: 8001,
            shutdown_poll_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Link seam used by the tick loop
// ---------------------------------------------------------------------------

/// What the tick loop needs from telemetry. Neither call may block on
/// network arrival.
pub trait TelemetryLink {
    fn latest(&self) -> Option<Arc<TelemetrySnapshot>>;
    fn send_position(&self, position: &Vector3<f64>) -> Result<(), TelemetryError>;
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    rejected: AtomicU64,
    receive_errors: AtomicU64,
    send_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub received: u64,
    pub rejected: u64,
    pub receive_errors: u64,
    pub send_failures: u64,
}

// ---------------------------------------------------------------------------
// TelemetryChannel
// ---------------------------------------------------------------------------

/// UDP link to the perception process: a background thread receives hazard
/// maps into a [`SnapshotMailbox`]; position reports go out on the same
/// socket from the caller's thread.
pub struct TelemetryChannel {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    mailbox: Arc<SnapshotMailbox>,
    counters: Arc<Counters>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TelemetryChannel {
    /// Bind the receive port, resolve the destination and start the
    /// receiver thread.
    pub fn open(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let bind = format!("{}:{}", config.bind_host, config.rx_port);
        let socket = UdpSocket::bind(&bind).map_err(|source| TelemetryError::Bind {
            addr: bind.clone(),
            source,
        })?;

        let dest = format!("{}:{}", config.remote_host, config.remote_port);
        let remote = dest
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| TelemetryError::Resolve(dest.clone()))?;

        let poll = Duration::from_millis(config.shutdown_poll_ms.max(1));
        socket
            .set_read_timeout(Some(poll))
            .map_err(TelemetryError::Socket)?;

        let local = socket.local_addr().map_err(TelemetryError::Socket)?;
        let socket = Arc::new(socket);
        let mailbox = Arc::new(SnapshotMailbox::new());
        let counters = Arc::new(Counters::default());
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let socket = Arc::clone(&socket);
            let mailbox = Arc::clone(&mailbox);
            let counters = Arc::clone(&counters);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("telemetry-rx".into())
                .spawn(move || receive_loop(&socket, &mailbox, &counters, &stop, poll))
                .map_err(TelemetryError::Spawn)?
        };

        info!(%local, %remote, "telemetry channel open");

        Ok(Self {
            socket,
            remote,
            mailbox,
            counters,
            stop,
            worker: Some(worker),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn mailbox(&self) -> Arc<SnapshotMailbox> {
        Arc::clone(&self.mailbox)
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            received: self.counters.received.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            receive_errors: self.counters.receive_errors.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the receiver and wait for it. Returns within one poll interval.
    /// Idempotent; also run on drop.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("telemetry receiver panicked");
            }
            info!(stats = ?self.stats(), "telemetry channel closed");
        }
    }
}

impl TelemetryLink for TelemetryChannel {
    fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.mailbox.latest()
    }

    fn send_position(&self, position: &Vector3<f64>) -> Result<(), TelemetryError> {
        let msg = encode_position(position);
        match self.socket.send_to(msg.as_bytes(), self.remote) {
            Ok(_) => Ok(()),
            Err(source) => {
                self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
                Err(TelemetryError::Send {
                    dest: self.remote,
                    source,
                })
            }
        }
    }
}

impl Drop for TelemetryChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(
    socket: &UdpSocket,
    mailbox: &SnapshotMailbox,
    counters: &Counters,
    stop: &AtomicBool,
    poll: Duration,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    while !stop.load(Ordering::Acquire) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(e) => {
                // e.g. ICMP port unreachable surfacing from an earlier send
                counters.receive_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "telemetry receive failed");
                thread::sleep(poll);
                continue;
            }
        };

        match decode_hazard(&buf[..len]) {
            Ok(map) => {
                counters.received.fetch_add(1, Ordering::Relaxed);
                let centroid = map.centroid();
                let seq = mailbox.publish(map);
                debug!(%from, seq, ?centroid, "hazard map published");
            }
            Err(e) => {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(%from, bytes = len, error = %e, "discarding malformed datagram");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::datagram::encode_hazard;
    use crate::perception::hazard::{Centroid, HazardMap, CELL_SAFE, CELL_UNSAFE};
    use std::time::Instant;

    fn loopback_config(peer: SocketAddr) -> TelemetryConfig {
        TelemetryConfig {
            bind_host: "127.0.0.1".into(),
            rx_port: 0,
            remote_host: peer.ip().to_string(),
            remote_port: peer.port(),
            shutdown_poll_ms: 20,
        }
    }

    fn peer() -> UdpSocket {
        let s = UdpSocket::bind("127.0.0.1:0").unwrap();
        s.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        s
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn map(fill: u8, local: (usize, usize), global: (i64, i64)) -> HazardMap {
        HazardMap::filled(fill, Centroid { local, global }).unwrap()
    }

    #[test]
    fn publishes_inbound_hazard_map() {
        let peer = peer();
        let chan = TelemetryChannel::open(&loopback_config(peer.local_addr().unwrap())).unwrap();
        assert!(chan.latest().is_none());

        let text = encode_hazard(&map(CELL_SAFE, (10, 20), (500, 600)));
        peer.send_to(text.as_bytes(), chan.local_addr().unwrap()).unwrap();

        assert!(wait_for(|| chan.latest().is_some()));
        let snap = chan.latest().unwrap();
        assert_eq!(snap.hazard.centroid().local, (10, 20));
        assert_eq!(snap.hazard.centroid().global, (500, 600));
        assert!(snap.hazard.cells().iter().all(|&c| c == CELL_SAFE));
        assert_eq!(chan.stats().received, 1);
    }

    #[test]
    fn malformed_datagram_keeps_previous_snapshot() {
        let peer = peer();
        let chan = TelemetryChannel::open(&loopback_config(peer.local_addr().unwrap())).unwrap();
        let dest = chan.local_addr().unwrap();

        let first = encode_hazard(&map(CELL_UNSAFE, (1, 2), (3, 4)));
        peer.send_to(first.as_bytes(), dest).unwrap();
        assert!(wait_for(|| chan.latest().is_some()));

        peer.send_to(b"255,0;1;2", dest).unwrap();
        assert!(wait_for(|| chan.stats().rejected == 1));
        let snap = chan.latest().unwrap();
        assert_eq!(snap.sequence, 1);
        assert_eq!(snap.hazard.centroid().global, (3, 4));

        // receiver is still alive
        assert!(chan.is_running());
        let second = encode_hazard(&map(CELL_SAFE, (5, 6), (7, 8)));
        peer.send_to(second.as_bytes(), dest).unwrap();
        assert!(wait_for(|| chan.latest().is_some_and(|s| s.sequence == 2)));
        assert_eq!(chan.latest().unwrap().hazard.centroid().local, (5, 6));
    }

    #[test]
    fn sends_position_reports() {
        let peer = peer();
        let chan = TelemetryChannel::open(&loopback_config(peer.local_addr().unwrap())).unwrap();
        chan.send_position(&Vector3::new(100.5, 47.0, -2.0)).unwrap();

        let mut buf = [0u8; 128];
        let (n, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"100.5,47,-2");
        assert_eq!(from, chan.local_addr().unwrap());
    }

    #[test]
    fn shutdown_joins_receiver_promptly() {
        let peer = peer();
        let mut chan =
            TelemetryChannel::open(&loopback_config(peer.local_addr().unwrap())).unwrap();
        assert!(chan.is_running());
        let started = Instant::now();
        chan.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!chan.is_running());
        // second call is a no-op
        chan.shutdown();
    }

    #[test]
    fn open_reports_the_bound_address() {
        let peer = peer();
        let chan = TelemetryChannel::open(&loopback_config(peer.local_addr().unwrap())).unwrap();
        let local = chan.local_addr().unwrap();
        assert_eq!(local.ip().to_string(), "127.0.0.1");
        assert_ne!(local.port(), 0);
        assert!(chan.is_running());
    }

    #[test]
    fn bind_conflict_is_reported() {
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
        let cfg = TelemetryConfig {
            bind_host: "127.0.0.1".into(),
            rx_port: taken.local_addr().unwrap().port(),
            ..TelemetryConfig::default()
        };
        assert!(matches!(
            TelemetryChannel::open(&cfg),
            Err(TelemetryError::Bind { .. })
        ));
    }
}
