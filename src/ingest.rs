//! UDP frame ingestion.
//!
//! Each datagram carries one frame: `width × height × 3` bytes of row-major RGB, optionally
//! followed by a 4-byte big-endian CRC32 of those bytes. [`decode_datagram`] applies the
//! framing rules; [`FrameListener`] binds the socket, filters senders, and hands out
//! accepted frames, either one at a time, as a stream, or through a bounded channel fed by
//! a receiver task.
//!
//! Malformed datagrams are never an error for the caller. They are counted, logged at
//! `debug` or `trace`, and skipped.

use core::fmt;
use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::Stream;
use serde::Deserialize;
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle};
use tracing::{debug, info, trace};

use crate::{Error, Result};

/// Length of the optional CRC trailer.
pub const CRC_LEN: usize = 4;

/// Default UDP port.
pub const DEFAULT_PORT: u16 = 1337;

/// What to do with a non-zero CRC trailer that does not match the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Accept the frame anyway and count the anomaly. Senders in the field have never been
    /// rejected for a bad checksum, so this is the default.
    #[default]
    Legacy,
    /// Drop the frame.
    Strict,
}

/// How a frame's checksum trailer was judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// No trailer was sent.
    Absent,
    /// The trailer was zero, which means "not computed".
    Zero,
    /// The trailer matched.
    Valid,
    /// The trailer did not match but the policy let the frame through.
    Mismatch {
        /// CRC carried by the datagram.
        expected: u32,
        /// CRC computed over the payload.
        actual: u32,
    },
}

/// Why a datagram was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Rejection {
    /// Length is neither `frame_size` nor `frame_size + 4`.
    #[display("invalid frame size {len} (expected {frame_size} or {})", frame_size + CRC_LEN)]
    Length {
        /// Received length.
        len: usize,
        /// Expected payload length.
        frame_size: usize,
    },
    /// Non-zero CRC mismatch under [`ChecksumPolicy::Strict`].
    #[display("invalid frame CRC: datagram says {expected:#010x}, payload is {actual:#010x}")]
    Checksum {
        /// CRC carried by the datagram.
        expected: u32,
        /// CRC computed over the payload.
        actual: u32,
    },
}

/// Validate one datagram and return its pixel payload.
///
/// ```rust
/// use crate_matrix::ingest::{ChecksumPolicy, ChecksumStatus, decode_datagram, encode_datagram};
///
/// let payload = [7u8; 12];
/// let datagram = encode_datagram(&payload, true);
/// let (pixels, status) = decode_datagram(&datagram, 12, ChecksumPolicy::Strict).unwrap();
/// assert_eq!(pixels, &payload);
/// assert_eq!(status, ChecksumStatus::Valid);
///
/// assert!(decode_datagram(&payload[..11], 12, ChecksumPolicy::Legacy).is_err());
/// ```
///
/// # Errors
///
/// Returns a [`Rejection`] for a bad length, or for a non-zero CRC mismatch under
/// [`ChecksumPolicy::Strict`].
pub fn decode_datagram(
    datagram: &[u8],
    frame_size: usize,
    policy: ChecksumPolicy,
) -> core::result::Result<(&[u8], ChecksumStatus), Rejection> {
    if datagram.len() == frame_size {
        return Ok((datagram, ChecksumStatus::Absent));
    }
    if datagram.len() != frame_size + CRC_LEN {
        return Err(Rejection::Length {
            len: datagram.len(),
            frame_size,
        });
    }

    let (payload, trailer) = datagram.split_at(frame_size);
    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if expected == 0 {
        return Ok((payload, ChecksumStatus::Zero));
    }
    let actual = crc32fast::hash(payload);
    if expected == actual {
        return Ok((payload, ChecksumStatus::Valid));
    }
    match policy {
        ChecksumPolicy::Legacy => Ok((payload, ChecksumStatus::Mismatch { expected, actual })),
        ChecksumPolicy::Strict => Err(Rejection::Checksum { expected, actual }),
    }
}

/// Build a datagram for `payload`, with or without a CRC trailer.
#[must_use]
pub fn encode_datagram(payload: &[u8], with_crc: bool) -> Vec<u8> {
    let mut datagram = Vec::with_capacity(payload.len() + CRC_LEN);
    datagram.extend_from_slice(payload);
    if with_crc {
        datagram.extend_from_slice(&crc32fast::hash(payload).to_be_bytes());
    }
    datagram
}

/// Which senders may drive the panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostFilter {
    allowed: Option<Vec<IpAddr>>,
}

impl HostFilter {
    /// Accept every sender.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self { allowed: None }
    }

    /// Accept only the given addresses.
    #[must_use]
    pub fn only(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            allowed: Some(addresses.into_iter().map(|ip| ip.to_canonical()).collect()),
        }
    }

    /// Build a filter from an optional host name or IP literal, resolving names once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name does not resolve to any address.
    pub async fn resolve(host: Option<&str>) -> Result<Self> {
        let Some(host) = host else {
            return Ok(Self::allow_all());
        };
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(Self::only([ip]));
        }
        let addresses: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|err| Error::config(format!("cannot resolve allowed_host {host:?}: {err}")))?
            .map(|socket_addr| socket_addr.ip())
            .collect();
        if addresses.is_empty() {
            return Err(Error::config(format!(
                "allowed_host {host:?} resolved to no addresses"
            )));
        }
        info!(host, ?addresses, "restricting senders");
        Ok(Self::only(addresses))
    }

    /// Whether a datagram from `ip` is accepted.
    #[must_use]
    pub fn allows(&self, ip: IpAddr) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&ip.to_canonical()))
    }
}

/// Where a frame came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSource(pub SocketAddr);

impl fmt::Display for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp:{}", self.0.ip())
    }
}

/// A validated frame payload and its sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Sender of the datagram.
    pub source: FrameSource,
    /// Row-major RGB bytes, exactly `frame_size` long.
    pub pixels: Vec<u8>,
    /// How the CRC trailer was judged.
    pub checksum: ChecksumStatus,
}

/// Socket and filtering settings for a [`FrameListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Local address to bind.
    pub bind: IpAddr,
    /// Local port to bind.
    pub port: u16,
    /// Only accept datagrams from this host name or IP.
    pub allowed_host: Option<String>,
    /// CRC mismatch handling.
    pub checksum: ChecksumPolicy,
    /// Capacity of the channel between receiver task and arbiter.
    pub channel_capacity: usize,
}

/// Counters kept by a [`FrameListener`]. Cheap to clone; clones share the counts.
#[derive(Clone, Debug, Default)]
pub struct ListenerStats(Arc<StatsInner>);

#[derive(Debug, Default)]
struct StatsInner {
    accepted: AtomicU64,
    dropped_length: AtomicU64,
    dropped_checksum: AtomicU64,
    dropped_host: AtomicU64,
    checksum_anomalies: AtomicU64,
}

/// Point-in-time copy of [`ListenerStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames handed out.
    pub accepted: u64,
    /// Datagrams dropped for their length.
    pub dropped_length: u64,
    /// Datagrams dropped for a CRC mismatch (strict policy only).
    pub dropped_checksum: u64,
    /// Datagrams dropped by the host filter.
    pub dropped_host: u64,
    /// Frames accepted despite a non-zero CRC mismatch (legacy policy).
    pub checksum_anomalies: u64,
}

impl ListenerStats {
    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = &self.0;
        StatsSnapshot {
            accepted: inner.accepted.load(Ordering::Relaxed),
            dropped_length: inner.dropped_length.load(Ordering::Relaxed),
            dropped_checksum: inner.dropped_checksum.load(Ordering::Relaxed),
            dropped_host: inner.dropped_host.load(Ordering::Relaxed),
            checksum_anomalies: inner.checksum_anomalies.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Receives frames from a UDP socket.
pub struct FrameListener {
    socket: UdpSocket,
    frame_size: usize,
    filter: HostFilter,
    policy: ChecksumPolicy,
    buffer: Vec<u8>,
    stats: ListenerStats,
}

impl FrameListener {
    /// Bind according to `settings`, resolving the allowed host if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the socket cannot be bound, or [`Error::Config`] if the
    /// allowed host does not resolve.
    pub async fn bind(settings: &ListenerSettings, frame_size: usize) -> Result<Self> {
        let filter = HostFilter::resolve(settings.allowed_host.as_deref()).await?;
        let socket = UdpSocket::bind((settings.bind, settings.port))
            .await
            .map_err(Error::network)?;
        let listener = Self::from_socket(socket, frame_size, filter, settings.checksum);
        info!(
            local_addr = ?listener.local_addr().ok(),
            frame_size,
            checksum = ?settings.checksum,
            "listening for frames"
        );
        Ok(listener)
    }

    /// Wrap an already bound socket.
    #[must_use]
    pub fn from_socket(
        socket: UdpSocket,
        frame_size: usize,
        filter: HostFilter,
        policy: ChecksumPolicy,
    ) -> Self {
        Self {
            socket,
            frame_size,
            filter,
            policy,
            // One spare byte so oversized datagrams show up as too long instead of being
            // truncated to a plausible length.
            buffer: vec![0; frame_size + CRC_LEN + 1],
            stats: ListenerStats::default(),
        }
    }

    /// Local socket address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the OS cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Error::network)
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> ListenerStats {
        self.stats.clone()
    }

    /// Wait for the next acceptable frame, skipping everything else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] only if the socket itself fails.
    pub async fn recv_frame(&mut self) -> Result<ReceivedFrame> {
        loop {
            let (len, sender) = self
                .socket
                .recv_from(&mut self.buffer)
                .await
                .map_err(Error::network)?;

            if !self.filter.allows(sender.ip()) {
                trace!(%sender, "dropping datagram from disallowed host");
                ListenerStats::bump(&self.stats.0.dropped_host);
                continue;
            }

            match decode_datagram(&self.buffer[..len], self.frame_size, self.policy) {
                Ok((pixels, checksum)) => {
                    if let ChecksumStatus::Mismatch { expected, actual } = checksum {
                        debug!(%sender, expected, actual, "accepting frame with mismatched CRC");
                        ListenerStats::bump(&self.stats.0.checksum_anomalies);
                    }
                    ListenerStats::bump(&self.stats.0.accepted);
                    return Ok(ReceivedFrame {
                        source: FrameSource(sender),
                        pixels: pixels.to_vec(),
                        checksum,
                    });
                }
                Err(rejection) => {
                    debug!(%sender, %rejection, "dropping datagram");
                    let counter = match rejection {
                        Rejection::Length { .. } => &self.stats.0.dropped_length,
                        Rejection::Checksum { .. } => &self.stats.0.dropped_checksum,
                    };
                    ListenerStats::bump(counter);
                }
            }
        }
    }

    /// Turn the listener into an endless stream of frames.
    ///
    /// The stream only ends after yielding a socket error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ReceivedFrame>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut listener = state?;
            match listener.recv_frame().await {
                Ok(frame) => Some((Ok(frame), Some(listener))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Forward frames into `sender` until the receiving side is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the socket fails.
    pub async fn forward(mut self, sender: mpsc::Sender<ReceivedFrame>) -> Result<()> {
        loop {
            let frame = self.recv_frame().await?;
            trace!(source = %frame.source, "frame received");
            if sender.send(frame).await.is_err() {
                info!("frame consumer gone, receiver task stopping");
                return Ok(());
            }
        }
    }

    /// Spawn [`Self::forward`] on the current runtime with a bounded channel.
    #[must_use]
    pub fn spawn(self, capacity: usize) -> (mpsc::Receiver<ReceivedFrame>, JoinHandle<Result<()>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(self.forward(sender));
        (receiver, handle)
    }
}
