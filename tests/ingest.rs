#![allow(missing_docs)]
#![allow(clippy::unwrap_used, reason = "tests fail loudly on unexpected errors")]
//! Datagram framing and UDP listener tests over loopback.

use core::time::Duration;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate_matrix::ingest::{
    ChecksumPolicy, ChecksumStatus, FrameListener, HostFilter, Rejection, decode_datagram,
    encode_datagram,
};
use futures::StreamExt;
use tokio::net::UdpSocket;

const FRAME_SIZE: usize = 2 * 2 * 3;
const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn payload() -> Vec<u8> {
    (1..=FRAME_SIZE as u8).collect()
}

#[test]
fn raw_payload_is_accepted() {
    let payload = payload();
    let (pixels, status) = decode_datagram(&payload, FRAME_SIZE, ChecksumPolicy::Strict).unwrap();
    assert_eq!(pixels, payload.as_slice());
    assert_eq!(status, ChecksumStatus::Absent);
}

#[test]
fn zero_trailer_is_always_accepted() {
    let mut datagram = payload();
    datagram.extend_from_slice(&[0; 4]);
    let (pixels, status) = decode_datagram(&datagram, FRAME_SIZE, ChecksumPolicy::Strict).unwrap();
    assert_eq!(pixels, &datagram[..FRAME_SIZE]);
    assert_eq!(status, ChecksumStatus::Zero);
}

#[test]
fn trailer_is_big_endian_crc_of_payload() {
    let payload = payload();
    let datagram = encode_datagram(&payload, true);
    assert_eq!(&datagram[FRAME_SIZE..], &crc32fast::hash(&payload).to_be_bytes());

    let (_, status) = decode_datagram(&datagram, FRAME_SIZE, ChecksumPolicy::Strict).unwrap();
    assert_eq!(status, ChecksumStatus::Valid);
}

#[test]
fn mismatch_is_accepted_in_legacy_mode_only() {
    let mut datagram = encode_datagram(&payload(), true);
    datagram[FRAME_SIZE + 3] ^= 0xFF;

    let (_, status) = decode_datagram(&datagram, FRAME_SIZE, ChecksumPolicy::Legacy).unwrap();
    assert!(matches!(status, ChecksumStatus::Mismatch { .. }));

    let rejection = decode_datagram(&datagram, FRAME_SIZE, ChecksumPolicy::Strict).unwrap_err();
    assert!(matches!(rejection, Rejection::Checksum { .. }));
}

#[test]
fn other_lengths_are_rejected() {
    let long = vec![0; FRAME_SIZE + 8];
    for len in [0, 1, FRAME_SIZE - 1, FRAME_SIZE + 1, FRAME_SIZE + 3, FRAME_SIZE + 5] {
        let rejection = decode_datagram(&long[..len], FRAME_SIZE, ChecksumPolicy::Legacy).unwrap_err();
        assert_eq!(rejection, Rejection::Length { len, frame_size: FRAME_SIZE });
    }
}

#[test]
fn host_filter_matches_only_allowed_addresses() {
    let filter = HostFilter::only([IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))]);
    assert!(filter.allows(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
    // IPv4-mapped IPv6 senders (dual-stack sockets) count as the IPv4 address.
    assert!(filter.allows(IpAddr::V6(Ipv4Addr::new(10, 0, 0, 5).to_ipv6_mapped())));
    for other in [
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6)),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(Ipv6Addr::LOCALHOST),
    ] {
        assert!(!filter.allows(other), "{other}");
    }
    assert!(HostFilter::allow_all().allows(IpAddr::V6(Ipv6Addr::LOCALHOST)));
}

#[tokio::test]
async fn host_filter_resolves_literals_and_names() {
    let literal = HostFilter::resolve(Some("127.0.0.1")).await.unwrap();
    assert!(literal.allows(LOCALHOST));

    let name = HostFilter::resolve(Some("localhost")).await.unwrap();
    assert!(name.allows(LOCALHOST) || name.allows(IpAddr::V6(Ipv6Addr::LOCALHOST)));

    assert_eq!(HostFilter::resolve(None).await.unwrap(), HostFilter::allow_all());
}

async fn listener(filter: HostFilter, policy: ChecksumPolicy) -> (FrameListener, UdpSocket) {
    let socket = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let listener = FrameListener::from_socket(socket, FRAME_SIZE, filter, policy);
    let sender = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    sender.connect(listener.local_addr().unwrap()).await.unwrap();
    (listener, sender)
}

#[tokio::test]
async fn frame_is_forwarded_verbatim() {
    let (mut listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Legacy).await;
    sender.send(&payload()).await.unwrap();

    let frame = listener.recv_frame().await.unwrap();
    assert_eq!(frame.pixels, payload());
    assert_eq!(frame.checksum, ChecksumStatus::Absent);
    assert_eq!(frame.source.to_string(), "udp:127.0.0.1");
}

#[tokio::test]
async fn short_datagram_is_dropped_and_loop_continues() {
    let (mut listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Legacy).await;
    sender.send(&payload()[..FRAME_SIZE - 1]).await.unwrap();
    sender.send(&vec![9; FRAME_SIZE + 20]).await.unwrap();
    let mut zero_trailer = payload();
    zero_trailer.extend_from_slice(&[0; 4]);
    sender.send(&zero_trailer).await.unwrap();

    let frame = listener.recv_frame().await.unwrap();
    assert_eq!(frame.pixels, payload());
    assert_eq!(frame.checksum, ChecksumStatus::Zero);

    let stats = listener.stats().snapshot();
    assert_eq!(stats.dropped_length, 2);
    assert_eq!(stats.accepted, 1);
}

#[tokio::test]
async fn strict_listener_drops_bad_checksums() {
    let (mut listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Strict).await;
    let mut corrupt = encode_datagram(&payload(), true);
    corrupt[0] ^= 1;
    sender.send(&corrupt).await.unwrap();
    sender.send(&encode_datagram(&payload(), true)).await.unwrap();

    let frame = listener.recv_frame().await.unwrap();
    assert_eq!(frame.checksum, ChecksumStatus::Valid);
    assert_eq!(listener.stats().snapshot().dropped_checksum, 1);
}

#[tokio::test]
async fn legacy_listener_counts_checksum_anomalies() {
    let (mut listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Legacy).await;
    let mut corrupt = encode_datagram(&payload(), true);
    corrupt[0] ^= 1;
    sender.send(&corrupt).await.unwrap();

    let frame = listener.recv_frame().await.unwrap();
    assert!(matches!(frame.checksum, ChecksumStatus::Mismatch { .. }));
    assert_eq!(listener.stats().snapshot().checksum_anomalies, 1);
}

#[tokio::test]
async fn disallowed_sender_is_never_forwarded() {
    let other_host = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
    let (mut listener, sender) = listener(HostFilter::only([other_host]), ChecksumPolicy::Legacy).await;
    for _ in 0..3 {
        sender.send(&payload()).await.unwrap();
    }

    let result = tokio::time::timeout(Duration::from_millis(200), listener.recv_frame()).await;
    assert!(result.is_err(), "a frame from a disallowed host got through");
    assert_eq!(listener.stats().snapshot().dropped_host, 3);
}

#[tokio::test]
async fn allowed_sender_is_forwarded() {
    let (mut listener, sender) = listener(HostFilter::only([LOCALHOST]), ChecksumPolicy::Legacy).await;
    sender.send(&payload()).await.unwrap();

    let frame = listener.recv_frame().await.unwrap();
    assert_eq!(frame.source.0.ip(), LOCALHOST);
}

#[tokio::test]
async fn stream_yields_frames_in_order() {
    let (listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Legacy).await;
    for value in 0..3u8 {
        sender.send(&[value; FRAME_SIZE]).await.unwrap();
    }

    let frames: Vec<_> = listener.into_stream().take(3).collect().await;
    let firsts: Vec<u8> = frames.into_iter().map(|frame| frame.unwrap().pixels[0]).collect();
    assert_eq!(firsts, [0, 1, 2]);
}

#[tokio::test]
async fn spawned_receiver_feeds_the_channel() {
    let (listener, sender) = listener(HostFilter::allow_all(), ChecksumPolicy::Legacy).await;
    let (mut frames, handle) = listener.spawn(4);
    sender.send(&payload()).await.unwrap();

    let frame = frames.recv().await.unwrap();
    assert_eq!(frame.pixels, payload());

    drop(frames);
    sender.send(&payload()).await.unwrap();
    handle.await.unwrap().unwrap();
}
