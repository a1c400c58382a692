//! UDP ingestion (§4.3): a single read loop, one packet per message. No
//! per-peer task — decoding is serialized so template-cache updates stay
//! ordered within an observation domain, since UDP carries no
//! per-exporter connection to hang per-task state off of.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, warn};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::codec::message::{Header, HEADER_LENGTH, IPFIX_VERSION};
use crate::registry::Registry;

use super::dispatch::decode_frame_body;
use super::message::DecodedMessage;
use super::template_cache::TemplateCache;

/// Maximum UDP datagram size accepted (well above any realistic IPFIX
/// export, generous enough that truncation reads as a malformed message
/// rather than a silently-dropped one).
const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Runs the single UDP receive loop until `cancel` fires. Decoding is
/// serialized within this one task (§4.3 "no per-peer task; decoding is
/// serialized to keep template-cache updates ordered within an
/// observation domain"), so `cache` needs no lock contention from this
/// side — it is still an `Arc<Mutex<_>>` only because the sweeper task
/// also touches it.
pub async fn run(
    socket: UdpSocket,
    registry: Arc<Registry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::Sender<DecodedMessage>,
    metrics: Arc<crate::metrics::PipelineMetrics>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, remote) = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("UDP collector stopping");
                break;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("UDP recv error: {e}");
                        metrics.record_protocol_error();
                        continue;
                    }
                }
            }
        };

        let decoded = {
            let mut cache = cache.lock().await;
            decode_datagram(&buf[..len], remote, &registry, &mut cache, &metrics)
        };
        if let Some(message) = decoded {
            // Dropping UDP packets under back-pressure is acceptable
            // (§4.3); `try_send` never blocks the read loop.
            if tx.try_send(message).is_err() {
                debug!("output channel full or closed, dropping datagram from {remote}");
            }
        }
    }
}

fn decode_datagram(
    datagram: &[u8],
    remote: SocketAddr,
    registry: &Registry,
    cache: &mut TemplateCache,
    metrics: &crate::metrics::PipelineMetrics,
) -> Option<DecodedMessage> {
    if datagram.len() < HEADER_LENGTH {
        metrics.record_protocol_error();
        return None;
    }
    let (body, header) = Header::decode(datagram).ok()?;
    if header.version != IPFIX_VERSION {
        warn!("{remote} sent unsupported version {}, dropping packet", header.version);
        metrics.record_protocol_error();
        return None;
    }
    let expected_len = (header.length as usize).saturating_sub(HEADER_LENGTH);
    if body.len() < expected_len {
        metrics.record_protocol_error();
        return None;
    }
    decode_frame_body(
        &body[..expected_len],
        remote,
        header.export_time,
        header.sequence_number,
        header.observation_domain_id,
        registry,
        cache,
        metrics,
    )
}
