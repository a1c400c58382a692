//! TCP ingestion (§4.3, §4.5 "TCP connection" state machine).
//!
//! Each connection is served by its own task: peek the 16-octet header,
//! validate `version == 10`, read `totalLength - 16` more octets, decode,
//! emit. Any decode fault closes that connection only — other exporters
//! are unaffected (§4.3 "Failure modes", scenario 6).

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;

use crate::codec::message::{Header, HEADER_LENGTH, IPFIX_VERSION};
use crate::registry::Registry;

use super::dispatch::decode_frame_body;
use super::message::DecodedMessage;
use super::template_cache::TemplateCache;

/// Runs one TCP connection to completion: `accepting -> reading-header ->
/// reading-body -> emitting -> (reading-header | closed)`. `cache` is
/// shared across every connection of the owning collector so that
/// partitioning by `(remote, observation-domain-id, template-id)` (§9)
/// is the only thing keeping two exporters' templates apart.
pub async fn serve_plain(
    stream: TcpStream,
    remote: SocketAddr,
    registry: Arc<Registry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::Sender<DecodedMessage>,
    metrics: Arc<crate::metrics::PipelineMetrics>,
    cancel: CancellationToken,
) {
    serve_inner(stream, remote, registry, cache, tx, metrics, cancel).await;
}

/// As [`serve_plain`], but wraps the accepted socket in a TLS server
/// session first (§6).
pub async fn serve_tls(
    stream: TcpStream,
    remote: SocketAddr,
    acceptor: TlsAcceptor,
    registry: Arc<Registry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::Sender<DecodedMessage>,
    metrics: Arc<crate::metrics::PipelineMetrics>,
    cancel: CancellationToken,
) {
    match acceptor.accept(stream).await {
        Ok(tls_stream) => {
            serve_inner(tls_stream, remote, registry, cache, tx, metrics, cancel).await;
        }
        Err(e) => {
            warn!("TLS handshake with {remote} failed: {e}");
            metrics.record_protocol_error();
        }
    }
}

async fn serve_inner<S>(
    mut stream: S,
    remote: SocketAddr,
    registry: Arc<Registry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::Sender<DecodedMessage>,
    metrics: Arc<crate::metrics::PipelineMetrics>,
    cancel: CancellationToken,
) where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let mut header_buf = [0u8; HEADER_LENGTH];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("collector stopping, closing connection to {remote}");
                break;
            }
            result = stream.read_exact(&mut header_buf) => {
                match result {
                    Ok(_) => {}
                    Err(_) => {
                        debug!("connection to {remote} closed");
                        break;
                    }
                }
            }
        }

        let (_, header) = match Header::decode(&header_buf) {
            Ok(h) => h,
            Err(_) => {
                metrics.record_protocol_error();
                break;
            }
        };
        if header.version != IPFIX_VERSION {
            warn!("{remote} sent unsupported version {}, closing connection", header.version);
            metrics.record_protocol_error();
            break;
        }

        let body_len = (header.length as usize).saturating_sub(HEADER_LENGTH);
        let mut body = vec![0u8; body_len];
        if stream.read_exact(&mut body).await.is_err() {
            metrics.record_protocol_error();
            break;
        }

        let decoded = {
            let mut cache = cache.lock().await;
            decode_frame_body(
                &body,
                remote,
                header.export_time,
                header.sequence_number,
                header.observation_domain_id,
                &registry,
                &mut cache,
                &metrics,
            )
        };
        if let Some(message) = decoded {
            if tx.send(message).await.is_err() {
                debug!("output channel closed, stopping connection to {remote}");
                break;
            }
        }
    }

    cache.lock().await.clear_remote(remote);
}
