//! The Collecting Process (§4.3): per-exporter TCP/UDP ingestion, message
//! framing, a shared template cache with TTL, record decoding, and a
//! fan-out message channel.
//!
//! Concurrency follows the teacher's own
//! `examples/netflow_udp_listener_tokio.rs` idiom — `tokio::net`,
//! `tokio::sync::mpsc`, one task per connection plus a periodic sweeper —
//! promoted from an example into the library proper.

mod config;
mod dispatch;
mod message;
mod tcp;
mod template_cache;
mod tls;
mod udp;

pub use config::{CollectorConfig, CollectorConfigBuilder, Transport, DEFAULT_PORT, DEFAULT_TLS_PORT};
pub use message::{DecodedDataSet, DecodedMessage};
pub use template_cache::{TemplateCache, TemplateDef};
pub use tls::TlsSettings;

pub mod ttl;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;
use crate::metrics::PipelineMetrics;

use ttl::TtlConfig;

/// The Collecting Process (§4.3 `Init`/`Start`/`Stop`/`GetMsgChan`/`GetAddress`).
///
/// Constructed from a [`CollectorConfig`]; `start()` binds the configured
/// transport and begins accepting, returning a [`CollectorHandle`] that
/// owns the output channel and the means to shut everything down.
pub struct CollectingProcess {
    config: CollectorConfig,
}

impl CollectingProcess {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// `Start()` (§4.3): binds the listener/socket and spawns the
    /// ingestion task(s) plus, when TTL is enabled, a periodic sweeper.
    /// Returns immediately with a handle rather than blocking, since a
    /// Rust caller drives the accept loop via spawned tasks rather than
    /// the calling thread.
    pub async fn start(self) -> Result<CollectorHandle, ConfigError> {
        let (tx, rx) = mpsc::channel(self.config.max_buffer_size);
        let metrics = Arc::new(PipelineMetrics::new());
        let cancel = CancellationToken::new();
        let cache = Arc::new(Mutex::new(TemplateCache::new(TtlConfig::new(self.config.template_ttl))));
        let mut tasks = JoinSet::new();

        let local_addr = match self.config.transport {
            Transport::Tcp => {
                let listener = TcpListener::bind(self.config.address)
                    .await
                    .map_err(|e| ConfigError::InvalidAddress(e.to_string()))?;
                let local_addr = listener
                    .local_addr()
                    .map_err(|e| ConfigError::InvalidAddress(e.to_string()))?;
                let tls_acceptor = match &self.config.tls {
                    Some(settings) => Some(settings.build_acceptor()?),
                    None => None,
                };
                spawn_tcp_accept_loop(
                    &mut tasks,
                    listener,
                    tls_acceptor,
                    self.config.registry.clone(),
                    cache.clone(),
                    tx.clone(),
                    metrics.clone(),
                    cancel.clone(),
                );
                local_addr
            }
            Transport::Udp => {
                let socket = UdpSocket::bind(self.config.address)
                    .await
                    .map_err(|e| ConfigError::InvalidAddress(e.to_string()))?;
                let local_addr = socket
                    .local_addr()
                    .map_err(|e| ConfigError::InvalidAddress(e.to_string()))?;
                let registry = self.config.registry.clone();
                let cache = cache.clone();
                let tx = tx.clone();
                let metrics = metrics.clone();
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    udp::run(socket, registry, cache, tx, metrics, cancel).await;
                });
                local_addr
            }
        };

        if self.config.template_ttl > Duration::ZERO {
            spawn_sweeper(&mut tasks, cache.clone(), self.config.template_ttl, cancel.clone());
        }

        info!("collecting process listening on {local_addr}");
        drop(tx);

        Ok(CollectorHandle {
            local_addr,
            messages: rx,
            metrics,
            cancel,
            tasks,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_tcp_accept_loop(
    tasks: &mut JoinSet<()>,
    listener: TcpListener,
    tls_acceptor: Option<tokio_rustls::TlsAcceptor>,
    registry: Arc<crate::registry::Registry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::Sender<DecodedMessage>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
) {
    tasks.spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(pair) => pair,
                        Err(_) => continue,
                    };
                    let registry = registry.clone();
                    let cache = cache.clone();
                    let tx = tx.clone();
                    let metrics = metrics.clone();
                    let cancel = cancel.clone();
                    match &tls_acceptor {
                        Some(acceptor) => {
                            let acceptor = acceptor.clone();
                            tokio::spawn(async move {
                                tcp::serve_tls(stream, remote, acceptor, registry, cache, tx, metrics, cancel).await;
                            });
                        }
                        None => {
                            tokio::spawn(async move {
                                tcp::serve_plain(stream, remote, registry, cache, tx, metrics, cancel).await;
                            });
                        }
                    }
                }
            }
        }
    });
}

/// Wakes every `ttl/2` and deletes expired entries (§4.3). A no-op
/// loop when `ttl == 0`, which callers avoid spawning in the first place.
fn spawn_sweeper(
    tasks: &mut JoinSet<()>,
    cache: Arc<Mutex<TemplateCache>>,
    ttl: Duration,
    cancel: CancellationToken,
) {
    let period = ttl / 2;
    tasks.spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let removed = cache.lock().await.sweep_expired();
                    if removed > 0 {
                        log::debug!("template sweeper evicted {removed} expired entr(ies)");
                    }
                }
            }
        }
    });
}

/// Handle to a running [`CollectingProcess`] (§4.3).
pub struct CollectorHandle {
    local_addr: SocketAddr,
    /// `GetMsgChan()`: the receive-only channel of decoded messages.
    pub messages: mpsc::Receiver<DecodedMessage>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl CollectorHandle {
    /// `GetAddress()`: the resolved bound address, useful when port 0 was
    /// requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// `Stop()`: closes the listener, drains in-flight connections, and
    /// closes the output message channel.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.messages.close();
        while self.tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::element::IeValue;
    use crate::codec::set::{Set, Template, TemplateField};
    use crate::codec::value::FieldValue;
    use crate::codec::{Message, Record};
    use std::time::Duration as StdDuration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn tcp_round_trip_emits_decoded_records() {
        let config = CollectorConfigBuilder::default()
            .with_address("127.0.0.1:0".parse().unwrap())
            .with_transport(Transport::Tcp)
            .build()
            .unwrap();
        let mut handle = CollectingProcess::new(config).start().await.unwrap();
        let addr = handle.local_addr();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let field = TemplateField { enterprise_id: 0, element_id: 4, length: 1 };
        let registry = crate::registry::Registry::new();
        let record = Record::new().with_field(
            IeValue::new(
                registry.get_info_element_from_id(4, 0).unwrap().into(),
                FieldValue::Unsigned(6),
            )
            .unwrap(),
        );
        let message = Message::new(1, 0)
            .with_set(Set::Template(vec![Template::new(256, vec![field])]))
            .with_set(Set::Data { set_id: 256, records: vec![record.clone()] });
        stream.write_all(&message.encode().unwrap()).await.unwrap();

        let decoded = tokio::time::timeout(StdDuration::from_secs(2), handle.messages.recv())
            .await
            .expect("did not time out")
            .expect("channel open");
        assert_eq!(decoded.sets[0].records, vec![record]);

        handle.stop().await;
    }
}
