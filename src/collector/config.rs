//! Collector construction input (§4.3 `Init(input)`), following the
//! teacher's own consuming-builder shape (`NetflowParserBuilder`):
//! `#[must_use]` methods that take and return `Self`, a `Default` impl,
//! and a terminal `build()` that can fail with [`ConfigError`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::registry::Registry;

use super::tls::TlsSettings;

/// Default plaintext IPFIX collector port (§6).
pub const DEFAULT_PORT: u16 = 4739;
/// Default TLS-protected IPFIX collector port (§6).
pub const DEFAULT_TLS_PORT: u16 = 4740;

/// Output channel capacity, matching the spec's example figure (§4.3).
const DEFAULT_MAX_BUFFER_SIZE: usize = 1024;

/// Which transport a [`crate::collector::CollectingProcess`] listens on
/// (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Resolved, immutable configuration for one [`crate::collector::CollectingProcess`].
#[derive(Clone)]
pub struct CollectorConfig {
    pub address: SocketAddr,
    pub transport: Transport,
    pub max_buffer_size: usize,
    pub template_ttl: Duration,
    pub tls: Option<TlsSettings>,
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("address", &self.address)
            .field("transport", &self.transport)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("template_ttl", &self.template_ttl)
            .field("tls", &self.tls.is_some())
            .field("registry_size", &self.registry.len())
            .finish()
    }
}

/// Builder for [`CollectorConfig`].
///
/// # Examples
///
/// ```rust
/// use ipfix_pipeline::collector::{CollectorConfigBuilder, Transport};
///
/// let config = CollectorConfigBuilder::default()
///     .with_address("0.0.0.0:4739".parse().unwrap())
///     .with_transport(Transport::Udp)
///     .with_max_buffer_size(2048)
///     .build()
///     .expect("valid collector config");
/// ```
#[derive(Clone)]
pub struct CollectorConfigBuilder {
    address: Option<SocketAddr>,
    transport: Transport,
    max_buffer_size: usize,
    template_ttl: Duration,
    tls: Option<TlsSettings>,
    registry: Option<Registry>,
}

impl Default for CollectorConfigBuilder {
    fn default() -> Self {
        Self {
            address: None,
            transport: Transport::Tcp,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            template_ttl: Duration::from_secs(2 * 60 * 60),
            tls: None,
            registry: None,
        }
    }
}

impl CollectorConfigBuilder {
    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// A `Duration::ZERO` TTL means templates never expire (§4.3
    /// "TTL = 0 means entries never expire (TCP-typical)").
    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_template_ttl(mut self, ttl: Duration) -> Self {
        self.template_ttl = ttl;
        self
    }

    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Supplies a pre-populated registry (e.g. with enterprise extensions
    /// already registered). Defaults to [`Registry::new`] if omitted.
    #[must_use = "builder methods consume self and return a new builder; the return value must be used"]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<CollectorConfig, ConfigError> {
        let address = self
            .address
            .ok_or_else(|| ConfigError::InvalidAddress("no address supplied".into()))?;
        if self.max_buffer_size == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(CollectorConfig {
            address,
            transport: self.transport,
            max_buffer_size: self.max_buffer_size,
            template_ttl: self.template_ttl,
            tls: self.tls,
            registry: Arc::new(self.registry.unwrap_or_default()),
        })
    }
}
