//! TLS configuration for the TCP listener (§6): server authenticates with
//! a PEM certificate + key; client certificate validation is optional and
//! off by default.

use std::io::BufReader;
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;

use crate::error::ConfigError;

/// Inputs for building a [`TlsAcceptor`] (§6, part of `Init`'s
/// `tls-config` field).
#[derive(Debug, Clone)]
pub struct TlsSettings {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    /// When set, client certificates are validated against this CA bundle.
    /// `None` means client certificate validation is off (the default,
    /// per §6).
    pub client_ca_pem: Option<Vec<u8>>,
}

impl TlsSettings {
    pub fn new(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        Self {
            cert_pem,
            key_pem,
            client_ca_pem: None,
        }
    }

    #[must_use = "builder methods consume self and return a new value; the return value must be used"]
    pub fn with_client_ca(mut self, client_ca_pem: Vec<u8>) -> Self {
        self.client_ca_pem = Some(client_ca_pem);
        self
    }

    /// Builds a [`TlsAcceptor`] from the configured PEM material.
    pub fn build_acceptor(&self) -> Result<TlsAcceptor, ConfigError> {
        let certs = parse_certs(&self.cert_pem)?;
        let key = parse_key(&self.key_pem)?;

        let builder = ServerConfig::builder();
        let config = match &self.client_ca_pem {
            Some(ca_pem) => {
                let mut roots = RootCertStore::empty();
                for cert in parse_certs(ca_pem)? {
                    roots
                        .add(cert)
                        .map_err(|e| ConfigError::InvalidTls(e.to_string()))?;
                }
                let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                    .build()
                    .map_err(|e| ConfigError::InvalidTls(e.to_string()))?;
                builder
                    .with_client_cert_verifier(verifier)
                    .with_single_cert(certs, key)
                    .map_err(|e| ConfigError::InvalidTls(e.to_string()))?
            }
            None => builder
                .with_no_client_auth()
                .with_single_cert(certs, key)
                .map_err(|e| ConfigError::InvalidTls(e.to_string()))?,
        };
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, ConfigError> {
    let mut reader = BufReader::new(pem);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::InvalidTls(e.to_string()))
}

fn parse_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, ConfigError> {
    let mut reader = BufReader::new(pem);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ConfigError::InvalidTls(e.to_string()))?
        .ok_or_else(|| ConfigError::InvalidTls("no private key found in PEM material".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pem_is_rejected() {
        let settings = TlsSettings::new(Vec::new(), Vec::new());
        assert!(settings.build_acceptor().is_err());
    }
}
