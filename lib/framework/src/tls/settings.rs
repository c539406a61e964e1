use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error, RootCertStore, SignatureScheme,
};
use serde::{Deserialize, Serialize};

use super::TlsError;
use crate::config::default_true;

/// Configures the TLS options for outgoing connections.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// Absolute path to an additional CA certificate file in PEM format(X.509).
    /// When set, the system trust store is not consulted.
    #[serde(default)]
    pub ca: Option<PathBuf>,

    /// Enables certificate verification.
    ///
    /// Management controllers usually ship self-signed certificates, set this
    /// to false to talk to them anyway.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,

    /// Enables hostname verification. Only relevant when `verify_certificate`
    /// is enabled.
    #[serde(default = "default_true")]
    pub verify_hostname: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            ca: None,
            verify_certificate: true,
            verify_hostname: true,
        }
    }
}

impl TlsConfig {
    pub fn client_config(&self) -> Result<ClientConfig, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(TlsError::TlsBuild)?;

        let inner = if self.verify_certificate {
            let root_store = Arc::new(self.root_store()?);
            let verifier =
                WebPkiServerVerifier::builder_with_provider(root_store, Arc::clone(&provider))
                    .build()
                    .map_err(TlsError::VerifierBuild)?;

            Some(verifier)
        } else {
            None
        };

        let config = builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ServerCertVerifier {
                inner,
                provider,
                verify_hostname: self.verify_hostname,
            }))
            .with_no_client_auth();

        Ok(config)
    }

    fn root_store(&self) -> Result<RootCertStore, TlsError> {
        let certs = match &self.ca {
            Some(ca_file) => load_certs(ca_file)?,
            None => {
                let result = rustls_native_certs::load_native_certs();
                if !result.errors.is_empty() {
                    warn!(
                        message = "native root CA certificate loading errors",
                        errs = ?result.errors
                    );
                }

                if result.certs.is_empty() {
                    return Err(TlsError::NativeCerts(
                        "no native root CA certificates found".to_string(),
                    ));
                }

                result.certs
            }
        };

        let mut root_store = RootCertStore::empty();
        for cert in certs {
            root_store.add(cert).map_err(TlsError::AddCertToStore)?;
        }

        Ok(root_store)
    }
}

#[derive(Debug)]
struct ServerCertVerifier {
    // None if certificate verification is disabled
    inner: Option<Arc<WebPkiServerVerifier>>,
    provider: Arc<CryptoProvider>,

    verify_hostname: bool,
}

impl rustls::client::danger::ServerCertVerifier for ServerCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        let Some(inner) = &self.inner else {
            return Ok(ServerCertVerified::assertion());
        };

        match inner.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(verified) => Ok(verified),
            err @ Err(Error::InvalidCertificate(CertificateError::NotValidForName)) => {
                if self.verify_hostname {
                    err
                } else {
                    Ok(ServerCertVerified::assertion())
                }
            }
            Err(err) => Err(err),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn load_certs(filename: &PathBuf) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let content = fs::read(filename).map_err(|err| TlsError::FileReadFailed {
        note: "CA certificate",
        filename: filename.clone(),
        err,
    })?;

    let certs = pem::parse_many(content)
        .map_err(|err| TlsError::CertificateParse {
            filename: filename.clone(),
            err,
        })?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| CertificateDer::from(p.into_contents()))
        .collect::<Vec<_>>();

    if certs.is_empty() {
        return Err(TlsError::MissingCertificate(filename.clone()));
    }

    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_verify_needs_no_roots() {
        let config = TlsConfig {
            ca: Some("/nonexistent/ca.pem".into()),
            verify_certificate: false,
            verify_hostname: false,
        };

        // the CA file is never read when verification is disabled
        config.client_config().unwrap();
    }

    #[test]
    fn missing_ca_file() {
        let config = TlsConfig {
            ca: Some("/nonexistent/ca.pem".into()),
            ..TlsConfig::default()
        };

        let err = config.client_config().unwrap_err();
        assert!(matches!(err, TlsError::FileReadFailed { .. }), "{err}");
    }

    #[test]
    fn ca_file_without_certificates() {
        let dir = std::env::temp_dir().join(format!("tls-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.pem");
        fs::write(&path, "not a certificate\n").unwrap();

        let config = TlsConfig {
            ca: Some(path),
            ..TlsConfig::default()
        };

        let err = config.client_config().unwrap_err();
        assert!(matches!(err, TlsError::MissingCertificate(_)), "{err}");
    }

    #[test]
    fn deserialize_defaults() {
        let config = serde_yaml::from_str::<TlsConfig>("ca: /etc/bmc/ca.pem").unwrap();

        assert!(config.verify_certificate);
        assert!(config.verify_hostname);
        assert_eq!(config.ca, Some(PathBuf::from("/etc/bmc/ca.pem")));
    }
}
