use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::config::SourceConfig;
use crate::error::FetchError;

/// Resolves the configured URI to a JSON document. Holds one reqwest client
/// built at startup with the selected TLS verification mode.
pub struct SourceFetcher {
    url: String,
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(source: &SourceConfig) -> anyhow::Result<Self> {
        if source.insecure {
            warn!(url = %source.url, "TLS certificate verification disabled");
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(source.insecure)
            .timeout(Duration::from_secs(source.timeout_seconds))
            .build()?;

        Ok(Self {
            url: source.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the document. One attempt, no retries; the scheduler
    /// decides what a failed cycle means.
    pub async fn fetch(&self) -> Result<Value, FetchError> {
        if let Some(path) = self.url.strip_prefix("file://") {
            let text = tokio::fs::read_to_string(path).await.map_err(|source| {
                FetchError::LocalRead {
                    path: path.to_string(),
                    source,
                }
            })?;
            Ok(serde_json::from_str(&text)?)
        } else if self.url.starts_with("http://") || self.url.starts_with("https://") {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await?
                .error_for_status()?;
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(FetchError::UnsupportedScheme(self.url.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    fn fetcher_for(url: String) -> SourceFetcher {
        SourceFetcher::new(&SourceConfig {
            url,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_scheme_fails_without_io() {
        let fetcher = fetcher_for("ftp://host/data.json".to_string());
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"stats":{{"active":42}}}}"#).unwrap();

        let fetcher = fetcher_for(format!("file://{}", path.display()));
        let doc = fetcher.fetch().await.unwrap();
        assert_eq!(doc, json!({"stats": {"active": 42}}));
    }

    #[tokio::test]
    async fn test_file_missing() {
        let fetcher = fetcher_for("file:///definitely/not/here.json".to_string());
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::LocalRead { .. }));
    }

    #[tokio::test]
    async fn test_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "not json at all").unwrap();

        let fetcher = fetcher_for(format!("file://{}", path.display()));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_http_source() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/status.json");
                then.status(200).json_body(json!({"up": 1}));
            })
            .await;

        let fetcher = fetcher_for(server.url("/status.json"));
        let doc = fetcher.fetch().await.unwrap();
        assert_eq!(doc, json!({"up": 1}));
    }

    #[tokio::test]
    async fn test_http_non_2xx_is_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/status.json");
                then.status(503);
            })
            .await;

        let fetcher = fetcher_for(server.url("/status.json"));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_http_invalid_body_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/status.json");
                then.status(200).body("<html>nope</html>");
            })
            .await;

        let fetcher = fetcher_for(server.url("/status.json"));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    /// Minimal https endpoint with a freshly generated self-signed
    /// certificate, answering every request with `body`.
    async fn spawn_tls_server(body: &'static str) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
        use tokio_rustls::TlsAcceptor;

        let certified =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let certs: Vec<CertificateDer<'static>> = vec![certified.cert.der().clone()];
        let key = PrivateKeyDer::Pkcs8(certified.key_pair.serialize_der().into());

        let provider =
            std::sync::Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
        let config = tokio_rustls::rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .unwrap();
        let acceptor = TlsAcceptor::from(std::sync::Arc::new(config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // Handshake fails when the client rejects the certificate.
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut buf = [0u8; 4096];
                    let _ = tls.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = tls.write_all(response.as_bytes()).await;
                    let _ = tls.shutdown().await;
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_https_self_signed_accepted_when_insecure() {
        let addr = spawn_tls_server(r#"{"up":1}"#).await;
        let fetcher = SourceFetcher::new(&SourceConfig {
            url: format!("https://localhost:{}/status.json", addr.port()),
            insecure: true,
            ..Default::default()
        })
        .unwrap();

        let doc = fetcher.fetch().await.unwrap();
        assert_eq!(doc, json!({"up": 1}));
    }

    #[tokio::test]
    async fn test_https_self_signed_rejected_by_default() {
        let addr = spawn_tls_server(r#"{"up":1}"#).await;
        let fetcher = fetcher_for(format!("https://localhost:{}/status.json", addr.port()));

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
