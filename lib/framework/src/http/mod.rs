mod auth;

use std::fmt;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::{
    ACCEPT_ENCODING, AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION, SET_COOKIE, USER_AGENT,
};
use http::{HeaderMap, Request, header::HeaderValue};
use http_body_util::Full;
use hyper::body::{Body, Incoming};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tracing::Instrument;

use crate::tls::{TlsConfig, TlsError};
pub use auth::BasicAuth;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build TLS connector: {0}")]
    BuildTlsConnector(#[from] TlsError),
    #[error("Failed to make HTTP(S) request: {0}")]
    CallRequest(#[from] hyper_util::client::legacy::Error),
    #[error("Failed to reading response: {0}")]
    ReadIncoming(#[from] hyper::Error),
    #[error("Failed to build HTTP request: {0}")]
    BuildRequest(#[from] http::Error),
    #[error("unexpected status code {0}")]
    UnexpectedStatus(http::StatusCode),

    // decode errors
    #[error("decode json response failed, {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    user_agent: HeaderValue,
}

impl HttpClient {
    pub fn new(tls_config: &TlsConfig) -> Result<HttpClient, HttpError> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);

        let config = tls_config.client_config()?;
        let https = HttpsConnector::from((http, config));

        let client = Client::builder(TokioExecutor::new()).build(https);
        let user_agent = HeaderValue::from_static(concat!(
            "bmc-scraper/",
            env!("CARGO_PKG_VERSION")
        ));

        Ok(HttpClient { client, user_agent })
    }

    pub fn send(
        &self,
        mut req: Request<Full<Bytes>>,
    ) -> BoxFuture<'static, Result<http::Response<Incoming>, HttpError>> {
        let span = tracing::info_span!("http", uri = %req.uri());

        default_request_headers(&mut req, &self.user_agent);

        debug!(
            parent: &span,
            message = "sending HTTP request",
            method = %req.method(),
            headers = ?remove_sensitive(req.headers()),
        );

        let resp = self.client.request(req);

        let fut = async move {
            // Request doesn't start the processing until we start polling it.
            let before = std::time::Instant::now();
            let resp = resp.await;
            let roundtrip = before.elapsed();

            let resp = resp.inspect_err(|err| {
                debug!(
                    message = "HTTP request failed",
                    %err,
                    rtt = ?roundtrip,
                );
            })?;

            debug!(
                message = "HTTP response received",
                status = %resp.status(),
                version = ?resp.version(),
                headers = ?remove_sensitive(resp.headers()),
                body = %FormatBody(resp.body()),
                rtt = ?roundtrip,
            );

            Ok(resp)
        }
        .instrument(span);

        Box::pin(fut)
    }
}

fn default_request_headers<B>(request: &mut Request<B>, user_agent: &HeaderValue) {
    if !request.headers().contains_key(USER_AGENT) {
        request.headers_mut().insert(USER_AGENT, user_agent.clone());
    }

    if !request.headers().contains_key(ACCEPT_ENCODING) {
        // compressed responses are not supported
        request
            .headers_mut()
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    }
}

/// Newtype placeholder to provide a formatter for the response body.
struct FormatBody<'a, B>(&'a B);

impl<B: Body> fmt::Display for FormatBody<'_, B> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let size = self.0.size_hint();
        match (size.lower(), size.upper()) {
            (0, None) => write!(fmt, "[unknown]"),
            (lower, None) => write!(fmt, "[>={lower} bytes]"),

            (0, Some(0)) => write!(fmt, "[empty]"),
            (0, Some(upper)) => write!(fmt, "[<={upper} bytes]"),

            (lower, Some(upper)) if lower == upper => write!(fmt, "[{lower} bytes]"),
            (lower, Some(upper)) => write!(fmt, "[{lower}..={upper} bytes]"),
        }
    }
}

fn remove_sensitive(headers: &HeaderMap<HeaderValue>) -> HeaderMap<HeaderValue> {
    let mut headers = headers.clone();
    for name in &[AUTHORIZATION, PROXY_AUTHORIZATION, COOKIE, SET_COOKIE] {
        if let Some(value) = headers.get_mut(name) {
            value.set_sensitive(true);
        }
    }

    headers
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("client", &self.client)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::Method;
    use http::StatusCode;
    use testify::http::MockServer;

    #[test]
    fn default_headers() {
        let user_agent = HeaderValue::from_static("bmc-scraper");
        let mut request = Request::get("http://example.com").body(()).unwrap();
        default_request_headers(&mut request, &user_agent);
        assert_eq!(
            request.headers().get(ACCEPT_ENCODING),
            Some(&HeaderValue::from_static("identity")),
        );
        assert_eq!(request.headers().get(USER_AGENT), Some(&user_agent));
    }

    #[test]
    fn default_headers_does_not_overwrite() {
        let mut request = Request::get("http://example.com")
            .header(ACCEPT_ENCODING, "gzip")
            .header(USER_AGENT, "foo")
            .body(())
            .unwrap();
        default_request_headers(&mut request, &HeaderValue::from_static("bmc-scraper"));
        assert_eq!(
            request.headers().get(ACCEPT_ENCODING),
            Some(&HeaderValue::from_static("gzip")),
        );
        assert_eq!(
            request.headers().get(USER_AGENT),
            Some(&HeaderValue::from_static("foo"))
        );
    }

    #[test]
    fn sensitive_headers_are_masked() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));

        let masked = remove_sensitive(&headers);
        assert!(masked.get(AUTHORIZATION).unwrap().is_sensitive());
        assert!(format!("{masked:?}").contains("Sensitive"));
    }

    #[tokio::test]
    async fn plain_http() {
        let server = MockServer::new()
            .route("/hello", StatusCode::OK, "hello world")
            .start()
            .await;

        let tls = TlsConfig {
            verify_certificate: false,
            ..TlsConfig::default()
        };
        let client = HttpClient::new(&tls).unwrap();
        let req = Request::builder()
            .method(Method::GET)
            .uri(format!("http://{}/hello", server.addr()))
            .body(Full::default())
            .unwrap();

        let resp = client.send(req).await.unwrap();
        assert!(resp.status().is_success());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get(ACCEPT_ENCODING).unwrap(),
            "identity"
        );
    }
}
