pub mod protocol;
mod traversal;

use std::time::Duration;

use bytes::Buf;
use framework::config::SecretString;
use framework::http::{BasicAuth, HttpClient, HttpError};
use framework::tls::TlsConfig;
use http::header::ACCEPT;
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use protocol::Collection;
use protocol::chassis::{Power, Thermal};
use protocol::system::System;
pub use traversal::{Collected, FailurePolicy, Skipped, StorageDrives};

const SYSTEMS: &str = "/redfish/v1/Systems";
const CHASSIS: &str = "/redfish/v1/Chassis";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid resource path {path:?}, {err}")]
    InvalidPath { path: String, err: url::ParseError },

    #[error("member link has neither @odata.id nor href")]
    MissingLink,

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}

/// Coarse classification of [`Error`]. Callers treat the first three the
/// same way, as "this resource is unavailable this cycle".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Connection refused, TLS failure, timeout
    Transport,
    /// Non-2xx status
    Protocol,
    /// Malformed or schema-mismatched body
    Decode,
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPath { .. } | Error::MissingLink => ErrorKind::Decode,
            Error::Http(err) => match err {
                HttpError::UnexpectedStatus(_) => ErrorKind::Protocol,
                HttpError::InvalidJson(_) => ErrorKind::Decode,
                HttpError::BuildTlsConnector(_)
                | HttpError::CallRequest(_)
                | HttpError::ReadIncoming(_)
                | HttpError::BuildRequest(_) => ErrorKind::Transport,
            },
            Error::Timeout(_) => ErrorKind::Transport,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Read-only client of one management controller.
///
/// Every operation takes a cancellation token, cancelling it aborts the
/// in-flight request and every request not yet sent.
#[derive(Clone, Debug)]
pub struct Client {
    http: HttpClient,
    endpoint: Url,
    auth: BasicAuth,
    timeout: Duration,
}

impl Client {
    pub fn new(
        endpoint: Url,
        username: &str,
        password: SecretString,
        tls: &TlsConfig,
        timeout: Duration,
    ) -> Result<Self, HttpError> {
        let http = HttpClient::new(tls)?;

        Ok(Client {
            http,
            endpoint,
            auth: BasicAuth::new(username, password),
            timeout,
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Absolute paths are appended to the endpoint, so a controller behind
    /// a path prefix (`https://gw/bmc1`) keeps it. Anything else, a full URL
    /// included, is resolved against the endpoint.
    fn resolve(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with('/') {
            let mut url = self.endpoint.clone();
            let full = format!("{}{path}", url.path().trim_end_matches('/'));
            url.set_path(&full);

            return Ok(url);
        }

        self.endpoint.join(path).map_err(|err| Error::InvalidPath {
            path: path.to_string(),
            err,
        })
    }

    /// GET `path` and decode the body as `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        cx: &CancellationToken,
        path: &str,
    ) -> Result<T, Error> {
        if cx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = self.resolve(path)?;

        let mut req = http::Request::get(url.as_str())
            .header(ACCEPT, "application/json")
            .header("OData-Version", "4.0")
            .body(Full::default())
            .map_err(HttpError::from)?;
        self.auth.apply(&mut req);

        let fut = async {
            let resp = self.http.send(req).await?;

            let (parts, incoming) = resp.into_parts();
            if !parts.status.is_success() {
                return Err(HttpError::UnexpectedStatus(parts.status));
            }

            let body = incoming.collect().await?.to_bytes();

            serde_json::from_reader::<_, T>(body.reader()).map_err(HttpError::from)
        };

        tokio::select! {
            biased;

            _ = cx.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, fut) => match result {
                Ok(result) => result.map_err(Error::Http),
                Err(_elapsed) => Err(Error::Timeout(self.timeout)),
            }
        }
    }

    /// Fetch the Systems collection, then every member of it.
    ///
    /// The collection failing fails the call. What a failing member does
    /// depends on `policy`.
    pub async fn list_systems(
        &self,
        cx: &CancellationToken,
        policy: FailurePolicy,
    ) -> Result<Collected<System>, Error> {
        let collection = self.fetch::<Collection>(cx, SYSTEMS).await?;

        traversal::fetch_members(self, cx, &collection.members, policy).await
    }

    /// Returns the URIs of every chassis, as listed.
    pub async fn list_chassis(&self, cx: &CancellationToken) -> Result<Vec<String>, Error> {
        let collection = self.fetch::<Collection>(cx, CHASSIS).await?;

        Ok(collection
            .members
            .iter()
            .map(|link| link.path().to_string())
            .filter(|path| !path.is_empty())
            .collect())
    }

    pub async fn power(&self, cx: &CancellationToken, chassis: &str) -> Result<Power, Error> {
        self.fetch(cx, &sub_path(chassis, "Power")).await
    }

    pub async fn thermal(&self, cx: &CancellationToken, chassis: &str) -> Result<Thermal, Error> {
        self.fetch(cx, &sub_path(chassis, "Thermal")).await
    }

    /// Walk Storage collection -> Storage -> Drive under `storage_path`.
    ///
    /// Only the Storage collection failing fails the call, a failed storage
    /// or drive is skipped and recorded.
    pub async fn drives(
        &self,
        cx: &CancellationToken,
        storage_path: &str,
    ) -> Result<Collected<StorageDrives>, Error> {
        let collection = self.fetch::<Collection>(cx, storage_path).await?;

        traversal::storage_drives(self, cx, &collection.members).await
    }
}

/// `/redfish/v1/Chassis/1/` + `Power` -> `/redfish/v1/Chassis/1/Power`
fn sub_path(parent: &str, child: &str) -> String {
    format!("{}/{child}", parent.trim_end_matches('/'))
}
