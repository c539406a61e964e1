use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::protocol::Link;
use super::protocol::system::{Drive, Storage};
use super::{Client, Error};

/// What to do when one member of a collection can't be fetched.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole traversal
    #[default]
    Abort,
    /// Record the member as skipped and keep going
    Skip,
}

/// A member left out of a traversal, and why.
#[derive(Debug)]
pub struct Skipped {
    pub path: String,
    pub error: Error,
}

/// Outcome of a tolerant traversal, successfully decoded items in listing
/// order plus everything that was skipped on the way.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Collected {
            items: vec![],
            skipped: vec![],
        }
    }
}

/// Drives of one storage subsystem.
#[derive(Debug)]
pub struct StorageDrives {
    /// `Id` of the Storage resource
    pub storage: String,
    pub drives: Vec<Drive>,
}

pub(super) async fn fetch_members<T: DeserializeOwned>(
    client: &Client,
    cx: &CancellationToken,
    links: &[Link],
    policy: FailurePolicy,
) -> Result<Collected<T>, Error> {
    let mut collected = Collected::default();

    for link in links {
        let path = link.path();
        let result = if path.is_empty() {
            Err(Error::MissingLink)
        } else {
            client.fetch::<T>(cx, path).await
        };

        match result {
            Ok(item) => collected.items.push(item),
            // cancellation is never skipped
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => match policy {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Skip => collected.skipped.push(Skipped {
                    path: path.to_string(),
                    error: err,
                }),
            },
        }
    }

    Ok(collected)
}

pub(super) async fn storage_drives(
    client: &Client,
    cx: &CancellationToken,
    storages: &[Link],
) -> Result<Collected<StorageDrives>, Error> {
    let Collected {
        items: storages,
        mut skipped,
    } = fetch_members::<Storage>(client, cx, storages, FailurePolicy::Skip).await?;

    let mut items = Vec::with_capacity(storages.len());
    for storage in storages {
        let drives =
            fetch_members::<Drive>(client, cx, &storage.drives, FailurePolicy::Skip).await?;

        skipped.extend(drives.skipped);
        items.push(StorageDrives {
            storage: storage.id,
            drives: drives.items,
        });
    }

    Ok(Collected { items, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use framework::tls::TlsConfig;
    use http::StatusCode;
    use testify::http::MockServer;
    use url::Url;

    use crate::redfish::ErrorKind;

    fn client(endpoint: &str) -> Client {
        let tls = TlsConfig {
            verify_certificate: false,
            ..TlsConfig::default()
        };

        Client::new(
            Url::parse(endpoint).unwrap(),
            "",
            "".into(),
            &tls,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    const SYSTEMS: &str = r#"{
        "Members": [
            {"@odata.id": "/redfish/v1/Systems/1"},
            {"@odata.id": "/redfish/v1/Systems/2"}
        ],
        "Members@odata.count": 2
    }"#;

    #[tokio::test]
    async fn abort_on_member_failure() {
        let server = MockServer::new()
            .route("/redfish/v1/Systems", StatusCode::OK, SYSTEMS)
            .route("/redfish/v1/Systems/1", StatusCode::INTERNAL_SERVER_ERROR, "")
            .route("/redfish/v1/Systems/2", StatusCode::OK, r#"{"Id": "2"}"#)
            .start()
            .await;
        let client = client(&server.endpoint());

        let err = client
            .list_systems(&CancellationToken::new(), FailurePolicy::Abort)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        // stopped at the first failure
        assert_eq!(server.hits("/redfish/v1/Systems/2"), 0);
    }

    #[tokio::test]
    async fn skip_member_failure() {
        let server = MockServer::new()
            .route("/redfish/v1/Systems", StatusCode::OK, SYSTEMS)
            .route("/redfish/v1/Systems/1", StatusCode::OK, "[]")
            .route("/redfish/v1/Systems/2", StatusCode::OK, r#"{"Id": "2"}"#)
            .start()
            .await;
        let client = client(&server.endpoint());

        let systems = client
            .list_systems(&CancellationToken::new(), FailurePolicy::Skip)
            .await
            .unwrap();

        assert_eq!(systems.items.len(), 1);
        assert_eq!(systems.items[0].id, "2");
        assert_eq!(systems.skipped.len(), 1);
        assert_eq!(systems.skipped[0].path, "/redfish/v1/Systems/1");
        assert_eq!(systems.skipped[0].error.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn member_without_link() {
        let server = MockServer::new()
            .route(
                "/redfish/v1/Systems",
                StatusCode::OK,
                r#"{"Members": [
                    {"@odata.id": null},
                    {"@odata.id": "/redfish/v1/Systems/2"}
                ]}"#,
            )
            .route("/redfish/v1/Systems/2", StatusCode::OK, r#"{"Id": "2"}"#)
            .route("/", StatusCode::OK, r#"{"Id": "RootService"}"#)
            .start()
            .await;
        let client = client(&server.endpoint());
        let cx = CancellationToken::new();

        let err = client
            .list_systems(&cx, FailurePolicy::Abort)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingLink), "{err}");
        assert_eq!(err.kind(), ErrorKind::Decode);

        let systems = client.list_systems(&cx, FailurePolicy::Skip).await.unwrap();
        assert_eq!(systems.items.len(), 1);
        assert_eq!(systems.items[0].id, "2");
        assert_eq!(systems.skipped.len(), 1);
        assert_eq!(systems.skipped[0].path, "");
        assert!(matches!(systems.skipped[0].error, Error::MissingLink));

        // the service root is never mistaken for a member
        assert_eq!(server.hits("/"), 0);
    }

    #[tokio::test]
    async fn storage_and_drive_failures_are_isolated() {
        let server = MockServer::new()
            .route(
                "/redfish/v1/Systems/1/Storage",
                StatusCode::OK,
                r#"{"Members": [
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/A"},
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/B"},
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/C"}
                ]}"#,
            )
            .route(
                "/redfish/v1/Systems/1/Storage/A",
                StatusCode::OK,
                r#"{"Id": "A", "Drives": [
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/A/Drives/0"},
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/A/Drives/1"}
                ]}"#,
            )
            .route(
                "/redfish/v1/Systems/1/Storage/B",
                StatusCode::NOT_FOUND,
                "",
            )
            .route(
                "/redfish/v1/Systems/1/Storage/C",
                StatusCode::OK,
                r#"{"Id": "C", "Drives": [
                    {"@odata.id": "/redfish/v1/Systems/1/Storage/C/Drives/0"}
                ]}"#,
            )
            .route(
                "/redfish/v1/Systems/1/Storage/A/Drives/0",
                StatusCode::OK,
                r#"{"Id": "0", "Status": {"Health": "OK"}}"#,
            )
            .route(
                "/redfish/v1/Systems/1/Storage/A/Drives/1",
                StatusCode::INTERNAL_SERVER_ERROR,
                "",
            )
            .route(
                "/redfish/v1/Systems/1/Storage/C/Drives/0",
                StatusCode::OK,
                r#"{"Id": "0", "Status": {"Health": "Warning"}}"#,
            )
            .start()
            .await;
        let client = client(&server.endpoint());

        let collected = client
            .drives(&CancellationToken::new(), "/redfish/v1/Systems/1/Storage")
            .await
            .unwrap();

        let storages = collected
            .items
            .iter()
            .map(|s| (s.storage.as_str(), s.drives.len()))
            .collect::<Vec<_>>();
        assert_eq!(storages, vec![("A", 1), ("C", 1)]);

        let skipped = collected
            .skipped
            .iter()
            .map(|s| s.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            skipped,
            vec![
                "/redfish/v1/Systems/1/Storage/B",
                "/redfish/v1/Systems/1/Storage/A/Drives/1"
            ]
        );
    }

    #[tokio::test]
    async fn storage_collection_failure() {
        let server = MockServer::new()
            .route(
                "/redfish/v1/Systems/1/Storage",
                StatusCode::INTERNAL_SERVER_ERROR,
                "",
            )
            .start()
            .await;
        let client = client(&server.endpoint());

        let err = client
            .drives(&CancellationToken::new(), "/redfish/v1/Systems/1/Storage")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn cancelled_is_not_skipped() {
        let server = MockServer::new()
            .route("/redfish/v1/Systems", StatusCode::OK, SYSTEMS)
            .start()
            .await;
        let client = client(&server.endpoint());

        let cx = CancellationToken::new();
        let collection = client
            .fetch::<crate::redfish::protocol::Collection>(&cx, "/redfish/v1/Systems")
            .await
            .unwrap();
        cx.cancel();

        let err = fetch_members::<Storage>(&client, &cx, &collection.members, FailurePolicy::Skip)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
