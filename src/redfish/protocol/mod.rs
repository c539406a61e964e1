pub mod chassis;
pub mod system;

use serde::{Deserialize, Deserializer};

/// Decode `null` and absent strings as empty strings.
pub(crate) fn null_to_default<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(d)?;
    let val = opt.unwrap_or_default();
    Ok(val)
}

/// `Status` is a common structure used in any entity with a status
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    /// The health state of this resource in the absence of its dependent resources.
    ///
    /// | Valid values | Description |
    /// | ------------ | ----------- |
    /// | Critical | A critical condition requires immediate attention. |
    /// | OK | Normal. |
    /// | Warning | A condition requires attention. |
    ///
    /// This field could be missing, if the state is "Absent"
    #[serde(default)]
    pub health: Option<String>,

    /// The state of the resource, e.g. `Enabled`, `Absent` or `StandbyOffline`
    #[serde(default, deserialize_with = "null_to_default")]
    pub state: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Link {
    #[serde(default, rename = "@odata.id", deserialize_with = "null_to_default")]
    odata_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    href: String,
}

impl Link {
    pub fn path(&self) -> &str {
        if self.odata_id.is_empty() {
            return self.href.as_str();
        }

        self.odata_id.as_str()
    }
}

/// A Redfish collection, which lists references to its members rather than
/// their bodies.
#[derive(Debug, Deserialize)]
pub struct Collection<T = Link> {
    #[serde(default = "Vec::new", rename = "Members")]
    pub members: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_falls_back_to_href() {
        let link = serde_json::from_str::<Link>(r#"{"href": "/rest/v1/Systems/1"}"#).unwrap();
        assert_eq!(link.path(), "/rest/v1/Systems/1");

        let link = serde_json::from_str::<Link>(
            r#"{"@odata.id": "/redfish/v1/Systems/1", "href": "/rest/v1/Systems/1"}"#,
        )
        .unwrap();
        assert_eq!(link.path(), "/redfish/v1/Systems/1");
    }

    #[test]
    fn collection() {
        let data = std::fs::read("tests/redfish/ilo5/Systems/index.json").unwrap();
        let collection = serde_json::from_slice::<Collection>(&data).unwrap();

        assert_eq!(collection.members.len(), 1);
        assert_eq!(collection.members[0].path(), "/redfish/v1/Systems/1/");
    }

    #[test]
    fn empty_collection() {
        let collection = serde_json::from_str::<Collection>(r#"{"Name": "Storage"}"#).unwrap();
        assert!(collection.members.is_empty());
    }

    #[test]
    fn null_state() {
        let status =
            serde_json::from_str::<Status>(r#"{"Health": null, "State": null}"#).unwrap();
        assert_eq!(status.health, None);
        assert_eq!(status.state, "");
    }
}
