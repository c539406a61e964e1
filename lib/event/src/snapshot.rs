use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Metric;

/// Attributes describing the whole scraped entity rather than a single data point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Resource {
    pub attributes: BTreeMap<String, String>,
}

impl Resource {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// The output of one scrape cycle.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Snapshot {
    pub resource: Resource,
    pub metrics: Vec<Metric>,
}

impl Snapshot {
    /// Returns every data point with the given name, in recording order.
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Metric> + 'a {
        self.metrics.iter().filter(move |m| m.name() == name)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource")?;
        for (key, value) in &self.resource.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }
        writeln!(f)?;

        for metric in &self.metrics {
            writeln!(f, "{metric}")?;
        }

        Ok(())
    }
}
