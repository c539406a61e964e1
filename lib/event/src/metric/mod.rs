use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The value of a single data point.
///
/// Ordinals (health, power state) are kept as integers so they are never
/// confused with measured readings.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Int(i64),
    Double(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(v) => *v as f64,
            MetricValue::Double(v) => *v,
        }
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::Double(v) => write!(f, "{v}"),
        }
    }
}

pub trait IntoMetricValue {
    fn into_metric_value(self) -> MetricValue;
}

macro_rules! impl_into_int {
    ($typ:ident) => {
        impl IntoMetricValue for $typ {
            #[inline]
            fn into_metric_value(self) -> MetricValue {
                MetricValue::Int(self as i64)
            }
        }
    };
}

macro_rules! impl_into_double {
    ($typ:ident) => {
        impl IntoMetricValue for $typ {
            #[inline]
            fn into_metric_value(self) -> MetricValue {
                MetricValue::Double(self as f64)
            }
        }
    };
}

impl_into_int!(i64);
impl_into_int!(i32);
impl_into_int!(u32);
impl_into_int!(usize);
impl_into_double!(f64);
impl_into_double!(f32);

impl IntoMetricValue for bool {
    #[inline]
    fn into_metric_value(self) -> MetricValue {
        MetricValue::Int(if self { 1 } else { 0 })
    }
}

impl IntoMetricValue for std::time::Duration {
    #[inline]
    fn into_metric_value(self) -> MetricValue {
        MetricValue::Double(self.as_secs_f64())
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
pub struct MetricSeries {
    pub name: String,
    pub tags: BTreeMap<String, String>,
}

/// The type alias for an array of `Metric` elements
pub type Metrics = Vec<Metric>;

#[derive(Clone, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
pub struct Metric {
    #[serde(flatten)]
    pub series: MetricSeries,

    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub timestamp: Option<DateTime<Utc>>,

    pub value: MetricValue,
}

impl Display for Metric {
    /// Display a metric using something like Prometheus's text format
    ///
    /// ```text
    /// TIMESTAMP NAME{TAGS} VALUE
    /// ```
    ///
    /// example:
    /// ```text
    /// 2026-08-12T20:23:37.248661343Z redfish_system_health{system="1"} 1
    /// ```
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(timestamp) = &self.timestamp {
            write!(fmt, "{timestamp:?} ")?;
        }

        write!(fmt, "{}", self.name())?;

        if !self.series.tags.is_empty() {
            fmt.write_char('{')?;

            let mut n = 0;
            for (k, v) in self.tags() {
                n += 1;
                write!(fmt, "{k}=\"{v}\"")?;
                if n != self.series.tags.len() {
                    fmt.write_char(',')?;
                }
            }

            fmt.write_char('}')?;
        }

        write!(fmt, " {}", self.value)
    }
}

impl Metric {
    #[inline]
    pub fn gauge<N, D, V>(name: N, desc: D, v: V) -> Metric
    where
        N: Into<String>,
        D: Into<String>,
        V: IntoMetricValue,
    {
        Self::gauge_with_tags(name, desc, v, BTreeMap::new())
    }

    #[inline]
    pub fn gauge_with_tags<N, D, V>(
        name: N,
        desc: D,
        value: V,
        tags: BTreeMap<String, String>,
    ) -> Metric
    where
        N: Into<String>,
        D: Into<String>,
        V: IntoMetricValue,
    {
        Self {
            series: MetricSeries {
                name: name.into(),
                tags,
            },
            description: Some(desc.into()),
            unit: None,
            timestamp: None,
            value: value.into_metric_value(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.series.name
    }

    #[inline]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    #[inline]
    pub fn with_timestamp(mut self, ts: Option<DateTime<Utc>>) -> Self {
        self.timestamp = ts;
        self
    }

    #[inline]
    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    #[inline]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.series.tags
    }

    #[inline]
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.series.tags.get(name).map(|k| k.as_str())
    }

    #[inline]
    pub fn insert_tag(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.series.tags.insert(name.into(), value.into())
    }
}
