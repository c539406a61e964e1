use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use event::{IntoMetricValue, Metric, Resource, Snapshot, tags};
use framework::config::default_true;
use serde::{Deserialize, Serialize};

/// Static description of one metric this scraper can produce.
#[derive(Debug)]
pub struct MetricDef {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: Option<&'static str>,
}

macro_rules! metric_defs {
    ($( $ident:ident => $name:literal, $desc:literal, $unit:expr; )*) => {
        $(
            pub const $ident: MetricDef = MetricDef {
                name: $name,
                description: $desc,
                unit: $unit,
            };
        )*

        /// Every metric definition, in the order they are documented.
        pub const ALL: &[MetricDef] = &[$( $ident ),*];
    };
}

metric_defs! {
    SYSTEM_POWER_STATE => "redfish_system_power_state", "Power state of the system, 1 is on", None;
    SYSTEM_HEALTH => "redfish_system_health", "Health of the system, 1 OK, 2 Warning, 3 Critical", None;
    DRIVE_HEALTH => "redfish_storage_drive_health", "Health of the drive, 1 OK, 2 Warning, 3 Critical", None;

    POWER_CONSUMED => "redfish_power_consumed_watts", "The actual power that the chassis consumes", Some("W");
    POWER_CAPACITY => "redfish_power_capacity_watts", "The total amount of power that can be allocated to the chassis", Some("W");
    VOLTAGE => "redfish_power_voltage", "Reading of the voltage sensor", Some("V");
    PSU_OUTPUT => "redfish_power_supply_output_watts", "Average power output of the power supply", Some("W");
    PSU_INPUT_VOLTAGE => "redfish_power_supply_input_voltage", "Line input voltage of the power supply", Some("V");
    PSU_CAPACITY => "redfish_power_supply_capacity_watts", "Maximum capacity of the power supply", Some("W");
    PSU_HEALTH => "redfish_power_supply_health", "Health of the power supply, 1 OK, 2 Warning, 3 Critical", None;

    TEMPERATURE => "redfish_thermal_temperature_celsius", "Reading of the temperature sensor", Some("Cel");
    TEMPERATURE_CRITICAL => "redfish_thermal_temperature_upper_critical_celsius", "Reading above this is critical but not yet fatal", Some("Cel");
    TEMPERATURE_FATAL => "redfish_thermal_temperature_upper_fatal_celsius", "Reading above this is fatal", Some("Cel");
    TEMPERATURE_HEALTH => "redfish_thermal_temperature_health", "Health of the temperature sensor, 1 OK, 2 Warning, 3 Critical", None;
    FAN_SPEED => "redfish_fan_speed", "Reading of the fan, in the unit the fan reports", None;

    UP => "redfish_up", "Whether the management controller answered anything this cycle", None;
    SCRAPE_DURATION => "redfish_scrape_duration_seconds", "Time spent on one scrape cycle", Some("s");
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Per metric toggles, keyed by metric name. Metrics not listed are enabled.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MetricsConfig(BTreeMap<String, MetricToggle>);

impl MetricsConfig {
    pub fn enabled(&self, name: &str) -> bool {
        self.0.get(name).is_none_or(|toggle| toggle.enabled)
    }

    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.0.insert(name.into(), MetricToggle { enabled });
    }

    /// Configured names that no metric definition matches.
    pub fn unknown(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|name| ALL.iter().all(|def| def.name != *name))
    }
}

/// Accumulates the data points of one scrape cycle.
///
/// Every point shares the timestamp the builder was created with.
pub struct MetricsBuilder<'a> {
    config: &'a MetricsConfig,
    timestamp: DateTime<Utc>,
    metrics: Vec<Metric>,
}

impl<'a> MetricsBuilder<'a> {
    pub fn new(config: &'a MetricsConfig, timestamp: DateTime<Utc>) -> Self {
        Self {
            config,
            timestamp,
            metrics: vec![],
        }
    }

    fn record<V: IntoMetricValue>(
        &mut self,
        def: &MetricDef,
        value: V,
        tags: BTreeMap<String, String>,
    ) {
        self.record_with_unit(def, value, tags, def.unit.map(ToString::to_string))
    }

    fn record_with_unit<V: IntoMetricValue>(
        &mut self,
        def: &MetricDef,
        value: V,
        tags: BTreeMap<String, String>,
        unit: Option<String>,
    ) {
        if !self.config.enabled(def.name) {
            return;
        }

        self.metrics.push(
            Metric::gauge_with_tags(def.name, def.description, value, tags)
                .with_timestamp(Some(self.timestamp))
                .with_unit(unit),
        );
    }

    pub fn record_system_power_state(&mut self, value: i64, system: &str) {
        self.record(&SYSTEM_POWER_STATE, value, tags!("system" => system));
    }

    pub fn record_system_health(&mut self, value: i64, system: &str) {
        self.record(&SYSTEM_HEALTH, value, tags!("system" => system));
    }

    pub fn record_drive_health(&mut self, value: i64, system: &str, storage: &str, drive: &str) {
        self.record(
            &DRIVE_HEALTH,
            value,
            tags!(
                "system" => system,
                "storage" => storage,
                "drive" => drive,
            ),
        );
    }

    pub fn record_power_consumed(&mut self, value: f64, chassis: &str) {
        self.record(&POWER_CONSUMED, value, tags!("chassis" => chassis));
    }

    pub fn record_power_capacity(&mut self, value: f64, chassis: &str) {
        self.record(&POWER_CAPACITY, value, tags!("chassis" => chassis));
    }

    pub fn record_voltage(&mut self, value: f64, chassis: &str, member_id: &str) {
        self.record(
            &VOLTAGE,
            value,
            tags!("chassis" => chassis, "member_id" => member_id),
        );
    }

    pub fn record_psu_output(&mut self, value: f64, chassis: &str, member_id: &str) {
        self.record(
            &PSU_OUTPUT,
            value,
            tags!("chassis" => chassis, "member_id" => member_id),
        );
    }

    pub fn record_psu_input_voltage(&mut self, value: f64, chassis: &str, member_id: &str) {
        self.record(
            &PSU_INPUT_VOLTAGE,
            value,
            tags!("chassis" => chassis, "member_id" => member_id),
        );
    }

    pub fn record_psu_capacity(&mut self, value: f64, chassis: &str, member_id: &str) {
        self.record(
            &PSU_CAPACITY,
            value,
            tags!("chassis" => chassis, "member_id" => member_id),
        );
    }

    pub fn record_psu_health(&mut self, value: i64, chassis: &str, member_id: &str) {
        self.record(
            &PSU_HEALTH,
            value,
            tags!("chassis" => chassis, "member_id" => member_id),
        );
    }

    pub fn record_temperature(
        &mut self,
        value: f64,
        chassis: &str,
        name: &str,
        context: &str,
        x: i64,
        y: i64,
    ) {
        self.record(
            &TEMPERATURE,
            value,
            tags!(
                "chassis" => chassis,
                "name" => name,
                "context" => context,
                "x" => x.to_string(),
                "y" => y.to_string(),
            ),
        );
    }

    pub fn record_temperature_critical(&mut self, value: f64, chassis: &str, name: &str) {
        self.record(
            &TEMPERATURE_CRITICAL,
            value,
            tags!("chassis" => chassis, "name" => name),
        );
    }

    pub fn record_temperature_fatal(&mut self, value: f64, chassis: &str, name: &str) {
        self.record(
            &TEMPERATURE_FATAL,
            value,
            tags!("chassis" => chassis, "name" => name),
        );
    }

    pub fn record_temperature_health(&mut self, value: i64, chassis: &str, name: &str) {
        self.record(
            &TEMPERATURE_HEALTH,
            value,
            tags!("chassis" => chassis, "name" => name),
        );
    }

    /// `units` is the `ReadingUnits` of the fan, `Percent` or `RPM` usually.
    pub fn record_fan_speed(
        &mut self,
        value: f64,
        chassis: &str,
        name: &str,
        member_id: &str,
        units: &str,
    ) {
        let unit = (!units.is_empty()).then(|| units.to_string());

        self.record_with_unit(
            &FAN_SPEED,
            value,
            tags!(
                "chassis" => chassis,
                "name" => name,
                "member_id" => member_id,
            ),
            unit,
        );
    }

    /// Consume the builder, attaching `resource` to every recorded point.
    pub fn emit(self, resource: Resource) -> Snapshot {
        Snapshot {
            resource,
            metrics: self.metrics,
        }
    }
}
