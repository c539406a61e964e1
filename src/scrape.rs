use chrono::Utc;
use event::{Resource, Snapshot};
use framework::http::HttpError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigError};
use crate::health::{power_state, status_health};
use crate::metrics::MetricsBuilder;
use crate::redfish::protocol::chassis::{Power, Thermal};
use crate::redfish::{Client, Error, FailurePolicy, Skipped};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("build redfish client failed, {0}")]
    Client(#[from] HttpError),

    #[error("scrape cycle cancelled")]
    Cancelled,
}

/// Scrapes one management controller.
///
/// The client is built lazily, by [`Receiver::start`] or by the first
/// [`Receiver::scrape`], and dropped by [`Receiver::shutdown`].
pub struct Receiver {
    config: Config,
    client: Option<Client>,
}

impl Receiver {
    pub fn new(config: Config) -> Self {
        Receiver {
            config,
            client: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    pub fn start(&mut self) -> Result<&Client, ScrapeError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => {
                let client = Client::new(
                    self.config.endpoint_url()?,
                    &self.config.username,
                    self.config.password.clone(),
                    &self.config.tls(),
                    self.config.timeout,
                )?;

                debug!(
                    message = "redfish client created",
                    endpoint = %client.endpoint(),
                    timeout = ?self.config.timeout,
                );

                client
            }
        };

        Ok(self.client.insert(client))
    }

    pub fn shutdown(&mut self) {
        if self.client.take().is_some() {
            debug!(message = "redfish client released", endpoint = %self.config.endpoint);
        }
    }

    /// Run one complete scrape cycle.
    ///
    /// Failures of single resource families are logged and leave gaps in the
    /// snapshot, only cancellation or a client that can't be built fails the
    /// cycle.
    pub async fn scrape(&mut self, cx: &CancellationToken) -> Result<Snapshot, ScrapeError> {
        let client = self.start()?.clone();

        let mut mb = MetricsBuilder::new(&self.config.metrics, Utc::now());

        let (hostname, serial_number) = collect_systems(
            &client,
            cx,
            self.config.systems_failure_policy,
            &mut mb,
        )
        .await?;

        collect_chassis(&client, cx, &mut mb).await?;

        // a cancel after the last request still wins over a snapshot
        if cx.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        let mut resource = Resource::default();
        resource.insert("endpoint", self.config.endpoint.as_str());
        resource.insert("model", self.config.model.as_str());
        resource.insert("hostname", hostname);
        resource.insert("serial_number", serial_number);

        let snapshot = mb.emit(resource);

        debug!(
            message = "scrape cycle finished",
            endpoint = %self.config.endpoint,
            metrics = snapshot.len(),
        );

        Ok(snapshot)
    }
}

/// Turns a failed traversal into `Err(Cancelled)` when it was cancelled, and
/// into `Ok(None)` otherwise, after logging it with `$level`.
macro_rules! tolerate {
    ($result:expr, $level:ident, $msg:literal $(, $($field:tt)*)?) => {
        match $result {
            Ok(value) => Some(value),
            Err(err) if err.is_cancelled() => return Err(ScrapeError::Cancelled),
            Err(err) => {
                $level!(
                    message = $msg,
                    $($($field)*,)?
                    kind = ?err.kind(),
                    %err,
                );

                None
            }
        }
    };
}

fn log_skipped(skipped: &[Skipped], resource: &'static str) {
    for Skipped { path, error } in skipped {
        warn!(
            message = "skip unavailable resource",
            resource,
            path,
            kind = ?error.kind(),
            err = %error,
        );
    }
}

/// Records system and drive metrics, returns hostname and serial number of
/// the first system.
async fn collect_systems(
    client: &Client,
    cx: &CancellationToken,
    policy: FailurePolicy,
    mb: &mut MetricsBuilder<'_>,
) -> Result<(String, String), ScrapeError> {
    let Some(systems) = tolerate!(
        client.list_systems(cx, policy).await,
        error,
        "failed to get systems"
    ) else {
        return Ok((String::new(), String::new()));
    };

    log_skipped(&systems.skipped, "system");

    let identity = systems
        .items
        .first()
        .map(|system| (system.host_name.clone(), system.serial_number.clone()))
        .unwrap_or_default();

    for system in &systems.items {
        mb.record_system_power_state(power_state(&system.power_state), &system.id);
        if let Some(health) = status_health(system.status.as_ref()) {
            mb.record_system_health(health, &system.id);
        }

        let Some(collected) = tolerate!(
            client.drives(cx, &system.storage_path()).await,
            warn,
            "failed to get drives",
            system = %system.id
        ) else {
            continue;
        };

        log_skipped(&collected.skipped, "storage");

        for storage in &collected.items {
            for drive in &storage.drives {
                if let Some(health) = status_health(drive.status.as_ref()) {
                    mb.record_drive_health(health, &system.id, &storage.storage, &drive.id);
                }
            }
        }
    }

    Ok(identity)
}

async fn collect_chassis(
    client: &Client,
    cx: &CancellationToken,
    mb: &mut MetricsBuilder<'_>,
) -> Result<(), ScrapeError> {
    let Some(chassis) = tolerate!(
        client.list_chassis(cx).await,
        error,
        "failed to get chassis"
    ) else {
        return Ok(());
    };

    for uri in &chassis {
        // independent branches, recorded afterwards on this task
        let (power, thermal): (Result<Power, Error>, Result<Thermal, Error>) =
            tokio::join!(client.power(cx, uri), client.thermal(cx, uri));

        if let Some(power) = tolerate!(power, warn, "failed to get power", chassis = %uri) {
            record_power(mb, uri, &power);
        }

        if let Some(thermal) = tolerate!(thermal, warn, "failed to get thermal", chassis = %uri) {
            record_thermal(mb, uri, &thermal);
        }
    }

    Ok(())
}

fn record_power(mb: &mut MetricsBuilder<'_>, chassis: &str, power: &Power) {
    for control in &power.power_control {
        if let Some(watts) = control.power_consumed_watts {
            mb.record_power_consumed(watts, chassis);
        }
        if let Some(watts) = control.power_capacity_watts {
            mb.record_power_capacity(watts, chassis);
        }
    }

    for voltage in &power.voltages {
        if let Some(volts) = voltage.reading_volts {
            mb.record_voltage(volts, chassis, &voltage.member_id);
        }
    }

    for psu in &power.power_supplies {
        if let Some(watts) = psu.last_power_output_watts {
            mb.record_psu_output(watts, chassis, &psu.member_id);
        }
        if let Some(volts) = psu.line_input_voltage {
            mb.record_psu_input_voltage(volts, chassis, &psu.member_id);
        }
        if let Some(watts) = psu.power_capacity_watts {
            mb.record_psu_capacity(watts, chassis, &psu.member_id);
        }
        if let Some(health) = status_health(psu.status.as_ref()) {
            mb.record_psu_health(health, chassis, &psu.member_id);
        }
    }
}

fn record_thermal(mb: &mut MetricsBuilder<'_>, chassis: &str, thermal: &Thermal) {
    for temperature in &thermal.temperatures {
        let name = temperature.name.as_str();

        if let Some(celsius) = temperature.reading_celsius {
            let location = temperature.location();

            mb.record_temperature(
                celsius,
                chassis,
                name,
                &temperature.physical_context,
                location.location_xmm,
                location.location_ymm,
            );
        }
        if let Some(celsius) = temperature.upper_threshold_critical {
            mb.record_temperature_critical(celsius, chassis, name);
        }
        if let Some(celsius) = temperature.upper_threshold_fatal {
            mb.record_temperature_fatal(celsius, chassis, name);
        }
        if let Some(health) = status_health(temperature.status.as_ref()) {
            mb.record_temperature_health(health, chassis, name);
        }
    }

    for fan in &thermal.fans {
        if let Some(reading) = fan.reading {
            mb.record_fan_speed(
                reading,
                chassis,
                &fan.name,
                &fan.member_id,
                &fan.reading_units,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::metrics::MetricsConfig;

    #[test]
    fn absent_readings_are_not_recorded() {
        let power = serde_json::from_str::<Power>(
            r#"{
                "PowerControl": [{"PowerConsumedWatts": null, "PowerCapacityWatts": 800}],
                "PowerSupplies": [{"MemberId": "0", "Status": {"State": "Absent"}}],
                "Voltages": [{"MemberId": "3", "Name": "P12V", "ReadingVolts": 12.1}]
            }"#,
        )
        .unwrap();

        let config = MetricsConfig::default();
        let mut mb = MetricsBuilder::new(&config, Utc::now());
        record_power(&mut mb, "/redfish/v1/Chassis/1", &power);
        let snapshot = mb.emit(Resource::default());

        let names = snapshot
            .metrics
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["redfish_power_capacity_watts", "redfish_power_voltage"]
        );
    }

    #[test]
    fn start_and_shutdown() {
        let mut receiver = Receiver::new(Config {
            endpoint: "http://127.0.0.1:1".to_string(),
            insecure_skip_verify: true,
            ..Config::default()
        });
        assert!(!receiver.is_started());

        receiver.start().unwrap();
        assert!(receiver.is_started());

        receiver.shutdown();
        assert!(!receiver.is_started());
    }

    #[test]
    fn start_with_bad_endpoint() {
        let mut receiver = Receiver::new(Config {
            endpoint: "redfish".to_string(),
            ..Config::default()
        });

        let err = receiver.start().err().unwrap();
        assert!(matches!(err, ScrapeError::Config(_)), "{err}");
    }
}
