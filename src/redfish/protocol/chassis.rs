pub use power::{Power, PowerControl, PowerSupply, Voltage};
pub use thermal::{Fan, Location, Temperature, Thermal};

use super::{Status, null_to_default};

mod thermal {
    use serde::Deserialize;

    use super::{Status, null_to_default};

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Fan {
        /// The unique identifier for the member within an array
        #[serde(default, deserialize_with = "null_to_default")]
        pub member_id: String,
        /// Name of the fan
        #[serde(default, deserialize_with = "null_to_default")]
        pub name: String,

        /// The fan speed
        #[serde(default)]
        pub reading: Option<f64>,
        /// The units in which the fan reading and thresholds are measured
        ///
        /// | Value | Description |
        /// | ---- | ------ |
        /// | Percent | The fan reading and thresholds are measured as a percentage. |
        /// | RPM | The fan reading and thresholds are measured in revolutions per minute. |
        #[serde(default, deserialize_with = "null_to_default")]
        pub reading_units: String,

        #[serde(default)]
        pub status: Option<Status>,
    }

    /// Sensor placement on the board, in millimeters.
    #[derive(Clone, Debug, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Location {
        #[serde(default)]
        pub location_xmm: i64,
        #[serde(default)]
        pub location_ymm: i64,
    }

    #[derive(Clone, Debug, Default, Deserialize)]
    pub struct TemperatureOem {
        // iLO 4 and older firmwares use `Hp`
        #[serde(default, rename = "Hpe", alias = "Hp")]
        pub hpe: Option<Location>,
    }

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Temperature {
        #[serde(default, deserialize_with = "null_to_default")]
        pub member_id: String,
        #[serde(default, deserialize_with = "null_to_default")]
        pub name: String,
        #[serde(default)]
        pub sensor_number: Option<i64>,
        /// The area or device to which this temperature measurement applies,
        /// e.g. `CPU`, `SystemBoard` or `Intake`.
        #[serde(default, deserialize_with = "null_to_default")]
        pub physical_context: String,

        #[serde(default)]
        pub status: Option<Status>,

        // The temperature (°C).
        // None if this is disabled
        #[serde(default)]
        pub reading_celsius: Option<f64>,
        // The value at which the reading is above normal range but not yet fatal.
        #[serde(default)]
        pub upper_threshold_critical: Option<f64>,
        // The value at which the reading is above normal range and fatal
        #[serde(default)]
        pub upper_threshold_fatal: Option<f64>,

        #[serde(default)]
        pub oem: Option<TemperatureOem>,
    }

    impl Temperature {
        pub fn location(&self) -> Location {
            self.oem
                .as_ref()
                .and_then(|oem| oem.hpe.clone())
                .unwrap_or_default()
        }
    }

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Thermal {
        #[serde(default)]
        pub fans: Vec<Fan>,
        #[serde(default)]
        pub temperatures: Vec<Temperature>,
    }
}

mod power {
    use serde::Deserialize;

    use super::{Status, null_to_default};

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Voltage {
        #[serde(default, deserialize_with = "null_to_default")]
        pub member_id: String,
        #[serde(default, deserialize_with = "null_to_default")]
        pub name: String,

        /// The reading of the voltage sensor.
        #[serde(default)]
        pub reading_volts: Option<f64>,
        #[serde(default, deserialize_with = "null_to_default")]
        pub physical_context: String,
    }

    /// The set of power control functions, including power reading and limiting.
    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct PowerControl {
        #[serde(default, deserialize_with = "null_to_default")]
        pub member_id: String,
        #[serde(default, deserialize_with = "null_to_default")]
        pub name: String,

        /// The actual power that the chassis consumes, in watt units.
        #[serde(default)]
        pub power_consumed_watts: Option<f64>,
        /// The total amount of power that can be allocated to the chassis. This value can be
        /// either the power supply capacity or the power budget that an upstream chassis
        /// assigns to this chassis.
        #[serde(default)]
        pub power_capacity_watts: Option<f64>,
    }

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct PowerSupply {
        #[serde(default, deserialize_with = "null_to_default")]
        pub member_id: String,
        #[serde(default, deserialize_with = "null_to_default")]
        pub name: String,

        #[serde(default)]
        pub status: Option<Status>,

        /// The average power output of this power supply.
        #[serde(default)]
        pub last_power_output_watts: Option<f64>,
        /// The line input voltage at which the power supply is operating.
        #[serde(default)]
        pub line_input_voltage: Option<f64>,
        /// The maximum capacity of this power supply.
        #[serde(default)]
        pub power_capacity_watts: Option<f64>,
    }

    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Power {
        #[serde(default)]
        pub power_supplies: Vec<PowerSupply>,
        #[serde(default)]
        pub power_control: Vec<PowerControl>,
        #[serde(default)]
        pub voltages: Vec<Voltage>,
    }
}
