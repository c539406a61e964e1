//! Ordinal encodings of Redfish status strings.

use crate::redfish::protocol::Status;

/// Health could not be determined. Never emitted as a data point.
pub const UNKNOWN: i64 = 0;

/// `OK` -> 1, `Warning` -> 2, `Critical` -> 3, anything else -> [`UNKNOWN`].
pub fn health_ordinal(health: &str) -> i64 {
    match health {
        "OK" => 1,
        "Warning" => 2,
        "Critical" => 3,
        _ => UNKNOWN,
    }
}

/// The ordinal worth emitting for `status`, if any.
///
/// Absent status, absent health and unrecognized health all yield `None`,
/// so dashboards see a gap rather than a value that looks healthy.
pub fn status_health(status: Option<&Status>) -> Option<i64> {
    let health = status?.health.as_deref()?;

    match health_ordinal(health) {
        UNKNOWN => None,
        ordinal => Some(ordinal),
    }
}

/// `On` -> 1, anything else -> 0. Unlike health, zero is a real value here.
pub fn power_state(state: &str) -> i64 {
    i64::from(state == "On")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(health: Option<&str>) -> Status {
        Status {
            health: health.map(ToString::to_string),
            state: "Enabled".to_string(),
        }
    }

    #[test]
    fn known_health() {
        for (input, want) in [("OK", 1), ("Warning", 2), ("Critical", 3)] {
            assert_eq!(health_ordinal(input), want, "{input}");
            assert_eq!(status_health(Some(&status(Some(input)))), Some(want));
        }
    }

    #[test]
    fn unknown_health_is_not_emitted() {
        for input in ["", "ok", "Degraded", "Unknown", " OK"] {
            assert_eq!(health_ordinal(input), UNKNOWN, "{input:?}");
            assert_eq!(status_health(Some(&status(Some(input)))), None);
        }

        assert_eq!(status_health(Some(&status(None))), None);
        assert_eq!(status_health(None), None);
    }

    #[test]
    fn power_state_is_binary() {
        assert_eq!(power_state("On"), 1);
        for input in ["Off", "PoweringOn", "PoweringOff", "Paused", "", "on"] {
            assert_eq!(power_state(input), 0, "{input:?}");
        }
    }
}
