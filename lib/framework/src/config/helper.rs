use std::time::Duration;

pub const fn default_true() -> bool {
    true
}

pub const fn default_interval() -> Duration {
    Duration::from_secs(15)
}

/// Upper bound of a single outgoing request.
pub const fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
