mod helper;
mod secret;

pub use helper::{default_interval, default_timeout, default_true};
pub use secret::SecretString;
