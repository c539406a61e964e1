#[macro_use]
extern crate tracing;

pub mod config;
pub mod controller;
pub mod health;
pub mod metrics;
pub mod output;
pub mod redfish;
pub mod scrape;

pub use framework::{Error, Result};

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
