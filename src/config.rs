use std::path::{Path, PathBuf};
use std::time::Duration;

use framework::config::{SecretString, default_interval, default_timeout};
use framework::tls::TlsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::metrics::MetricsConfig;
use crate::redfish::FailurePolicy;

const DEFAULT_ENDPOINT: &str = "https://127.0.0.1";
const DEFAULT_MODEL: &str = "iLO 5";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path:?} failed, {err}")]
    Read { path: PathBuf, err: std::io::Error },

    #[error("parse config file {path:?} failed, {err}")]
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    #[error("invalid endpoint {endpoint:?}, {err}")]
    Endpoint {
        endpoint: String,
        err: url::ParseError,
    },

    #[error("unsupported endpoint scheme {0:?}, http or https expected")]
    Scheme(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("unknown metric {0:?}")]
    UnknownMetric(String),
}

/// Configuration of one management controller.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the management controller, e.g. `https://10.0.0.5`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: SecretString,

    /// Accept any certificate the controller presents. Most of them ship a
    /// self-signed one.
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// PEM bundle used instead of the system trust store.
    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    /// The interval between scrape cycles.
    #[serde(default = "default_interval", with = "humanize::duration::serde")]
    pub interval: Duration,

    /// Bounds each HTTP request, not the whole cycle.
    #[serde(default = "default_timeout", with = "humanize::duration::serde")]
    pub timeout: Duration,

    /// What a failing System member does to the Systems traversal.
    #[serde(default)]
    pub systems_failure_policy: FailurePolicy,

    /// Reported as the `model` resource attribute.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: default_endpoint(),
            username: String::new(),
            password: SecretString::default(),
            insecure_skip_verify: false,
            ca_file: None,
            interval: default_interval(),
            timeout: default_timeout(),
            systems_failure_policy: FailurePolicy::default(),
            model: default_model(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            err,
        })?;

        let config =
            serde_yaml::from_str::<Config>(&content).map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                err,
            })?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        if self.interval.is_zero() {
            return Err(ConfigError::Zero("interval"));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout"));
        }

        if let Some(name) = self.metrics.unknown().next() {
            return Err(ConfigError::UnknownMetric(name.to_string()));
        }

        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|err| ConfigError::Endpoint {
            endpoint: self.endpoint.clone(),
            err,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Scheme(scheme.to_string())),
        }
    }

    pub fn tls(&self) -> TlsConfig {
        TlsConfig {
            ca: self.ca_file.clone(),
            verify_certificate: !self.insecure_skip_verify,
            verify_hostname: !self.insecure_skip_verify,
        }
    }
}
