use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    core: Core,
    storage: Storage,
    monitor: Monitor,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("GEOTIFY").separator("__"))
            .build()?
            .try_deserialize::<AppConfig>()?
            .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.monitor.validate()?;
        Ok(self)
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Core {
    #[serde(default, with = "humantime_serde")]
    reconcile_interval: Option<Duration>,
}

impl Core {
    /// Interval of the background reconciliation pass, `None` disables it.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        self.reconcile_interval.filter(|interval| !interval.is_zero())
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    kind: StorageKind,
    directory: String,
    slot: String,
}

impl Storage {
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

#[derive(Debug, Deserialize)]
pub struct Monitor {
    available: bool,
    authorized: bool,
    grant_on_request: bool,
    maximum_regions: usize,
    maximum_radius_m: f64,
}

impl Monitor {
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn authorized(&self) -> bool {
        self.authorized
    }

    pub fn grant_on_request(&self) -> bool {
        self.grant_on_request
    }

    pub fn maximum_regions(&self) -> usize {
        self.maximum_regions
    }

    pub fn maximum_radius(&self) -> f64 {
        self.maximum_radius_m
    }

    /// Limits must admit at least one region with a positive radius.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_regions == 0 {
            return Err(ConfigError::Message("monitor.maximum_regions must be at least 1".to_string()));
        }
        if !self.maximum_radius_m.is_finite() || self.maximum_radius_m <= 0.0 {
            return Err(ConfigError::Message(format!(
                "monitor.maximum_radius_m must be a positive number of meters, got {}",
                self.maximum_radius_m
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { reconcile_interval: None },
                storage: Storage {
                    kind: StorageKind::Memory,
                    directory: "data".to_string(),
                    slot: "savedItems".to_string(),
                },
                monitor: Monitor {
                    available: true,
                    authorized: false,
                    grant_on_request: true,
                    maximum_regions: 20,
                    maximum_radius_m: 1_000.0,
                },
            },
        }
    }

    pub fn authorized(mut self, authorized: bool) -> Self {
        self.config.monitor.authorized = authorized;
        self
    }

    pub fn grant_on_request(mut self, grant_on_request: bool) -> Self {
        self.config.monitor.grant_on_request = grant_on_request;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
