//! Daemon settings.
//!
//! Read from `$XDG_CONFIG_HOME/virt-secretd/config.toml` when it exists, then
//! overridden by `VIRTSECRETD_*` environment variables.
use std::env;
use std::path;

use crate::error;
use crate::store;

pub const DEFAULT_DBUS_NAME: &str = "org.libvirt.secrets";

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Settings {
    pub log_level: String,
    pub dbus_name: String,
    /// `session`, `system`, or a D-Bus address.
    pub bus: String,
    pub max_value_len: usize,
}

impl Settings {
    pub fn load() -> Result<Self, error::Error> {
        Self::load_from(Some(&default_config_path()))
    }

    pub fn load_from(config_path: Option<&path::Path>) -> Result<Self, error::Error> {
        let mut builder = config::Config::builder()
            .set_default("log_level", "INFO")?
            .set_default("dbus_name", DEFAULT_DBUS_NAME)?
            .set_default("bus", "session")?
            .set_default("max_value_len", store::DEFAULT_MAX_VALUE_LEN as u64)?;

        builder = match config_path {
            Some(config_path) => builder.add_source(
                config::File::from(config_path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            ),
            None => builder,
        };

        let settings = builder
            .add_source(config::Environment::with_prefix("virtsecretd"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn default_config_path() -> path::PathBuf {
    let config_folder = env::var("XDG_CONFIG_HOME")
        .map(path::PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| path::Path::new(&home).join(".config")))
        .unwrap_or_else(|_| path::PathBuf::from(".config"));

    let mut config_path = config_folder;
    config_path.push("virt-secretd");
    config_path.push("config.toml");
    config_path
}
