//! Database credentials and where they come from.
//!
//! Values are layered from an optional `mpp_db.toml` in the working
//! directory, then `MPP_DB_*` environment variables. Nothing is validated at
//! load time; [`DbConfig::credentials`] is the single check, run by
//! [`ConnectionProvider::acquire`](crate::db::ConnectionProvider::acquire).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Base name of the optional config file (extension picked by `config`).
const CONFIG_FILE: &str = "mpp_db";

/// Prefix of the environment variables, e.g. `MPP_DB_URL`.
const ENV_PREFIX: &str = "MPP_DB";

/// Connection settings. Loaded once and read-only afterwards.
#[derive(Clone, Default, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Validated view of a [`DbConfig`] with every value present.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub url: &'a str,
    pub user: &'a str,
    pub password: &'a str,
}

impl DbConfig {
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            user: Some(user.into()),
            password: Some(password.into()),
        }
    }

    /// Load from `mpp_db.toml` (optional) overridden by `MPP_DB_*`.
    pub fn load() -> Result<Self> {
        Self::load_with(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load from an explicit file. The file must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load from TOML text.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Check that url, user and password are all present and non-blank.
    pub fn credentials(&self) -> Result<Credentials<'_>> {
        let fields = [
            ("url", self.url.as_deref()),
            ("user", self.user.as_deref()),
            ("password", self.password.as_deref()),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        match (self.url.as_deref(), self.user.as_deref(), self.password.as_deref()) {
            (Some(url), Some(user), Some(password)) if missing.is_empty() => Ok(Credentials {
                url,
                user,
                password,
            }),
            _ => Err(Error::Configuration(format!(
                "missing database {}; set {ENV_PREFIX}_<NAME> or add them to {CONFIG_FILE}.toml",
                missing.join(", ")
            ))),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
