//! Credential resolution for the Genie relay.
//!
//! Values come from three layers, strongest first: the process
//! environment, the configuration file, and the optional env file
//! (`.env.local` by default), which only fills what is still missing.

use crate::GenieSettings;
use fleet_core::{FleetError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::debug;

pub const HOST_ENV: &str = "DATABRICKS_HOST";
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";
pub const SPACE_ID_ENV: &str = "DATABRICKS_GENIE_SPACE_ID";

/// Everything needed to reach one Genie space.
#[derive(Clone, PartialEq, Eq)]
pub struct GenieCredentials {
    pub host: String,
    pub token: String,
    pub space_id: String,
}

impl std::fmt::Debug for GenieCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenieCredentials")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("space_id", &self.space_id)
            .finish()
    }
}

impl GenieSettings {
    /// Layers the variables `lookup` yields and the env file over these
    /// settings.
    ///
    /// Called per request so a token rotated in the environment is picked
    /// up without a restart.
    pub fn resolved_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = self.clone();
        settings.apply_overrides(lookup);

        if settings.is_missing_any() {
            if let Some(path) = settings.env_file.clone() {
                if path.exists() {
                    let vars = read_env_file(&path)?;
                    debug!("Filling Genie settings from {}", path.display());
                    settings.fill_missing(|key| vars.get(key).cloned());
                }
            }
        }

        Ok(settings)
    }

    /// Replaces fields with any non-blank value `lookup` yields.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = non_blank(lookup(HOST_ENV)) {
            self.host = Some(host);
        }
        if let Some(token) = non_blank(lookup(TOKEN_ENV)) {
            self.token = Some(token);
        }
        if let Some(space_id) = non_blank(lookup(SPACE_ID_ENV)) {
            self.space_id = Some(space_id);
        }
    }

    /// Sets only the fields that are still blank.
    pub fn fill_missing(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if non_blank(self.host.clone()).is_none() {
            self.host = non_blank(lookup(HOST_ENV));
        }
        if non_blank(self.token.clone()).is_none() {
            self.token = non_blank(lookup(TOKEN_ENV));
        }
        if non_blank(self.space_id.clone()).is_none() {
            self.space_id = non_blank(lookup(SPACE_ID_ENV));
        }
    }

    fn is_missing_any(&self) -> bool {
        [&self.host, &self.token, &self.space_id]
            .iter()
            .any(|value| non_blank((*value).clone()).is_none())
    }

    /// Host without trailing slashes, if one is set.
    pub fn normalized_host(&self) -> Option<String> {
        non_blank(self.host.clone()).map(|host| host.trim_end_matches('/').to_string())
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Checks that host, token and space are all present.
    pub fn credentials(&self) -> Result<GenieCredentials> {
        let space_id = non_blank(self.space_id.clone()).ok_or_else(|| {
            FleetError::ConfigError(format!(
                "Genie Space ID not configured. Please set {}.",
                SPACE_ID_ENV
            ))
        })?;

        let host = self.normalized_host().filter(|host| !host.is_empty());
        let token = non_blank(self.token.clone());
        match (host, token) {
            (Some(host), Some(token)) => Ok(GenieCredentials {
                host,
                token,
                space_id,
            }),
            (host, token) => {
                debug!(
                    "Missing auth - host: {}, token: {}",
                    host.is_some(),
                    token.is_some()
                );
                Err(FleetError::ConfigError(
                    "Authentication not configured properly.".to_string(),
                ))
            }
        }
    }
}

/// Reads a variable from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_filename_iter(path).map_err(|e| {
        FleetError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    iter.map(|item| {
        item.map_err(|e| {
            FleetError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    })
    .collect()
}
