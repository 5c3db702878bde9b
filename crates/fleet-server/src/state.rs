use std::sync::Arc;

use fleet_config::{process_env, AppConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Source of credential variables such as `DATABRICKS_TOKEN`.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Shared application state, injected into route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub env: EnvLookup,
}

impl AppState {
    /// State reading credentials from the process environment.
    pub fn new(config: AppConfig) -> Self {
        Self::with_env(config, Arc::new(process_env))
    }

    pub fn with_env(config: AppConfig, env: EnvLookup) -> Self {
        Self {
            config: Arc::new(config),
            env,
        }
    }

    pub fn lookup_env(&self, key: &str) -> Option<String> {
        (self.env)(key)
    }

    /// RNG for one request's worth of fleet data; repeatable when a seed is
    /// configured.
    pub fn fleet_rng(&self) -> StdRng {
        match self.config.fleet.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
