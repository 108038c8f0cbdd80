//! Boundary: the process-wide development/production flag.
//!
//! Validation and mutation guarding only run outside production. The flag is
//! read once per model construction; flipping it later never affects models
//! that already exist.
//!
//! The initial value comes from `VIGIL_ENV` the first time it is read.
//! [`Environment::set_current`] replaces it explicitly (the config loader does
//! this when `VIGIL_ENV` is unset).

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

pub const ENV_VAR: &str = "VIGIL_ENV";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

static PRODUCTION: LazyLock<AtomicBool> =
    LazyLock::new(|| AtomicBool::new(Environment::from_env_var().is_production()));

impl Environment {
    /// Parse an environment name. Only `production`/`prod` select production.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Environment named by `VIGIL_ENV`, development when unset.
    #[must_use]
    pub fn from_env_var() -> Self {
        std::env::var(ENV_VAR).map_or(Environment::Development, |raw| Self::parse(&raw))
    }

    /// Whether `VIGIL_ENV` is set at all.
    #[must_use]
    pub fn env_var_is_set() -> bool {
        std::env::var_os(ENV_VAR).is_some()
    }

    #[must_use]
    pub fn current() -> Self {
        if PRODUCTION.load(Ordering::Acquire) {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn set_current(env: Self) {
        PRODUCTION.store(env.is_production(), Ordering::Release);
        tracing::debug!(environment = env.as_str(), "environment flag set");
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}
