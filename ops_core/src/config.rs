use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_RESOLVER_CONSTANTS: &str = include_str!("data/resolver_constants.json");

/// Environment variable that points at a replacement constants file.
pub const RESOLVER_CONSTANTS_ENV: &str = "OPS_RESOLVER_CONSTANTS_PATH";

/// Tunable numbers consumed by the action resolver.
///
/// Every field has a default, so a constants file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConstants {
    pub population_threshold: f64,
    pub population_exponent: f64,
    pub chaos_threshold: f64,
    pub difficulty_to_time_factor: f64,
    pub eff_agi_exponential_factor: f64,
    pub eff_dex_exponential_factor: f64,
    pub eff_agi_linear_factor: f64,
    pub eff_dex_linear_factor: f64,
    pub intelligence_bonus_weight: f64,
    pub team_bonus_exponent: f64,
    pub black_op_time_penalty: f64,
    pub contract_successes_per_level: f64,
    pub operation_successes_per_level: f64,
}

impl Default for ResolverConstants {
    fn default() -> Self {
        Self {
            population_threshold: 1e9,
            population_exponent: 0.7,
            chaos_threshold: 50.0,
            difficulty_to_time_factor: 10.0,
            eff_agi_exponential_factor: 0.04,
            eff_dex_exponential_factor: 0.035,
            eff_agi_linear_factor: 5e3,
            eff_dex_linear_factor: 5e3,
            intelligence_bonus_weight: 0.75,
            team_bonus_exponent: 0.05,
            black_op_time_penalty: 1.5,
            contract_successes_per_level: 3.0,
            operation_successes_per_level: 2.5,
        }
    }
}

impl ResolverConstants {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_RESOLVER_CONSTANTS)
                .expect("builtin resolver constants should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let constants: ResolverConstants = serde_json::from_str(json)?;
        constants.validate()?;
        Ok(constants)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let divisors = [
            ("population_threshold", self.population_threshold),
            ("difficulty_to_time_factor", self.difficulty_to_time_factor),
            ("eff_agi_linear_factor", self.eff_agi_linear_factor),
            ("eff_dex_linear_factor", self.eff_dex_linear_factor),
        ];
        for (field, value) in divisors {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse resolver constants: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read resolver constants from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resolver constant '{field}' must be a positive finite number, got {value}")]
    Invalid { field: &'static str, value: f64 },
}

/// Where the active constants came from.
#[derive(Debug, Clone)]
pub struct ResolverConstantsMetadata {
    path: Option<PathBuf>,
}

impl ResolverConstantsMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Load resolver constants from `OPS_RESOLVER_CONSTANTS_PATH`, falling back to
/// the builtin table when the variable is unset or the file is unusable.
pub fn load_resolver_constants_from_env() -> (Arc<ResolverConstants>, ResolverConstantsMetadata) {
    let override_path = env::var(RESOLVER_CONSTANTS_ENV).ok().map(PathBuf::from);

    if let Some(path) = override_path {
        match ResolverConstants::from_file(&path) {
            Ok(constants) => {
                tracing::info!(
                    target: "ops::config",
                    path = %path.display(),
                    "resolver_constants.loaded=file"
                );
                return (
                    Arc::new(constants),
                    ResolverConstantsMetadata::new(Some(path)),
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: "ops::config",
                    path = %path.display(),
                    error = %err,
                    "resolver_constants.load_failed"
                );
            }
        }
    }

    let constants = ResolverConstants::builtin();
    tracing::info!(target: "ops::config", "resolver_constants.loaded=builtin");
    (constants, ResolverConstantsMetadata::new(None))
}
