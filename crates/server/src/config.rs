use serde::Deserialize;
use std::path::PathBuf;

use crate::error::EngineError;

/// Engine configuration loaded from `RECS_*` environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory holding users.dat, movies.dat and ratings.dat. Unset means offline.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Where `generate-file` writes the bulk export
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Page size when a caller gives none
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// `generate_more` fetches `limit * overfetch_factor` before filtering
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("homeRecommendations.json")
}

fn default_limit() -> usize {
    10
}

fn default_overfetch_factor() -> usize {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            output_path: default_output_path(),
            default_limit: default_limit(),
            overfetch_factor: default_overfetch_factor(),
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "RECS_";

    /// Load configuration from the environment (and a `.env` file, if present)
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: EngineConfig = envy::prefixed(Self::ENV_PREFIX).from_iter(vars)?;
        if config.overfetch_factor == 0 {
            return Err(EngineError::InvalidConfig(
                "RECS_OVERFETCH_FACTOR must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
