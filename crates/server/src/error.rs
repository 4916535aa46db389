use catalog::CatalogError;
use sources::UnknownSection;

/// Errors surfaced by the orchestrator's fallible entry points
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    UnknownSection(#[from] UnknownSection),

    #[error("Invalid rating {value} for movie {movie_id}: must be 1 to 5")]
    InvalidRating { movie_id: String, value: u8 },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load config: {0}")]
    Config(#[from] envy::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
