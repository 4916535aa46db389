//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the orchestrator that assembles the collaborative,
//! content-based and genre sections of a response, along with the engine
//! configuration and the bulk JSON export.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod response;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{RatingUpdate, RecommendationOrchestrator, UserProfile};
pub use response::{GenreSections, MAX_GENRE_SECTIONS, RecommendationSet};
