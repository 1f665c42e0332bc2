use matselect::engine::config::EngineConfig;
use matselect::engine::request::RecommendationRequest;
use std::path::PathBuf;

/// Fully merged settings for a `recommend` or `tradeoffs` run.
pub struct AppConfig {
    pub candidates: PathBuf,
    pub engine: EngineConfig,
    pub request: RecommendationRequest,
    pub json: bool,
}
