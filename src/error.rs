use thiserror::Error;

/// Errors surfaced by the engine boundary.
///
/// Missing relationship endpoints and degenerate geometry are deliberately
/// not represented here: schemas are edited incrementally, so those cases
/// are handled by dropping the affected edge or box, never by failing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid schema model: {0}")]
    Schema(String),

    #[error("invalid config file: {0}")]
    Config(String),

    #[error("layout persistence failed")]
    Persist(#[from] std::io::Error),

    #[error("layout snapshot serialization failed")]
    Snapshot(#[from] serde_json::Error),
}
