//! Document model errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
