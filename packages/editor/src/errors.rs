//! Error types for the editor

use scribe_dom::DomError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Plugin '{plugin}' depends on '{dependency}', which is not registered")]
    UnresolvedDependency {
        plugin: String,
        dependency: String,
    },

    #[error("Dependency cycle between plugins: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Plugin '{0}' is registered twice")]
    DuplicatePlugin(String),

    #[error("Plugin '{plugin}' contributed a {found} to {key}, which expects a {expected}")]
    InvalidContribution {
        plugin: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No selection inside the editable root")]
    NoSelection,

    #[error("Editor has been destroyed")]
    Destroyed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
