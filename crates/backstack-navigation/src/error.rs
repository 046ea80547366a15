use thiserror::Error;

use crate::Route;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("route `{0}` has not been registered")]
    UnknownRoute(Route),

    #[error("navigator `{0}` is already registered in this saved-state scope")]
    DuplicateNavigator(String),

    #[error("saved state for navigator `{name}` is malformed: {reason}")]
    MalformedState { name: String, reason: String },

    #[error("saved state encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = NavError> = std::result::Result<T, E>;
