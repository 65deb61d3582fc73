//! Provisioning error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{tool} not found. Please install it: {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("{tool} is not authenticated: {hint}")]
    NotAuthenticated { tool: String, hint: String },

    #[error("{tool} command failed: {stderr}")]
    CommandFailed { tool: String, stderr: String },

    #[error("Unexpected output from {tool}: {detail}")]
    UnexpectedOutput { tool: String, detail: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Aborted: no changes were made")]
    Aborted,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cirun error: {0}")]
    Client(#[from] cirun_client::CirunError),
}

pub type Result<T> = std::result::Result<T, CloudError>;
