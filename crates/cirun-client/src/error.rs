//! Cirun client error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CirunError {
    #[error("Could not find {0} in environment variables")]
    CredentialsMissing(&'static str),

    #[error("Unable to read key file {path}: {source}")]
    KeyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key file: {path}")]
    InvalidKeyFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid repository name '{0}', expected <owner>/<name>")]
    InvalidRepository(String),

    #[error("Invalid API endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Cirun API request failed with status code {status}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    #[error("GitHub API request failed with status code {status}")]
    Github {
        status: u16,
        body: serde_json::Value,
    },

    #[error(
        "Environment variable '{var}' not found. Unable to install Cirun GitHub App on {repository}"
    )]
    GithubTokenMissing {
        var: &'static str,
        repository: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CirunError {
    /// HTTP status of a failed API exchange, if this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Github { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CirunError>;
