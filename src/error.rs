// src/error.rs
// =============================================================================
// Error types for the digest pipeline.
//
// There are four ways an analysis can fail as a whole:
// - Validation:  the caller gave us an empty owner or repo name
// - NotFound:    GitHub says the repository doesn't exist (or is private)
// - RateLimited: the API quota is used up
// - Upstream:    anything else that went wrong talking to GitHub
//
// A failure to fetch ONE file's content is not an error at this level. It is
// recorded next to that file in the digest (see digest::ContentResult).
//
// Rust concepts:
// - thiserror: derive macro that implements std::error::Error for us
// - Serialize: so the binary can print the `{message, error}` JSON body
// =============================================================================

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Missing owner or repository name
    #[error("{0}")]
    Validation(String),

    /// Repository absent or private
    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    /// Network failure, non-2xx status or unexpected response shape
    #[error("{context}: {source_message}")]
    Upstream {
        context: String,
        source_message: String,
    },
}

impl DigestError {
    pub fn upstream<E: std::fmt::Display>(context: &str, e: E) -> Self {
        Self::Upstream {
            context: context.to_string(),
            source_message: e.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Short, user-facing summary (the `message` field of the JSON body)
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => {
                "Repository not found. Check that the URL is correct and the repository is public."
                    .to_string()
            }
            Self::RateLimited => "GitHub API rate limit exceeded. Please wait an hour before trying again or use --mode direct."
                .to_string(),
            Self::Upstream { .. } => "Failed to analyze repository".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let error = match self {
            Self::Validation(_) => None,
            _ => Some(self.to_string()),
        };
        ErrorResponse {
            message: self.message(),
            error,
        }
    }
}

/// Body returned to callers when an analysis fails
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
