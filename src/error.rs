//! Error types for search and analysis.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Non-success response from the search endpoint. Carries the raw body text.
    #[error("GitHub API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// The request could not be sent or its body could not be read.
    #[error("GitHub request failed: {0}")]
    Transport(#[from] octocrab::Error),

    /// A success response whose body was not a search result page.
    #[error("Unexpected search response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The GitHub client could not be built.
    #[error("Failed to create GitHub client: {0}")]
    Client(String),
}
