// Error taxonomy. Attachment, send and display failures are contained at the
// turn level by the session loop. `ConfigError` stops startup, and prompt
// failures outside an attachment or display step end the loop; both reach
// `main`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY is not set; export it or add it to a .env file")]
    MissingApiKey,
}

/// Failure to turn a local path into an uploaded file reference.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload rejected: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("upload session did not return an upload URL")]
    MissingUploadUrl,
    #[error("could not read a file path: {0}")]
    Prompt(#[from] PromptError),
}

/// Failure of the remote conversational call.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned {status} - {body}")]
    Status { status: u16, body: String },
    #[error("model returned no candidates")]
    EmptyResponse,
    #[error("response blocked: {0}")]
    Blocked(String),
}

/// Failure of an interactive prompt or the result editor.
///
/// `NotInteractive` and `Cancelled` are kept apart from `Io` because the
/// display step falls back to plain printing only for the former.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no interactive terminal or editor available")]
    NotInteractive,
    #[error("cancelled by user")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PromptError {
    /// Sort a raw terminal error into the prompt taxonomy.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotConnected | io::ErrorKind::NotFound => PromptError::NotInteractive,
            io::ErrorKind::Interrupted => PromptError::Cancelled,
            _ => PromptError::Io(err),
        }
    }
}
