// API client module: a small blocking HTTP client for the generative
// language REST API. It covers the two remote capabilities the chat loop
// needs: generating a reply for a conversation and uploading a media file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::attachment::{FileUploader, UploadedFile};
use crate::config::{ApiKey, Config, GenerationConfig};
use crate::error::{AttachmentError, SendError};
use crate::history::Turn;
use crate::ui;

/// Sends a new message together with the conversation that precedes it.
pub trait ChatBackend {
    /// `context` holds every earlier turn; `message` is the user turn being
    /// sent. Returns the model's reply text.
    fn send(&self, context: &[Turn], message: &Turn) -> Result<String, SendError>;
}

impl<T: ChatBackend + ?Sized> ChatBackend for &T {
    fn send(&self, context: &[Turn], message: &Turn) -> Result<String, SendError> {
        (**self).send(context, message)
    }
}

/// Blocking client holding the HTTP client, endpoint, model and sampling
/// parameters for one run.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: ApiKey,
    model: String,
    generation: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<&'a Turn>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

impl GenerateContentResponse {
    /// Text of the first candidate, mirroring how the reply is presented.
    fn into_text(self) -> Result<String, SendError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => SendError::Blocked(reason),
                None => SendError::EmptyResponse,
            });
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        match candidate.finish_reason.as_deref() {
            Some(reason) if text.is_empty() && reason != "STOP" && reason != "MAX_TOKENS" => {
                Err(SendError::Blocked(reason.to_string()))
            }
            _ => Ok(text),
        }
    }
}

impl GeminiClient {
    /// Build a client from the run's configuration. Requests have no client
    /// side timeout: long replies can take minutes.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Option::<Duration>::None)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(GeminiClient {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            generation: config.generation.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST the full conversation to `models/{model}:generateContent`.
    pub fn generate_content(&self, context: &[Turn], message: &Turn) -> Result<String, SendError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let body = GenerateContentRequest {
            contents: context.iter().chain(std::iter::once(message)).collect(),
            generation_config: &self.generation,
        };
        debug!(turns = body.contents.len(), model = %self.model, "sending conversation");
        let res = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose())])
            .json(&body)
            .send()?;
        if !res.status().is_success() {
            let (status, body) = failure(res);
            return Err(SendError::Status { status, body });
        }
        let parsed: GenerateContentResponse = res.json()?;
        parsed.into_text()
    }

    /// Upload a local file with the resumable protocol: one request opens the
    /// session and returns an upload URL, a second sends the bytes and
    /// finalizes.
    pub fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AttachmentError> {
        let bytes = fs::read(path).map_err(|source| AttachmentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let url = format!("{}/upload/v1beta/files", self.api_base);
        debug!(bytes = bytes.len(), %mime_type, "starting upload session");

        let start = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()?;
        if !start.status().is_success() {
            let (status, body) = failure(start);
            return Err(AttachmentError::Status { status, body });
        }
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or(AttachmentError::MissingUploadUrl)?
            .to_string();

        let res = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()?;
        if !res.status().is_success() {
            let (status, body) = failure(res);
            return Err(AttachmentError::Status { status, body });
        }
        let uploaded: UploadResponse = res.json()?;
        Ok(uploaded.file)
    }
}

impl ChatBackend for GeminiClient {
    fn send(&self, context: &[Turn], message: &Turn) -> Result<String, SendError> {
        let spinner = ui::spinner("Waiting for the model...");
        let result = self.generate_content(context, message);
        spinner.finish_and_clear();
        result
    }
}

impl FileUploader for GeminiClient {
    fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AttachmentError> {
        let spinner = ui::spinner("Uploading...");
        let result = self.upload(path, mime_type, display_name);
        spinner.finish_and_clear();
        result
    }
}

/// Status code and body of an unsuccessful response.
fn failure(res: Response) -> (u16, String) {
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_else(|_| "".into());
    (status, body)
}
