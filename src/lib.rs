// Library root
// ------------
// This crate exposes the pieces of the interactive chat client so the
// binary (`main.rs`) stays a thin wiring layer and the loop can be tested
// with scripted collaborators.
//
// Module responsibilities:
// - `config`: API key, model and sampling parameters read from the environment.
// - `history`: turns and parts of the running conversation.
// - `attachment`: extension-based MIME classification and file upload.
// - `api`: blocking HTTP client for content generation and file upload.
// - `ui`: terminal prompts, spinner and markdown output.
// - `session`: the turn-taking loop tying everything together.
// - `error`: error types shared by the modules above.
pub mod api;
pub mod attachment;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod ui;
