// Entrypoint for the chat client.
// - Keeps `main` small: load config, build the API client and hand
//   everything to the session loop.
// - Returns `anyhow::Result` so startup failures print with context.

use anyhow::Context;
use gemini_chat::{
    api::GeminiClient,
    config::Config,
    session::ChatSession,
    ui::{DialoguerPrompter, TerminalConsole},
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,gemini_chat=info")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = GeminiClient::new(&config)?;
    tracing::debug!(model = client.model(), "starting chat session");

    // Blocks until the operator declines to continue.
    let mut session = ChatSession::new(
        &client,
        &client,
        DialoguerPrompter,
        TerminalConsole::new(),
    );
    session.run()?;
    Ok(())
}
