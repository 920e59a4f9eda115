// Session loop: the read / attach / send / display cycle. One turn is in
// flight at a time and every remote failure is contained to its turn.

use tracing::{error, warn};

use crate::api::ChatBackend;
use crate::attachment::{self, AttachmentCandidate, FileUploader};
use crate::error::{AttachmentError, PromptError};
use crate::history::{ConversationHistory, FileReference, Part, Turn};
use crate::ui::{Console, Prompter};

pub const CONTINUE_PROMPT: &str = "Do you want to continue?";
pub const QUESTION_PROMPT: &str = "Enter a description or question:";
pub const ATTACH_PROMPT: &str = "Do you want to upload a file?";
pub const PATH_PROMPT: &str = "Enter a file path: ";
pub const RESULT_PROMPT: &str = "AI Response (edit or close):";
pub const FAREWELL: &str = "GOOD DAY!!";

/// Where the loop is, along with whatever the next step needs.
#[derive(Debug, PartialEq, Eq)]
pub enum State {
    AwaitContinue,
    ComposeTurn,
    ResolveAttachment(Vec<Part>),
    Send(Vec<Part>),
    DisplayResult(String),
    Ended,
}

/// Drives turns until the operator declines to continue.
///
/// Prompt failures at the continue, question and attach-confirm steps are
/// returned to the caller; everything else is logged and the loop goes on.
pub struct ChatSession<B, U, P, C> {
    backend: B,
    uploader: U,
    prompter: P,
    console: C,
    history: ConversationHistory,
}

impl<B, U, P, C> ChatSession<B, U, P, C>
where
    B: ChatBackend,
    U: FileUploader,
    P: Prompter,
    C: Console,
{
    pub fn new(backend: B, uploader: U, prompter: P, console: C) -> Self {
        ChatSession {
            backend,
            uploader,
            prompter,
            console,
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run until `State::Ended`.
    pub fn run(&mut self) -> Result<(), PromptError> {
        let mut state = State::AwaitContinue;
        while state != State::Ended {
            state = self.step(state)?;
        }
        Ok(())
    }

    /// Perform one transition.
    pub fn step(&mut self, state: State) -> Result<State, PromptError> {
        let next = match state {
            State::AwaitContinue => {
                if self.prompter.confirm(CONTINUE_PROMPT)? {
                    State::ComposeTurn
                } else {
                    self.console.notice(FAREWELL);
                    State::Ended
                }
            }
            State::ComposeTurn => {
                let question = self.prompter.edit_text(QUESTION_PROMPT, None)?;
                let parts = vec![Part::Text(question)];
                if self.prompter.confirm(ATTACH_PROMPT)? {
                    State::ResolveAttachment(parts)
                } else {
                    State::Send(parts)
                }
            }
            State::ResolveAttachment(mut parts) => {
                match self.resolve_attachment() {
                    Ok(reference) => parts.push(Part::FileReference(reference)),
                    Err(err) => error!("File upload failed: {err}"),
                }
                State::Send(parts)
            }
            State::Send(parts) => self.send(parts),
            State::DisplayResult(reply) => {
                self.display(&reply);
                State::AwaitContinue
            }
            State::Ended => State::Ended,
        };
        Ok(next)
    }

    fn resolve_attachment(&mut self) -> Result<FileReference, AttachmentError> {
        let raw = self.prompter.input_line(PATH_PROMPT)?;
        let candidate = AttachmentCandidate::from_input(&raw);
        attachment::upload(&self.uploader, &candidate)
    }

    fn send(&mut self, parts: Vec<Part>) -> State {
        self.history.push(Turn::user(parts));
        let Some((message, context)) = self.history.turns().split_last() else {
            return State::AwaitContinue;
        };
        match self.backend.send(context, message) {
            Ok(reply) => {
                self.history.push(Turn::model(reply.clone()));
                State::DisplayResult(reply)
            }
            Err(err) => {
                error!("Error generating content: {err}");
                State::AwaitContinue
            }
        }
    }

    fn display(&mut self, reply: &str) {
        match self.prompter.edit_text(RESULT_PROMPT, Some(reply)) {
            Ok(_) => self.console.notice("Editor closed."),
            Err(PromptError::NotInteractive) => {
                warn!("Editor couldn't be opened in this environment.");
                self.console.render_markdown(reply);
            }
            Err(PromptError::Cancelled) => self.console.notice("Editor cancelled by user."),
            Err(err) => error!("Error with editor: {err}"),
        }
    }
}
