// Conversation history: the ordered list of turns sent as context with
// every request. Types serialize directly into the remote API's `contents`
// shape so the client does not need a second set of wire structs.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Reference to a file already uploaded to the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub mime_type: String,
    #[serde(rename = "fileUri")]
    pub uri: String,
}

/// One unit of turn content. Serializes as `{"text": ..}` or
/// `{"fileData": {"mimeType": .., "fileUri": ..}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "fileData")]
    FileReference(FileReference),
}

/// A role-tagged contribution. Fields are private so a turn cannot change
/// after it has been appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
}

impl Turn {
    pub fn user(parts: Vec<Part>) -> Self {
        Turn { role: Role::User, parts }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Concatenated text parts, ignoring file references.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::FileReference(_) => None,
            })
            .collect()
    }
}

/// Append-only record of the current run's turns.
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_serializes_as_content() {
        let turn = Turn::user(vec![
            Part::Text("what is this?".into()),
            Part::FileReference(FileReference {
                mime_type: "image/png".into(),
                uri: "https://example.invalid/files/abc".into(),
            }),
        ]);
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({
                "role": "user",
                "parts": [
                    {"text": "what is this?"},
                    {"fileData": {"mimeType": "image/png", "fileUri": "https://example.invalid/files/abc"}}
                ]
            })
        );
    }

    #[test]
    fn model_turn_is_single_text_part() {
        let turn = Turn::model("hello");
        assert_eq!(turn.role(), Role::Model);
        assert_eq!(turn.parts(), &[Part::Text("hello".into())]);
        assert_eq!(serde_json::to_value(&turn).unwrap()["role"], "model");
    }

    #[test]
    fn text_skips_file_parts() {
        let turn = Turn::user(vec![
            Part::Text("a".into()),
            Part::FileReference(FileReference {
                mime_type: "audio/wav".into(),
                uri: "u".into(),
            }),
            Part::Text("b".into()),
        ]);
        assert_eq!(turn.text(), "ab");
    }

    #[test]
    fn history_preserves_insertion_order() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());
        history.push(Turn::user(vec![Part::Text("q".into())]));
        history.push(Turn::model("a"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].role(), Role::User);
        assert_eq!(history.turns().last().map(Turn::role), Some(Role::Model));
    }
}
