//! Server-side commands.
//!
//! Commands the server itself executes carry the reserved `swift.lsp.`
//! prefix. A command's serialized form is always a single dictionary
//! argument holding its fields; the client round-trips it opaquely.
//! Decoding requires the full identifier to match, the first argument to
//! be a dictionary, and the dictionary to satisfy the command's schema;
//! any failure means "not this command".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use swiftls_protocol::types::{Command, TextDocumentIdentifier};

/// Prefix reserved for server-handled command identifiers.
pub const COMMAND_PREFIX: &str = "swift.lsp.";

/// Full identifier of [`SemanticRefactorCommand`].
pub const SEMANTIC_REFACTOR_COMMAND: &str = "swift.lsp.semantic.refactor.command";

#[must_use]
pub fn is_server_command(identifier: &str) -> bool {
    identifier.starts_with(COMMAND_PREFIX)
}

/// Arguments of a semantic refactoring, produced by the code-action
/// layer and consumed by `workspace/executeCommand`. `line` and `column`
/// are 0-based LSP coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRefactorCommand {
    pub title: String,
    #[serde(rename = "actionString")]
    pub action_string: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

impl SemanticRefactorCommand {
    /// The command envelope: full identifier, fields in one dictionary.
    #[must_use]
    pub fn as_command(&self) -> Command {
        Command {
            title: self.title.clone(),
            command: SEMANTIC_REFACTOR_COMMAND.to_string(),
            arguments: Some(vec![
                serde_json::to_value(self).expect("command fields are plain data"),
            ]),
        }
    }

    #[must_use]
    pub fn from_command(command: &Command) -> Option<Self> {
        if command.command != SEMANTIC_REFACTOR_COMMAND {
            return None;
        }
        let first = command.arguments.as_ref()?.first()?;
        if !first.is_object() {
            return None;
        }
        serde_json::from_value(first.clone()).ok()
    }
}

/// A decoded `workspace/executeCommand` invocation: one arm per known
/// command, plus the identifiers this server does not recognize.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCommand {
    SemanticRefactor(SemanticRefactorCommand),
    Unknown(String),
}

impl ServerCommand {
    #[must_use]
    pub fn decode(identifier: &str, arguments: Option<&[Value]>) -> Self {
        if identifier == SEMANTIC_REFACTOR_COMMAND
            && let Some(first) = arguments.and_then(<[Value]>::first)
            && first.is_object()
            && let Ok(command) = serde_json::from_value(first.clone())
        {
            return Self::SemanticRefactor(command);
        }
        Self::Unknown(identifier.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn refactor() -> SemanticRefactorCommand {
        SemanticRefactorCommand {
            title: "Localize String".to_string(),
            action_string: "source.refactoring.kind.localize.string".to_string(),
            line: 1,
            column: 11,
            length: 0,
            text_document: TextDocumentIdentifier {
                uri: "file:///a.swift".parse().unwrap(),
            },
        }
    }

    #[test]
    fn test_identifier_carries_reserved_prefix() {
        assert!(SEMANTIC_REFACTOR_COMMAND.starts_with(COMMAND_PREFIX));
        assert!(is_server_command(SEMANTIC_REFACTOR_COMMAND));
        assert!(!is_server_command("editor.action.rename"));
    }

    #[test]
    fn test_as_command_envelope_shape() {
        let cmd = refactor().as_command();
        assert_eq!(cmd.title, "Localize String");
        assert_eq!(cmd.command, "swift.lsp.semantic.refactor.command");
        let args = cmd.arguments.unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(
            args[0],
            json!({
                "title": "Localize String",
                "actionString": "source.refactoring.kind.localize.string",
                "line": 1,
                "column": 11,
                "length": 0,
                "textDocument": { "uri": "file:///a.swift" }
            })
        );
    }

    #[test]
    fn test_roundtrip_through_command() {
        let original = refactor();
        let decoded = SemanticRefactorCommand::from_command(&original.as_command()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_from_command_rejects_other_identifier() {
        let mut cmd = refactor().as_command();
        cmd.command = "swift.lsp.other".to_string();
        assert!(SemanticRefactorCommand::from_command(&cmd).is_none());
    }

    #[test]
    fn test_from_command_rejects_non_dictionary_argument() {
        let mut cmd = refactor().as_command();
        cmd.arguments = Some(vec![json!("not a dict")]);
        assert!(SemanticRefactorCommand::from_command(&cmd).is_none());
    }

    #[test]
    fn test_from_command_rejects_missing_arguments() {
        let mut cmd = refactor().as_command();
        cmd.arguments = None;
        assert!(SemanticRefactorCommand::from_command(&cmd).is_none());
    }

    #[test]
    fn test_from_command_rejects_schema_mismatch() {
        let mut cmd = refactor().as_command();
        cmd.arguments = Some(vec![json!({ "title": "x" })]);
        assert!(SemanticRefactorCommand::from_command(&cmd).is_none());
    }

    #[test]
    fn test_decode_known_command() {
        let envelope = refactor().as_command();
        let decoded = ServerCommand::decode(&envelope.command, envelope.arguments.as_deref());
        assert_eq!(decoded, ServerCommand::SemanticRefactor(refactor()));
    }

    #[test]
    fn test_decode_unknown_command() {
        let decoded = ServerCommand::decode("swift.lsp.not.a.thing", None);
        assert_eq!(decoded, ServerCommand::Unknown("swift.lsp.not.a.thing".to_string()));
    }

    #[test]
    fn test_decode_bad_arguments_is_unknown() {
        let decoded = ServerCommand::decode(SEMANTIC_REFACTOR_COMMAND, Some(&[json!(42)]));
        assert_eq!(
            decoded,
            ServerCommand::Unknown(SEMANTIC_REFACTOR_COMMAND.to_string())
        );
    }
}
