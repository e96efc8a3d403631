//! LSP schema types.
//!
//! Hand-written serde shapes for the slice of the protocol this server
//! speaks. Wire names are camelCase; optional members are omitted rather
//! than serialized as null, matching what editors expect.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::messages::RequestId;

// ── positions ──────────────────────────────────────────────────────

/// Zero-based line and UTF-16 code-unit column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open `[start, end)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    #[serde(rename = "newText")]
    pub new_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<HashMap<Url, Vec<TextEdit>>>,
}

// ── text document identifiers & sync ───────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocumentIdentifier {
    pub uri: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedTextDocumentIdentifier {
    pub uri: Url,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocumentItem {
    pub uri: Url,
    #[serde(rename = "languageId")]
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidOpenParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentItem,
}

/// One change in a didChange batch: a ranged replacement, or a whole-buffer
/// replacement when `range` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidChangeParams {
    #[serde(rename = "textDocument")]
    pub text_document: VersionedTextDocumentIdentifier,
    #[serde(rename = "contentChanges")]
    pub content_changes: Vec<ContentChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidCloseParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WillSaveParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    pub reason: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidSaveParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextDocumentPositionParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
}

// ── diagnostics ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl From<DiagnosticSeverity> for u8 {
    fn from(s: DiagnosticSeverity) -> u8 {
        s as u8
    }
}

impl TryFrom<u8> for DiagnosticSeverity {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            1 => Ok(Self::Error),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Information),
            4 => Ok(Self::Hint),
            other => Err(format!("diagnostic severity out of range: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosticSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishDiagnosticsParams {
    pub uri: Url,
    pub diagnostics: Vec<Diagnostic>,
}

// ── completion ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CompletionItemKind {
    Text = 1,
    Method = 2,
    Function = 3,
    Constructor = 4,
    Field = 5,
    Variable = 6,
    Class = 7,
    Interface = 8,
    Module = 9,
    Property = 10,
    Unit = 11,
    Value = 12,
    Enum = 13,
    Keyword = 14,
    Snippet = 15,
    Color = 16,
    File = 17,
    Reference = 18,
    Folder = 19,
    EnumMember = 20,
    Constant = 21,
    Struct = 22,
    Event = 23,
    Operator = 24,
    TypeParameter = 25,
}

impl From<CompletionItemKind> for u8 {
    fn from(k: CompletionItemKind) -> u8 {
        k as u8
    }
}

impl TryFrom<u8> for CompletionItemKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        if (1..=25).contains(&v) {
            Ok(match v {
                1 => Self::Text,
                2 => Self::Method,
                3 => Self::Function,
                4 => Self::Constructor,
                5 => Self::Field,
                6 => Self::Variable,
                7 => Self::Class,
                8 => Self::Interface,
                9 => Self::Module,
                10 => Self::Property,
                11 => Self::Unit,
                12 => Self::Value,
                13 => Self::Enum,
                14 => Self::Keyword,
                15 => Self::Snippet,
                16 => Self::Color,
                17 => Self::File,
                18 => Self::Reference,
                19 => Self::Folder,
                20 => Self::EnumMember,
                21 => Self::Constant,
                22 => Self::Struct,
                23 => Self::Event,
                24 => Self::Operator,
                _ => Self::TypeParameter,
            })
        } else {
            Err(format!("completion item kind out of range: {v}"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InsertTextFormat {
    PlainText = 1,
    Snippet = 2,
}

impl From<InsertTextFormat> for u8 {
    fn from(f: InsertTextFormat) -> u8 {
        f as u8
    }
}

impl TryFrom<u8> for InsertTextFormat {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            1 => Ok(Self::PlainText),
            2 => Ok(Self::Snippet),
            other => Err(format!("insert text format out of range: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CompletionItemKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "filterText", skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    #[serde(rename = "insertText", skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(rename = "insertTextFormat", skip_serializing_if = "Option::is_none")]
    pub insert_text_format: Option<InsertTextFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionList {
    #[serde(rename = "isIncomplete")]
    pub is_incomplete: bool,
    pub items: Vec<CompletionItem>,
}

// ── hover ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupKind {
    #[serde(rename = "plaintext")]
    PlainText,
    #[serde(rename = "markdown")]
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupContent {
    pub kind: MarkupKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    pub contents: MarkupContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

// ── symbols ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SymbolKind {
    File = 1,
    Module = 2,
    Namespace = 3,
    Package = 4,
    Class = 5,
    Method = 6,
    Property = 7,
    Field = 8,
    Constructor = 9,
    Enum = 10,
    Interface = 11,
    Function = 12,
    Variable = 13,
    Constant = 14,
    String = 15,
    Number = 16,
    Boolean = 17,
    Array = 18,
    Object = 19,
    Key = 20,
    Null = 21,
    EnumMember = 22,
    Struct = 23,
    Event = 24,
    Operator = 25,
    TypeParameter = 26,
}

impl From<SymbolKind> for u8 {
    fn from(k: SymbolKind) -> u8 {
        k as u8
    }
}

impl TryFrom<u8> for SymbolKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        if (1..=26).contains(&v) {
            Ok(match v {
                1 => Self::File,
                2 => Self::Module,
                3 => Self::Namespace,
                4 => Self::Package,
                5 => Self::Class,
                6 => Self::Method,
                7 => Self::Property,
                8 => Self::Field,
                9 => Self::Constructor,
                10 => Self::Enum,
                11 => Self::Interface,
                12 => Self::Function,
                13 => Self::Variable,
                14 => Self::Constant,
                15 => Self::String,
                16 => Self::Number,
                17 => Self::Boolean,
                18 => Self::Array,
                19 => Self::Object,
                20 => Self::Key,
                21 => Self::Null,
                22 => Self::EnumMember,
                23 => Self::Struct,
                24 => Self::Event,
                25 => Self::Operator,
                _ => Self::TypeParameter,
            })
        } else {
            Err(format!("symbol kind out of range: {v}"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: Range,
    #[serde(rename = "selectionRange")]
    pub selection_range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DocumentSymbol>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSymbolParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

/// Reply to the cursor-level symbol query (`textDocument/symbolInfo`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,
}

// ── document highlight ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DocumentHighlightKind {
    Text = 1,
    Read = 2,
    Write = 3,
}

impl From<DocumentHighlightKind> for u8 {
    fn from(k: DocumentHighlightKind) -> u8 {
        k as u8
    }
}

impl TryFrom<u8> for DocumentHighlightKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            1 => Ok(Self::Text),
            2 => Ok(Self::Read),
            3 => Ok(Self::Write),
            other => Err(format!("highlight kind out of range: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHighlight {
    pub range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentHighlightKind>,
}

// ── folding ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoldingRangeKind {
    #[serde(rename = "comment")]
    Comment,
    #[serde(rename = "imports")]
    Imports,
    #[serde(rename = "region")]
    Region,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldingRange {
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "startCharacter", skip_serializing_if = "Option::is_none")]
    pub start_character: Option<u32>,
    #[serde(rename = "endLine")]
    pub end_line: u32,
    #[serde(rename = "endCharacter", skip_serializing_if = "Option::is_none")]
    pub end_character: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FoldingRangeKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldingRangeParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

// ── commands & code actions ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub title: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Value>>,
}

/// Code action kind, an open-ended dotted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeActionKind(String);

impl CodeActionKind {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    #[must_use]
    pub fn refactor() -> Self {
        Self::new("refactor")
    }

    #[must_use]
    pub fn quick_fix() -> Self {
        Self::new("quickfix")
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAction {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CodeActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<WorkspaceEdit>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeActionContext {
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<CodeActionKind>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeActionParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    pub range: Range,
    #[serde(default)]
    pub context: CodeActionContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteCommandParams {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Value>>,
}

// ── initialize & capabilities ──────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "processId")]
    pub process_id: Option<i64>,
    #[serde(rename = "rootUri")]
    pub root_uri: Option<Url>,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientCapabilities {
    #[serde(rename = "textDocument")]
    pub text_document: Option<TextDocumentClientCapabilities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextDocumentClientCapabilities {
    #[serde(rename = "codeAction")]
    pub code_action: Option<CodeActionClientCapabilities>,
    #[serde(rename = "foldingRange")]
    pub folding_range: Option<FoldingRangeClientCapabilities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeActionClientCapabilities {
    #[serde(rename = "codeActionLiteralSupport")]
    pub code_action_literal_support: Option<CodeActionLiteralSupport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeActionLiteralSupport {
    #[serde(rename = "codeActionKind")]
    pub code_action_kind: CodeActionKindCapability,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeActionKindCapability {
    #[serde(rename = "valueSet", default)]
    pub value_set: Vec<CodeActionKind>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FoldingRangeClientCapabilities {
    #[serde(rename = "rangeLimit")]
    pub range_limit: Option<u32>,
    #[serde(rename = "lineFoldingOnly")]
    pub line_folding_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    #[serde(rename = "textDocumentSync")]
    pub text_document_sync: TextDocumentSyncOptions,
    #[serde(rename = "completionProvider")]
    pub completion_provider: CompletionOptions,
    #[serde(rename = "hoverProvider")]
    pub hover_provider: bool,
    #[serde(rename = "documentHighlightProvider")]
    pub document_highlight_provider: bool,
    #[serde(rename = "foldingRangeProvider")]
    pub folding_range_provider: bool,
    #[serde(rename = "documentSymbolProvider")]
    pub document_symbol_provider: bool,
    #[serde(rename = "codeActionProvider")]
    pub code_action_provider: CodeActionOptions,
    #[serde(rename = "executeCommandProvider")]
    pub execute_command_provider: ExecuteCommandOptions,
}

/// Incremental sync: the client sends ranged deltas, not whole buffers.
pub const SYNC_INCREMENTAL: u8 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct TextDocumentSyncOptions {
    #[serde(rename = "openClose")]
    pub open_close: bool,
    pub change: u8,
    #[serde(rename = "willSave")]
    pub will_save: bool,
    #[serde(rename = "willSaveWaitUntil")]
    pub will_save_wait_until: bool,
    pub save: SaveOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOptions {
    #[serde(rename = "includeText")]
    pub include_text: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionOptions {
    #[serde(rename = "resolveProvider")]
    pub resolve_provider: bool,
    #[serde(rename = "triggerCharacters")]
    pub trigger_characters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeActionOptions {
    #[serde(rename = "codeActionKinds")]
    pub code_action_kinds: Vec<CodeActionKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteCommandOptions {
    pub commands: Vec<String>,
}

// ── cancellation ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelParams {
    pub id: RequestId,
}
