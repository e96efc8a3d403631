//! Code actions and the execution of the commands they produce.
//!
//! Providers are tagged with a kind and run concurrently; a provider
//! runs iff the request's `context.only` filter is absent or lists its
//! kind. The reply shape depends on the client: `CodeAction[]` literals
//! filtered by the advertised value set, or legacy `Command[]` with the
//! command extracted from each action.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use serde_json::Value as Json;

use swiftls_analyzer::{Value, tables};
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{
    CodeAction, CodeActionKind, CodeActionParams, Command, ExecuteCommandParams, Position, Range,
    TextEdit, WorkspaceEdit,
};

use crate::bridge::AnalyzerBridge;
use crate::commands::{SemanticRefactorCommand, ServerCommand};
use crate::dispatch::RequestContext;
use crate::server::ServerContext;

struct Provider {
    kind: CodeActionKind,
    run: fn(Arc<ServerContext>, CodeActionParams, RequestContext) -> BoxFuture<'static, Vec<CodeAction>>,
}

fn providers() -> Vec<Provider> {
    vec![Provider {
        kind: CodeActionKind::refactor(),
        run: |ctx, params, rc| semantic_refactor_actions(ctx, params, rc).boxed(),
    }]
}

pub async fn handle(
    ctx: Arc<ServerContext>,
    params: CodeActionParams,
    rc: RequestContext,
) -> Result<Json, ResponseError> {
    let only = params.context.only.clone();
    let selected: Vec<Provider> = providers()
        .into_iter()
        .filter(|provider| match &only {
            Some(kinds) => kinds.contains(&provider.kind),
            None => true,
        })
        .collect();

    let outputs = join_all(
        selected
            .into_iter()
            .map(|provider| (provider.run)(ctx.clone(), params.clone(), rc.clone())),
    )
    .await;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let actions: Vec<CodeAction> = outputs.into_iter().flatten().collect();
    let literal_kinds = ctx.client_view().code_action_literal_kinds;
    encode_actions(actions, literal_kinds.as_deref()).map_err(ResponseError::internal)
}

/// Serialize per client capability: literal `CodeAction[]` filtered by
/// the advertised value set (unspecified kinds always pass), or legacy
/// `Command[]` keeping only actions that carry a command.
pub(crate) fn encode_actions(
    actions: Vec<CodeAction>,
    literal_kinds: Option<&[CodeActionKind]>,
) -> Result<Json, serde_json::Error> {
    match literal_kinds {
        Some(value_set) => {
            let kept: Vec<CodeAction> = actions
                .into_iter()
                .filter(|action| {
                    action
                        .kind
                        .as_ref()
                        .is_none_or(|kind| value_set.contains(kind))
                })
                .collect();
            serde_json::to_value(kept)
        }
        None => {
            let commands: Vec<Command> =
                actions.into_iter().filter_map(|action| action.command).collect();
            serde_json::to_value(commands)
        }
    }
}

/// Ask the analyzer which refactorings apply at the cursor.
async fn semantic_refactor_actions(
    ctx: Arc<ServerContext>,
    params: CodeActionParams,
    rc: RequestContext,
) -> Vec<CodeAction> {
    let uri = params.text_document.uri.clone();
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "code action for unopened document");
        return Vec::new();
    };
    let table = snapshot.line_table();
    let Some(start) = table.utf8_offset(params.range.start.line, params.range.start.character)
    else {
        tracing::warn!(uri = %uri, "code action range out of range");
        return Vec::new();
    };
    let length = table
        .utf8_offset(params.range.end.line, params.range.end.character)
        .and_then(|end| end.checked_sub(start))
        .unwrap_or(0);

    let args = ctx.compile_args(&uri, snapshot.language());
    let request = AnalyzerBridge::cursor_info_request(uri.path(), start, args, true);
    let response = match ctx.bridge.request(request, Some(&rc.token)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(uri = %uri, "refactor discovery failed: {e}");
            return Vec::new();
        }
    };

    let k = &tables().keys;
    response
        .array(&k.refactor_actions)
        .unwrap_or_default()
        .iter()
        .filter_map(|action| {
            let title = action.string(&k.actionname)?.to_string();
            let action_string = action.uid(&k.actionuid)?.as_str().to_string();
            let command = SemanticRefactorCommand {
                title: title.clone(),
                action_string,
                line: params.range.start.line,
                column: params.range.start.character,
                length: u32::try_from(length).ok()?,
                text_document: params.text_document.clone(),
            };
            Some(CodeAction {
                title,
                kind: Some(CodeActionKind::refactor()),
                command: Some(command.as_command()),
                edit: None,
            })
        })
        .collect()
}

/// `workspace/executeCommand`: decode, run, reply with the translated
/// workspace edit.
pub async fn execute_command(
    ctx: Arc<ServerContext>,
    params: ExecuteCommandParams,
    rc: RequestContext,
) -> Result<Json, ResponseError> {
    match ServerCommand::decode(&params.command, params.arguments.as_deref()) {
        ServerCommand::SemanticRefactor(command) => {
            execute_semantic_refactor(ctx, command, rc).await
        }
        ServerCommand::Unknown(identifier) => {
            Err(ResponseError::invalid_params(format!("unknown command: {identifier}")))
        }
    }
}

async fn execute_semantic_refactor(
    ctx: Arc<ServerContext>,
    command: SemanticRefactorCommand,
    rc: RequestContext,
) -> Result<Json, ResponseError> {
    let uri = command.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "executeCommand for unopened document");
        return Ok(Json::Null);
    };
    let table = snapshot.line_table();

    // The analyzer wants 1-based line and byte column.
    let Some((line, column)) = table
        .utf8_offset(command.line, command.column)
        .zip(table.utf8_offset(command.line, 0))
        .map(|(at, line_start)| (command.line + 1, (at - line_start + 1) as u32))
    else {
        tracing::warn!(uri = %uri, "refactor position out of range");
        return Ok(Json::Null);
    };

    let args = ctx.compile_args(&uri, snapshot.language());
    let request = AnalyzerBridge::semantic_refactor_request(
        &command.action_string,
        uri.path(),
        line,
        column,
        command.length,
        args,
    );
    let response = ctx
        .bridge
        .request(request, Some(&rc.token))
        .await
        .map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let edits = translate_refactor_edits(&response, table);
    let edit = WorkspaceEdit {
        changes: Some(HashMap::from([(uri, edits)])),
    };
    serde_json::to_value(edit).map_err(ResponseError::internal)
}

/// Flatten categorized edits into text edits. Analyzer coordinates are
/// 1-based lines and byte columns.
fn translate_refactor_edits(response: &Value, table: &crate::textpos::LineTable) -> Vec<TextEdit> {
    let k = &tables().keys;
    let mut edits = Vec::new();
    for category in response.array(&k.categorizededits).unwrap_or_default() {
        for edit in category.array(&k.edits).unwrap_or_default() {
            let Some(start) = analyzer_position(edit.int(&k.line), edit.int(&k.column), table)
            else {
                continue;
            };
            let Some(end) = analyzer_position(edit.int(&k.endline), edit.int(&k.endcolumn), table)
            else {
                continue;
            };
            let Some(text) = edit.string(&k.text) else {
                continue;
            };
            edits.push(TextEdit {
                range: Range::new(start, end),
                new_text: text.to_string(),
            });
        }
    }
    edits
}

fn analyzer_position(
    line: Option<i64>,
    column: Option<i64>,
    table: &crate::textpos::LineTable,
) -> Option<Position> {
    let line = u32::try_from(line?.checked_sub(1)?).ok()?;
    let byte_col = usize::try_from(column?.checked_sub(1)?).ok()?;
    let character = table.utf16_col(line, byte_col)?;
    Some(Position::new(line, character))
}
