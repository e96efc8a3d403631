//! Document highlight via related identifiers.

use std::sync::Arc;

use swiftls_analyzer::tables;
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{
    DocumentHighlight, DocumentHighlightKind, Position, Range, TextDocumentPositionParams,
};

use crate::bridge::AnalyzerBridge;
use crate::dispatch::RequestContext;
use crate::server::ServerContext;

pub async fn handle(
    ctx: Arc<ServerContext>,
    params: TextDocumentPositionParams,
    rc: RequestContext,
) -> Result<Vec<DocumentHighlight>, ResponseError> {
    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "highlight for unopened document");
        return Ok(Vec::new());
    };
    let Some(offset) = snapshot
        .line_table()
        .utf8_offset(params.position.line, params.position.character)
    else {
        tracing::warn!(uri = %uri, "highlight position out of range");
        return Ok(Vec::new());
    };

    let args = ctx.compile_args(&uri, snapshot.language());
    let request = AnalyzerBridge::related_idents_request(uri.path(), offset, args);
    let response = ctx
        .bridge
        .request(request, Some(&rc.token))
        .await
        .map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let k = &tables().keys;
    let table = snapshot.line_table();
    let highlights = response
        .array(&k.results)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| {
            let start = usize::try_from(entry.int(&k.offset)?).ok()?;
            let end = start.checked_add(usize::try_from(entry.int(&k.length)?).ok()?)?;
            let (start_line, start_col) = table.line_and_utf16_col(start)?;
            let (end_line, end_col) = table.line_and_utf16_col(end)?;
            Some(DocumentHighlight {
                range: Range::new(
                    Position::new(start_line, start_col),
                    Position::new(end_line, end_col),
                ),
                kind: Some(DocumentHighlightKind::Read),
            })
        })
        .collect();

    Ok(highlights)
}
