//! Document lifecycle: open, change, close, save, and the diagnostics
//! publications they trigger.
//!
//! The analyzer holds parallel per-document state; it is kept in sync by
//! issuing `editor.open` / `editor.replacetext` / `editor.close` in the
//! same order the client mutates its buffers. Diagnostics are published
//! after every open and every applied change batch, always as an array
//! (empty included) so stale client state is cleared.

use std::sync::Arc;

use url::Url;

use swiftls_protocol::types::{
    DidChangeParams, DidCloseParams, DidOpenParams, DidSaveParams, WillSaveParams,
};

use crate::bridge::{AnalyzerBridge, translate};
use crate::server::ServerContext;

pub async fn did_open(ctx: Arc<ServerContext>, params: DidOpenParams) {
    let doc = params.text_document;
    let snapshot = {
        let mut documents = ctx.documents.lock().expect("document manager poisoned");
        match documents.open(doc.uri.clone(), doc.language_id, doc.version, doc.text) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(uri = %doc.uri, "didOpen ignored: {e}");
                return;
            }
        }
    };

    let args = ctx.compile_args(snapshot.url(), snapshot.language());
    let request =
        AnalyzerBridge::open_request(snapshot.url().as_str(), snapshot.text(), args, false);
    let diagnostics = match ctx.bridge.request(request, None).await {
        Ok(response) => translate::diagnostics(&response, snapshot.line_table()),
        Err(e) => {
            tracing::warn!(uri = %snapshot.url(), "editor.open failed: {e}");
            Vec::new()
        }
    };
    ctx.publish_diagnostics(snapshot.url().clone(), diagnostics).await;
}

pub async fn did_change(ctx: Arc<ServerContext>, params: DidChangeParams) {
    let uri = params.text_document.uri;
    // Byte spans for the analyzer mirror, computed against each
    // pre-change snapshot while the edit is applied.
    let mut mirrored: Vec<(usize, usize, String)> = Vec::new();

    let edited = {
        let mut documents = ctx.documents.lock().expect("document manager poisoned");
        documents.edit(
            &uri,
            params.text_document.version,
            &params.content_changes,
            |before, change| {
                if let Ok((offset, length)) = before.change_span(change) {
                    mirrored.push((offset, length, change.text.clone()));
                }
            },
        )
    };

    let snapshot = match edited {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(uri = %uri, "didChange not fully applied: {e}");
            // Mirror nothing further; the analyzer stays on the last
            // consistent prefix of the sequence.
            return;
        }
    };

    let mut last_response = None;
    for (offset, length, text) in mirrored {
        let request = AnalyzerBridge::replace_text_request(uri.as_str(), offset, length, &text);
        match ctx.bridge.request(request, None).await {
            Ok(response) => last_response = Some(response),
            Err(e) => tracing::warn!(uri = %uri, "editor.replacetext failed: {e}"),
        }
    }

    let diagnostics = last_response
        .map(|response| translate::diagnostics(&response, snapshot.line_table()))
        .unwrap_or_default();
    ctx.publish_diagnostics(uri, diagnostics).await;
}

pub async fn did_close(ctx: Arc<ServerContext>, params: DidCloseParams) {
    let uri = params.text_document.uri;
    let removed = {
        let mut documents = ctx.documents.lock().expect("document manager poisoned");
        documents.close(&uri)
    };
    if removed.is_none() {
        tracing::warn!(uri = %uri, "didClose for unknown document");
        return;
    }
    // Release the analyzer session on every close path.
    if let Err(e) = ctx
        .bridge
        .request(AnalyzerBridge::close_request(uri.as_str()), None)
        .await
    {
        tracing::warn!(uri = %uri, "editor.close failed: {e}");
    }
}

pub async fn will_save(_ctx: Arc<ServerContext>, params: WillSaveParams) {
    tracing::trace!(uri = %params.text_document.uri, "willSave");
}

pub async fn did_save(_ctx: Arc<ServerContext>, params: DidSaveParams) {
    tracing::trace!(uri = %params.text_document.uri, "didSave");
}

/// Diagnostics refresh in response to an analyzer document-update
/// notification: the canonical zero-length replacetext, then publish
/// whatever comes back.
pub async fn refresh_diagnostics(ctx: Arc<ServerContext>, uri: Url) {
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::debug!(uri = %uri, "document update for unopened document");
        return;
    };
    let request = AnalyzerBridge::diagnostics_refresh_request(uri.as_str());
    match ctx.bridge.request(request, None).await {
        Ok(response) => {
            let diagnostics = translate::diagnostics(&response, snapshot.line_table());
            ctx.publish_diagnostics(uri, diagnostics).await;
        }
        Err(e) => tracing::warn!(uri = %uri, "diagnostics refresh failed: {e}"),
    }
}
