//! Server assembly: wires the dispatcher, document manager, analyzer
//! bridge, and feature handlers, and owns the main loop.

use std::sync::{Arc, Mutex};

use serde_json::Value as Json;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use url::Url;

use swiftls_analyzer::{AnalyzerService, Value, tables};
use swiftls_protocol::codec::{MessageReader, MessageWriter, ProtocolError};
use swiftls_protocol::messages::{ErrorCode, Outgoing};
use swiftls_protocol::types::{
    ClientCapabilities, CodeActionKind, CodeActionOptions, CompletionOptions, Diagnostic,
    ExecuteCommandOptions, InitializeParams, InitializeResult, PublishDiagnosticsParams,
    SYNC_INCREMENTAL, SaveOptions, ServerCapabilities, TextDocumentSyncOptions,
};

use crate::bridge::AnalyzerBridge;
use crate::build_settings::BuildSettingsProvider;
use crate::commands::SEMANTIC_REFACTOR_COMMAND;
use crate::dispatch::Dispatcher;
use crate::documents::{DocumentManager, DocumentSnapshot};
use crate::features::{codeaction, completion, folding, highlight, hover, lifecycle, symbols};

const OUTBOUND_CHANNEL_CAPACITY: usize = 256;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What the client advertised at initialize, reduced to the parts the
/// handlers consult.
#[derive(Debug, Clone, Default)]
pub struct ClientView {
    /// `Some(value_set)` when the client supports code-action literals;
    /// `None` means a legacy `Command[]` client.
    pub code_action_literal_kinds: Option<Vec<CodeActionKind>>,
    pub folding_range_limit: Option<u32>,
    pub line_folding_only: bool,
}

impl ClientView {
    fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let text_document = capabilities.text_document.as_ref();
        let code_action_literal_kinds = text_document
            .and_then(|td| td.code_action.as_ref())
            .and_then(|ca| ca.code_action_literal_support.as_ref())
            .map(|ls| ls.code_action_kind.value_set.clone());
        let folding = text_document.and_then(|td| td.folding_range.as_ref());
        Self {
            code_action_literal_kinds,
            folding_range_limit: folding.and_then(|f| f.range_limit),
            line_folding_only: folding.and_then(|f| f.line_folding_only).unwrap_or(false),
        }
    }
}

/// Shared state the handlers close over. Snapshots are immutable; the
/// document manager is only mutated from lifecycle notifications, which
/// run inline on the dispatch loop.
pub struct ServerContext {
    pub documents: Mutex<DocumentManager>,
    pub bridge: AnalyzerBridge,
    pub build_settings: Box<dyn BuildSettingsProvider>,
    client: Mutex<ClientView>,
    outbound: mpsc::Sender<Json>,
}

impl ServerContext {
    #[must_use]
    pub fn snapshot(&self, url: &Url) -> Option<DocumentSnapshot> {
        self.documents
            .lock()
            .expect("document manager poisoned")
            .latest_snapshot(url)
    }

    #[must_use]
    pub fn compile_args(&self, url: &Url, language: &str) -> Option<Vec<String>> {
        self.build_settings
            .settings(url, language)
            .map(|s| s.compiler_arguments)
    }

    #[must_use]
    pub fn client_view(&self) -> ClientView {
        self.client.lock().expect("client view poisoned").clone()
    }

    fn set_client_view(&self, view: ClientView) {
        *self.client.lock().expect("client view poisoned") = view;
    }

    /// Publish a diagnostics batch. Always an array; an empty batch
    /// clears the client's prior state.
    pub async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        let params = PublishDiagnosticsParams { uri, diagnostics };
        let frame = Outgoing::notification(
            "textDocument/publishDiagnostics",
            serde_json::to_value(params).expect("diagnostics are plain data"),
        )
        .into_frame();
        if self.outbound.send(frame).await.is_err() {
            tracing::warn!("diagnostics dropped: outbound channel closed");
        }
    }
}

enum ServerEvent {
    Analyzer(Value),
    Exit,
}

/// The language server: a dispatcher bound to a context, run over a
/// transport.
pub struct LanguageServer {
    ctx: Arc<ServerContext>,
    dispatcher: Dispatcher,
    events_rx: mpsc::Receiver<ServerEvent>,
    outbound_rx: mpsc::Receiver<Json>,
}

impl LanguageServer {
    #[must_use]
    pub fn new(
        service: Arc<dyn AnalyzerService>,
        build_settings: Box<dyn BuildSettingsProvider>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let ctx = Arc::new(ServerContext {
            documents: Mutex::new(DocumentManager::new()),
            bridge: AnalyzerBridge::new(service),
            build_settings,
            client: Mutex::new(ClientView::default()),
            outbound: outbound_tx.clone(),
        });

        let mut dispatcher = Dispatcher::new(outbound_tx);
        register_handlers(&mut dispatcher, &ctx, &events_tx);

        Self {
            ctx,
            dispatcher,
            events_rx,
            outbound_rx,
        }
    }

    /// Serve until the client closes the transport or sends `exit`.
    pub async fn run<R, W>(mut self, input: R, output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut outbound_rx = self.outbound_rx;
        let writer_task = tokio::spawn(async move {
            let mut writer = MessageWriter::new(output);
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = writer.write(&frame).await {
                    tracing::warn!("transport write failed: {e}");
                    break;
                }
            }
        });

        // Frames are read on their own task: channel receives are safe to
        // race in the select below, a mid-frame read is not.
        let (transport_tx, mut transport_rx) = mpsc::channel(16);
        let reader_task = tokio::spawn(async move {
            let mut reader = MessageReader::new(input);
            loop {
                let event = match reader.read().await {
                    Ok(Some(frame)) => TransportEvent::Frame(frame),
                    Ok(None) => TransportEvent::Closed(None),
                    Err(ProtocolError::Json(e)) => TransportEvent::BadJson(e.to_string()),
                    Err(e) => TransportEvent::Closed(Some(e.to_string())),
                };
                let done = matches!(event, TransportEvent::Closed(_));
                if transport_tx.send(event).await.is_err() || done {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = transport_rx.recv() => match event {
                    TransportEvent::Frame(frame) => self.dispatcher.dispatch(frame).await,
                    TransportEvent::BadJson(detail) => {
                        tracing::warn!("client sent invalid JSON: {detail}");
                        let reply = serde_json::json!({
                            "jsonrpc": "2.0",
                            "id": null,
                            "error": {
                                "code": ErrorCode::ParseError.code(),
                                "message": format!("invalid JSON: {detail}"),
                            }
                        });
                        let _ = self.ctx.outbound.send(reply).await;
                    }
                    TransportEvent::Closed(None) => {
                        tracing::info!("client closed the transport");
                        break;
                    }
                    TransportEvent::Closed(Some(detail)) => {
                        tracing::error!("transport failed: {detail}");
                        break;
                    }
                },
                Some(event) = self.events_rx.recv() => match event {
                    ServerEvent::Analyzer(value) => {
                        handle_analyzer_notification(&self.ctx, value).await;
                    }
                    ServerEvent::Exit => break,
                },
                else => break,
            }
        }

        release_analyzer_state(&self.ctx).await;
        reader_task.abort();
        drop(self.dispatcher);
        drop(self.ctx);
        let _ = writer_task.await;
        Ok(())
    }
}

enum TransportEvent {
    Frame(Json),
    BadJson(String),
    Closed(Option<String>),
}

/// Analyzer notifications arrive in order on the dispatcher queue; a
/// document update triggers the canonical diagnostics refresh.
async fn handle_analyzer_notification(ctx: &Arc<ServerContext>, value: Value) {
    let t = tables();
    let Some(kind) = value.uid(&t.keys.notification) else {
        tracing::debug!("dropping analyzer notification without a kind");
        return;
    };
    if kind != t.values.notification_document_update {
        tracing::trace!(kind = %kind, "ignoring analyzer notification");
        return;
    }
    let Some(uri) = value.string(&t.keys.name).and_then(|name| name.parse::<Url>().ok()) else {
        tracing::debug!("document update without a usable name");
        return;
    };
    lifecycle::refresh_diagnostics(ctx.clone(), uri).await;
}

/// Close every analyzer session still open and give back the
/// notification slot. Runs on shutdown and on every loop exit.
async fn release_analyzer_state(ctx: &Arc<ServerContext>) {
    let urls = {
        let mut documents = ctx.documents.lock().expect("document manager poisoned");
        let urls = documents.open_urls();
        for url in &urls {
            documents.close(url);
        }
        urls
    };
    for url in urls {
        if let Err(e) = ctx
            .bridge
            .request(AnalyzerBridge::close_request(url.as_str()), None)
            .await
        {
            tracing::warn!(uri = %url, "editor.close on shutdown failed: {e}");
        }
    }
    ctx.bridge.clear_notification_handler();
}

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: TextDocumentSyncOptions {
            open_close: true,
            change: SYNC_INCREMENTAL,
            will_save: true,
            will_save_wait_until: false,
            save: SaveOptions {
                include_text: false,
            },
        },
        completion_provider: CompletionOptions {
            resolve_provider: false,
            trigger_characters: vec![".".to_string()],
        },
        hover_provider: true,
        document_highlight_provider: true,
        folding_range_provider: true,
        document_symbol_provider: true,
        code_action_provider: CodeActionOptions {
            code_action_kinds: Vec::new(),
        },
        execute_command_provider: ExecuteCommandOptions {
            commands: vec![SEMANTIC_REFACTOR_COMMAND.to_string()],
        },
    }
}

fn register_handlers(
    dispatcher: &mut Dispatcher,
    ctx: &Arc<ServerContext>,
    events_tx: &mpsc::Sender<ServerEvent>,
) {
    // ── lifecycle ──────────────────────────────────────────────────

    {
        let ctx = ctx.clone();
        let events_tx = events_tx.clone();
        dispatcher.request("initialize", move |params: InitializeParams, _rc| {
            let ctx = ctx.clone();
            let events_tx = events_tx.clone();
            async move {
                ctx.set_client_view(ClientView::from_capabilities(&params.capabilities));
                ctx.bridge.subscribe(Arc::new(move |value| {
                    if events_tx.try_send(ServerEvent::Analyzer(value)).is_err() {
                        tracing::warn!("dropping analyzer notification: event queue full");
                    }
                }));
                ctx.bridge.install_notification_handler();
                Ok(InitializeResult {
                    capabilities: server_capabilities(),
                })
            }
        });
    }

    dispatcher.notification("initialized", |_: Json| async {
        tracing::debug!("client finished initializing");
    });

    {
        let ctx = ctx.clone();
        dispatcher.request("shutdown", move |_: (), _rc| {
            let ctx = ctx.clone();
            async move {
                release_analyzer_state(&ctx).await;
                Ok(Json::Null)
            }
        });
    }

    {
        let events_tx = events_tx.clone();
        dispatcher.notification("exit", move |_: Json| {
            let events_tx = events_tx.clone();
            async move {
                if events_tx.try_send(ServerEvent::Exit).is_err() {
                    tracing::warn!("exit event dropped: queue full");
                }
            }
        });
    }

    // ── document sync ──────────────────────────────────────────────

    {
        let ctx = ctx.clone();
        dispatcher.notification("textDocument/didOpen", move |params| {
            lifecycle::did_open(ctx.clone(), params)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.notification("textDocument/didChange", move |params| {
            lifecycle::did_change(ctx.clone(), params)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.notification("textDocument/didClose", move |params| {
            lifecycle::did_close(ctx.clone(), params)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.notification("textDocument/willSave", move |params| {
            lifecycle::will_save(ctx.clone(), params)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.notification("textDocument/didSave", move |params| {
            lifecycle::did_save(ctx.clone(), params)
        });
    }

    // ── features ───────────────────────────────────────────────────

    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/completion", move |params, rc| {
            completion::handle(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/hover", move |params, rc| {
            hover::handle(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/documentHighlight", move |params, rc| {
            highlight::handle(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/foldingRange", move |params, rc| {
            folding::handle(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/documentSymbol", move |params, rc| {
            symbols::document_symbols(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/symbolInfo", move |params, rc| {
            symbols::symbol_info(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("textDocument/codeAction", move |params, rc| {
            codeaction::handle(ctx.clone(), params, rc)
        });
    }
    {
        let ctx = ctx.clone();
        dispatcher.request("workspace/executeCommand", move |params, rc| {
            codeaction::execute_command(ctx.clone(), params, rc)
        });
    }
}
