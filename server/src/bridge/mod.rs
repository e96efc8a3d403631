//! Typed façade over the analyzer service.
//!
//! Owns the one notification-handler slot the service offers and fans
//! notifications out to subscribers. Requests are built here with the
//! shared UID tables; handlers await completions through a oneshot
//! bridge, optionally racing a cancellation token.

pub mod translate;

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use swiftls_analyzer::{
    AnalyzerError, AnalyzerService, RequestBuilder, Value, tables,
};

use crate::dispatch::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

type Subscriber = Arc<dyn Fn(Value) + Send + Sync>;

pub struct AnalyzerBridge {
    service: Arc<dyn AnalyzerService>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl AnalyzerBridge {
    #[must_use]
    pub fn new(service: Arc<dyn AnalyzerService>) -> Self {
        Self {
            service,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Claim the service's notification slot and start fanning out.
    /// Called once at initialize.
    pub fn install_notification_handler(&self) {
        let subscribers = self.subscribers.clone();
        self.service.set_notification_handler(Some(Arc::new(move |value: Value| {
            let subscribers = subscribers.lock().expect("subscriber list poisoned").clone();
            for subscriber in subscribers {
                subscriber(value.clone());
            }
        })));
    }

    /// Release the notification slot. Called on shutdown.
    pub fn clear_notification_handler(&self) {
        self.service.set_notification_handler(None);
    }

    pub fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(subscriber);
    }

    /// Issue a request and await its completion.
    ///
    /// With a token, cancellation wins the race: the in-flight request is
    /// cancelled best-effort, `BridgeError::Cancelled` is returned, and
    /// the completion, if it still arrives, is dropped.
    pub async fn request(
        &self,
        request: Value,
        token: Option<&CancellationToken>,
    ) -> Result<Value, BridgeError> {
        let (tx, rx) = oneshot::channel();
        let handle = self.service.send(
            request,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );

        match token {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        self.service.cancel(handle);
                        Err(BridgeError::Cancelled)
                    }
                    outcome = rx => match outcome {
                        Ok(result) => Ok(result?),
                        Err(_) => Err(AnalyzerError::ConnectionInterrupted.into()),
                    }
                }
            }
            None => match rx.await {
                Ok(result) => Ok(result?),
                Err(_) => Err(AnalyzerError::ConnectionInterrupted.into()),
            },
        }
    }

    // ── request constructors ───────────────────────────────────────

    /// `editor.open`. `syntactic_only` requests structural output
    /// without full semantic analysis.
    #[must_use]
    pub fn open_request(
        name: &str,
        text: &str,
        compiler_args: Option<Vec<String>>,
        syntactic_only: bool,
    ) -> Value {
        let t = tables();
        let mut builder = RequestBuilder::new(&t.requests.editor_open)
            .string(&t.keys.name, name)
            .string(&t.keys.sourcetext, text)
            .flag(&t.keys.enablesyntaxmap, true)
            .flag(&t.keys.enablesubstructure, true)
            .maybe_strings(&t.keys.compilerargs, compiler_args);
        if syntactic_only {
            builder = builder.flag(&t.keys.syntactic_only, true);
        }
        builder.build()
    }

    #[must_use]
    pub fn close_request(name: &str) -> Value {
        let t = tables();
        RequestBuilder::new(&t.requests.editor_close)
            .string(&t.keys.name, name)
            .build()
    }

    #[must_use]
    pub fn replace_text_request(name: &str, offset: usize, length: usize, text: &str) -> Value {
        let t = tables();
        RequestBuilder::new(&t.requests.editor_replacetext)
            .string(&t.keys.name, name)
            .int(&t.keys.offset, offset as i64)
            .int(&t.keys.length, length as i64)
            .string(&t.keys.sourcetext, text)
            .build()
    }

    /// The canonical diagnostics refresh: a zero-length replacement of
    /// nothing at offset 0.
    #[must_use]
    pub fn diagnostics_refresh_request(name: &str) -> Value {
        Self::replace_text_request(name, 0, 0, "")
    }

    #[must_use]
    pub fn completion_request(
        file: &str,
        offset: usize,
        text: &str,
        compiler_args: Option<Vec<String>>,
    ) -> Value {
        let t = tables();
        RequestBuilder::new(&t.requests.codecomplete)
            .string(&t.keys.sourcefile, file)
            .int(&t.keys.offset, offset as i64)
            .string(&t.keys.sourcetext, text)
            .maybe_strings(&t.keys.compilerargs, compiler_args)
            .build()
    }

    #[must_use]
    pub fn cursor_info_request(
        file: &str,
        offset: usize,
        compiler_args: Option<Vec<String>>,
        retrieve_refactor_actions: bool,
    ) -> Value {
        let t = tables();
        let mut builder = RequestBuilder::new(&t.requests.cursorinfo)
            .string(&t.keys.sourcefile, file)
            .int(&t.keys.offset, offset as i64)
            .maybe_strings(&t.keys.compilerargs, compiler_args);
        if retrieve_refactor_actions {
            builder = builder.flag(&t.keys.retrieve_refactor_actions, true);
        }
        builder.build()
    }

    #[must_use]
    pub fn related_idents_request(
        file: &str,
        offset: usize,
        compiler_args: Option<Vec<String>>,
    ) -> Value {
        let t = tables();
        RequestBuilder::new(&t.requests.relatedidents)
            .string(&t.keys.sourcefile, file)
            .int(&t.keys.offset, offset as i64)
            .maybe_strings(&t.keys.compilerargs, compiler_args)
            .build()
    }

    /// Semantic refactoring. `line` and `column` are the analyzer's
    /// 1-based coordinates.
    #[must_use]
    pub fn semantic_refactor_request(
        action: &str,
        file: &str,
        line: u32,
        column: u32,
        length: u32,
        compiler_args: Option<Vec<String>>,
    ) -> Value {
        let t = tables();
        RequestBuilder::new(&t.requests.semantic_refactoring)
            .uid(&t.keys.actionuid, &swiftls_analyzer::Uid::intern(action))
            .string(&t.keys.sourcefile, file)
            .int(&t.keys.line, i64::from(line))
            .int(&t.keys.column, i64::from(column))
            .int(&t.keys.length, i64::from(length))
            .maybe_strings(&t.keys.compilerargs, compiler_args)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAnalyzer;

    #[test]
    fn test_open_request_shape() {
        let t = tables();
        let req = AnalyzerBridge::open_request("file:///a.swift", "let x = 1", None, false);
        assert_eq!(req.uid(&t.keys.request), Some(t.requests.editor_open.clone()));
        assert_eq!(req.string(&t.keys.name), Some("file:///a.swift"));
        assert_eq!(req.string(&t.keys.sourcetext), Some("let x = 1"));
        assert_eq!(req.bool(&t.keys.enablesubstructure), Some(true));
        assert!(req.get(&t.keys.syntactic_only).is_none());
    }

    #[test]
    fn test_syntactic_open_sets_flag() {
        let t = tables();
        let req = AnalyzerBridge::open_request("FoldingRanges:file:///a.swift", "", None, true);
        assert_eq!(req.bool(&t.keys.syntactic_only), Some(true));
    }

    #[test]
    fn test_diagnostics_refresh_is_zero_length_replace() {
        let t = tables();
        let req = AnalyzerBridge::diagnostics_refresh_request("file:///a.swift");
        assert_eq!(req.uid(&t.keys.request), Some(t.requests.editor_replacetext.clone()));
        assert_eq!(req.int(&t.keys.offset), Some(0));
        assert_eq!(req.int(&t.keys.length), Some(0));
        assert_eq!(req.string(&t.keys.sourcetext), Some(""));
    }

    #[test]
    fn test_refactor_request_coordinates() {
        let t = tables();
        let req = AnalyzerBridge::semantic_refactor_request(
            "source.refactoring.kind.localize.string",
            "/a.swift",
            2,
            12,
            0,
            Some(vec!["/a.swift".into()]),
        );
        assert_eq!(req.int(&t.keys.line), Some(2));
        assert_eq!(req.int(&t.keys.column), Some(12));
        assert_eq!(
            req.uid(&t.keys.actionuid).unwrap().as_str(),
            "source.refactoring.kind.localize.string"
        );
    }

    #[tokio::test]
    async fn test_request_resolves_with_scripted_response() {
        let analyzer = Arc::new(FakeAnalyzer::new());
        let t = tables();
        analyzer.script(
            &t.requests.cursorinfo,
            Ok(crate::testing::dict([(t.keys.name.clone(), Value::from("foo"))])),
        );

        let bridge = AnalyzerBridge::new(analyzer);
        let response = bridge
            .request(AnalyzerBridge::cursor_info_request("/a.swift", 0, None, false), None)
            .await
            .unwrap();
        assert_eq!(response.string(&t.keys.name), Some("foo"));
    }

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let analyzer = Arc::new(FakeAnalyzer::new().hold_replies());
        let bridge = AnalyzerBridge::new(analyzer.clone());
        let token = CancellationToken::new();
        token.cancel();

        let err = bridge
            .request(AnalyzerBridge::cursor_info_request("/a.swift", 0, None, false), Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
        assert_eq!(analyzer.cancelled_count(), 1);
    }

    #[tokio::test]
    async fn test_notification_fanout_reaches_every_subscriber() {
        let analyzer = Arc::new(FakeAnalyzer::new());
        let bridge = AnalyzerBridge::new(analyzer.clone());
        bridge.install_notification_handler();

        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        for counter in [&first, &second] {
            let counter = counter.clone();
            bridge.subscribe(Arc::new(move |_| {
                *counter.lock().unwrap() += 1;
            }));
        }

        analyzer.emit_notification(Value::Null);
        analyzer.emit_notification(Value::Null);
        assert_eq!(*first.lock().unwrap(), 2);
        assert_eq!(*second.lock().unwrap(), 2);
    }
}
