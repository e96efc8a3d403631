//! Scripted analyzer used across the server's tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use swiftls_analyzer::{
    AnalyzerError, AnalyzerService, Completion, NotificationHandler, RequestHandle, Uid, Value,
    tables,
};

pub fn dict<const N: usize>(entries: [(Uid, Value); N]) -> Value {
    Value::Dict(BTreeMap::from(entries))
}

/// An in-process analyzer with scripted responses, keyed by request UID.
/// Unscripted requests answer with an empty dictionary.
pub struct FakeAnalyzer {
    scripted: Mutex<HashMap<Uid, VecDeque<Result<Value, AnalyzerError>>>>,
    requests: Mutex<Vec<Value>>,
    notification_handler: Mutex<Option<NotificationHandler>>,
    cancelled: AtomicUsize,
    hold_replies: bool,
    next_handle: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            notification_handler: Mutex::new(None),
            cancelled: AtomicUsize::new(0),
            hold_replies: false,
            next_handle: AtomicUsize::new(1),
        }
    }

    /// Never invoke completions; lets tests race cancellation.
    pub fn hold_replies(mut self) -> Self {
        self.hold_replies = true;
        self
    }

    /// Queue a response for the next request named `request_uid`.
    pub fn script(&self, request_uid: &Uid, response: Result<Value, AnalyzerError>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(request_uid.clone())
            .or_default()
            .push_back(response);
    }

    /// Every request observed, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Names of observed requests (their `key.request` spellings).
    pub fn request_names(&self) -> Vec<String> {
        let key = &tables().keys.request;
        self.requests()
            .iter()
            .filter_map(|r| r.uid(key).map(|u| u.as_str().to_string()))
            .collect()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Deliver an unsolicited notification to the installed handler.
    pub fn emit_notification(&self, value: Value) {
        let handler = self.notification_handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(value);
        }
    }

    fn respond(&self, request: &Value) -> Result<Value, AnalyzerError> {
        if let Some(name) = request.uid(&tables().keys.request) {
            let mut scripted = self.scripted.lock().unwrap();
            if let Some(response) = scripted.get_mut(&name).and_then(|queue| queue.pop_front()) {
                return response;
            }
        }
        Ok(Value::Dict(BTreeMap::new()))
    }
}

impl AnalyzerService for FakeAnalyzer {
    fn send_sync(&self, request: Value) -> Result<Value, AnalyzerError> {
        let response = self.respond(&request);
        self.requests.lock().unwrap().push(request);
        response
    }

    fn send(&self, request: Value, on_done: Completion) -> RequestHandle {
        let response = self.respond(&request);
        self.requests.lock().unwrap().push(request);
        if !self.hold_replies {
            on_done(response);
        }
        RequestHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) as u64)
    }

    fn cancel(&self, _handle: RequestHandle) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    fn set_notification_handler(&self, handler: Option<NotificationHandler>) {
        *self.notification_handler.lock().unwrap() = handler;
    }
}
