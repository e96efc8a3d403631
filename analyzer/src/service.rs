//! The analyzer service contract.
//!
//! One implementation loads the native dylib ([`crate::dylib`]); tests
//! substitute scripted services. The service owns exactly one
//! notification handler slot for its lifetime; fan-out to multiple
//! subscribers is the caller's concern.

use crate::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("failed to load analyzer library: {0}")]
    Load(String),
    #[error("analyzer request failed: {0}")]
    RequestFailed(String),
    #[error("analyzer connection interrupted")]
    ConnectionInterrupted,
}

/// Completion callback for an asynchronous request.
pub type Completion = Box<dyn FnOnce(Result<Value, AnalyzerError>) + Send + 'static>;

/// Callback invoked for every unsolicited analyzer notification.
pub type NotificationHandler = std::sync::Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// Handle to an in-flight asynchronous request. Cancellation through the
/// handle is best-effort: the completion may still arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(pub u64);

pub trait AnalyzerService: Send + Sync {
    /// Issue a request and block until its response.
    fn send_sync(&self, request: Value) -> Result<Value, AnalyzerError>;

    /// Issue a request; `on_done` fires exactly once with the outcome,
    /// from an arbitrary analyzer worker thread.
    fn send(&self, request: Value, on_done: Completion) -> RequestHandle;

    /// Best-effort cancellation of an in-flight request.
    fn cancel(&self, handle: RequestHandle);

    /// Install or clear the notification handler. The slot is set once
    /// at initialize time and cleared on shutdown.
    fn set_notification_handler(&self, handler: Option<NotificationHandler>);
}
