//! Request dispatch: method routing, reply bookkeeping, cancellation.
//!
//! Notifications run inline on the dispatch loop, so document mutations
//! are observed in client order. Requests spawn onto the runtime with a
//! cancellation token registered under their id; every request gets
//! exactly one reply. Outbound frames funnel through a single mpsc
//! channel drained by one writer task, which keeps the reply stream FIFO.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Notify, mpsc};

use swiftls_protocol::messages::{Message, Outgoing, RequestId, ResponseError};
use swiftls_protocol::types::CancelParams;

/// Cooperative cancellation flag shared between the dispatcher and a
/// running handler.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token fires. Already-cancelled tokens resolve
    /// immediately.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Per-request context handed to handlers.
#[derive(Clone)]
pub struct RequestContext {
    pub token: CancellationToken,
}

type RequestHandlerFn =
    Arc<dyn Fn(Option<Value>, RequestContext) -> BoxFuture<'static, Result<Value, ResponseError>> + Send + Sync>;
type NotificationHandlerFn = Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct Dispatcher {
    requests: HashMap<&'static str, RequestHandlerFn>,
    notifications: HashMap<&'static str, NotificationHandlerFn>,
    active: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
    outbound: mpsc::Sender<Value>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(outbound: mpsc::Sender<Value>) -> Self {
        Self {
            requests: HashMap::new(),
            notifications: HashMap::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            outbound,
        }
    }

    /// Register a typed request handler. Params are serde-decoded; a
    /// decode failure replies `InvalidParams` without reaching the
    /// handler.
    pub fn request<P, R, F, Fut>(&mut self, method: &'static str, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ResponseError>> + Send + 'static,
    {
        let wrapped: RequestHandlerFn = Arc::new(move |params, ctx| {
            match serde_json::from_value::<P>(params.unwrap_or(Value::Null)) {
                Ok(params) => {
                    let fut = handler(params, ctx);
                    async move {
                        let reply = fut.await?;
                        serde_json::to_value(reply).map_err(ResponseError::internal)
                    }
                    .boxed()
                }
                Err(e) => {
                    let err = ResponseError::invalid_params(e);
                    async move { Err(err) }.boxed()
                }
            }
        });
        self.requests.insert(method, wrapped);
    }

    /// Register a typed notification handler. Runs inline on the
    /// dispatch loop; never replies.
    pub fn notification<P, F, Fut>(&mut self, method: &'static str, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wrapped: NotificationHandlerFn = Arc::new(move |params| {
            match serde_json::from_value::<P>(params.unwrap_or(Value::Null)) {
                Ok(params) => handler(params).boxed(),
                Err(e) => {
                    tracing::warn!(method, "dropping notification with bad params: {e}");
                    async {}.boxed()
                }
            }
        });
        self.notifications.insert(method, wrapped);
    }

    /// Route one raw frame.
    pub async fn dispatch(&self, frame: Value) {
        let Some(message) = Message::parse(&frame) else {
            tracing::warn!("dropping unclassifiable frame");
            return;
        };

        match message {
            Message::Request { id, method, params } => {
                self.dispatch_request(id, &method, params).await;
            }
            Message::Notification { method, params } => {
                if method == "$/cancelRequest" {
                    self.handle_cancel(params);
                    return;
                }
                match self.notifications.get(method.as_str()) {
                    Some(handler) => handler(params).await,
                    None => tracing::debug!(method, "ignoring unhandled notification"),
                }
            }
            Message::Response { id, .. } => {
                // This server issues no client-bound requests.
                tracing::debug!(id = %id, "ignoring unexpected response frame");
            }
        }
    }

    async fn dispatch_request(&self, id: RequestId, method: &str, params: Option<Value>) {
        let Some(handler) = self.requests.get(method) else {
            tracing::warn!(method, "unknown request method");
            self.send(Outgoing::failure(id, ResponseError::method_not_found(method)))
                .await;
            return;
        };

        let token = CancellationToken::new();
        self.active
            .lock()
            .expect("active request registry poisoned")
            .insert(id.clone(), token.clone());

        let fut = handler(params, RequestContext { token });
        let outbound = self.outbound.clone();
        let active = self.active.clone();
        tokio::spawn(async move {
            let outcome = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(ResponseError::internal("handler panicked")),
            };
            active
                .lock()
                .expect("active request registry poisoned")
                .remove(&id);
            let frame = match outcome {
                Ok(result) => Outgoing::success(id, result),
                Err(error) => Outgoing::failure(id, error),
            };
            if outbound.send(frame.into_frame()).await.is_err() {
                tracing::warn!("reply dropped: outbound channel closed");
            }
        });
    }

    fn handle_cancel(&self, params: Option<Value>) {
        let Some(params) = params else { return };
        match serde_json::from_value::<CancelParams>(params) {
            Ok(cancel) => {
                let active = self.active.lock().expect("active request registry poisoned");
                match active.get(&cancel.id) {
                    Some(token) => token.cancel(),
                    None => tracing::debug!(id = %cancel.id, "cancel for unknown or finished request"),
                }
            }
            Err(e) => tracing::debug!("undecodable $/cancelRequest: {e}"),
        }
    }

    async fn send(&self, frame: Outgoing) {
        if self.outbound.send(frame.into_frame()).await.is_err() {
            tracing::warn!("outbound channel closed");
        }
    }
}
