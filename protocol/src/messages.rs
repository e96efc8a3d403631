//! JSON-RPC message envelope.
//!
//! Incoming frames are classified into requests, notifications, and
//! responses; outgoing frames are built through [`Outgoing`] constructors.
//! Request ids may be integers or strings and are echoed verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request identifier.
///
/// LSP clients send either an integer or a string; the reply must carry
/// the id back unchanged, so both shapes are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// JSON-RPC error codes used by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    RequestCancelled,
}

impl ErrorCode {
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::RequestCancelled => -32800,
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("method not found: {method}"))
    }

    #[must_use]
    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("invalid params: {detail}"))
    }

    #[must_use]
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, detail.to_string())
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::RequestCancelled, "request cancelled")
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::RequestCancelled.code()
    }
}

/// A classified incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
    Response {
        id: RequestId,
        result: Option<Value>,
        error: Option<ResponseError>,
    },
}

impl Message {
    /// Classify a raw JSON-RPC frame.
    ///
    /// Frames that fit none of the three shapes (e.g. an id with neither
    /// method nor result) yield `None`; the caller logs and drops them.
    #[must_use]
    pub fn parse(frame: &Value) -> Option<Self> {
        let id = frame
            .get("id")
            .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());
        let method = frame.get("method").and_then(Value::as_str);
        let has_reply_body = frame.get("result").is_some() || frame.get("error").is_some();

        match (id, method, has_reply_body) {
            (Some(id), Some(method), _) => Some(Self::Request {
                id,
                method: method.to_string(),
                params: frame.get("params").cloned(),
            }),
            (None, Some(method), _) => Some(Self::Notification {
                method: method.to_string(),
                params: frame.get("params").cloned(),
            }),
            (Some(id), None, true) => Some(Self::Response {
                id,
                result: frame.get("result").cloned(),
                error: frame
                    .get("error")
                    .and_then(|e| serde_json::from_value(e.clone()).ok()),
            }),
            _ => None,
        }
    }
}

/// Outgoing frame constructors.
///
/// Replies carry either `result` or `error`, never both; a success with
/// no payload serializes `result: null` as LSP requires.
#[derive(Debug, Serialize)]
pub struct Outgoing {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

impl Outgoing {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: None,
            params: None,
            // `Some(Value::Null)` keeps the member present for null results.
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(id: RequestId, error: ResponseError) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: Some(method.into()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    /// Serialize to the raw frame value handed to the codec.
    #[must_use]
    pub fn into_frame(self) -> Value {
        serde_json::to_value(self).expect("outgoing frames are plain data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_int_roundtrip() {
        let id: RequestId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id, RequestId::Int(42));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(42));
    }

    #[test]
    fn test_request_id_string_roundtrip() {
        let id: RequestId = serde_json::from_value(json!("abc-1")).unwrap();
        assert_eq!(id, RequestId::Str("abc-1".to_string()));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("abc-1"));
    }

    #[test]
    fn test_parse_request() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/hover",
            "params": { "position": { "line": 0, "character": 0 } }
        });
        match Message::parse(&frame).unwrap() {
            Message::Request { id, method, params } => {
                assert_eq!(id, RequestId::Int(1));
                assert_eq!(method, "textDocument/hover");
                assert!(params.unwrap()["position"].is_object());
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_notification() {
        let frame = json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        });
        match Message::parse(&frame).unwrap() {
            Message::Notification { method, .. } => assert_eq!(method, "initialized"),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_success() {
        let frame = json!({ "jsonrpc": "2.0", "id": "r1", "result": { "ok": true } });
        match Message::parse(&frame).unwrap() {
            Message::Response { id, result, error } => {
                assert_eq!(id, RequestId::Str("r1".to_string()));
                assert_eq!(result.unwrap()["ok"], true);
                assert!(error.is_none());
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_error() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": { "code": -32601, "message": "nope" }
        });
        match Message::parse(&frame).unwrap() {
            Message::Response { error, .. } => {
                assert_eq!(error.unwrap().code, -32601);
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_frame_is_none() {
        assert!(Message::parse(&json!({ "jsonrpc": "2.0" })).is_none());
        assert!(Message::parse(&json!({ "id": 3 })).is_none());
        assert!(Message::parse(&json!("not an object")).is_none());
    }

    #[test]
    fn test_success_frame_keeps_null_result() {
        let frame = Outgoing::success(RequestId::Int(1), Value::Null).into_frame();
        assert!(frame.get("result").is_some(), "null result must stay present");
        assert!(frame.get("error").is_none());
        assert_eq!(frame["id"], 1);
    }

    #[test]
    fn test_failure_frame_shape() {
        let frame =
            Outgoing::failure(RequestId::Int(2), ResponseError::method_not_found("x/y")).into_frame();
        assert_eq!(frame["error"]["code"], -32601);
        assert!(frame.get("result").is_none());
    }

    #[test]
    fn test_notification_frame_has_no_id() {
        let frame = Outgoing::notification("textDocument/publishDiagnostics", json!({})).into_frame();
        assert!(frame.get("id").is_none());
        assert_eq!(frame["method"], "textDocument/publishDiagnostics");
    }

    #[test]
    fn test_cancelled_error_code() {
        let err = ResponseError::cancelled();
        assert_eq!(err.code, -32800);
        assert!(err.is_cancelled());
        assert!(!ResponseError::internal("x").is_cancelled());
    }
}
