//! Bridge to the native Swift semantic analyzer.
//!
//! The analyzer is a dynamically loaded library speaking a vocabulary of
//! interned UIDs and variant values. This crate provides the value plane:
//! UID interning, the request/response value model with total traversal,
//! typed request building, the service trait, and the dylib loader.
//! Translation into LSP shapes lives in `swiftls-server`.

pub mod dylib;
pub mod keys;
pub mod request;
pub mod service;
pub mod uid;
pub mod value;

pub use keys::{Keys, Requests, UidTables, Values, tables};
pub use request::RequestBuilder;
pub use service::{AnalyzerError, AnalyzerService, Completion, NotificationHandler, RequestHandle};
pub use uid::Uid;
pub use value::Value;
