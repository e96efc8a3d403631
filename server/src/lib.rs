//! swiftls server core: document synchronization, request dispatch, and
//! the translation layer between LSP and the native analyzer.

pub mod bridge;
pub mod build_settings;
pub mod commands;
pub mod dispatch;
pub mod documents;
pub mod features;
pub mod server;
pub mod textpos;

#[cfg(test)]
pub(crate) mod testing;

pub use build_settings::{BuildSettingsProvider, CompileSettings, NullBuildSettings, StaticBuildSettings};
pub use documents::{DocumentManager, DocumentSnapshot, EditError};
pub use server::LanguageServer;
pub use textpos::LineTable;
