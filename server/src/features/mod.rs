//! Feature handlers.
//!
//! Every handler follows the same template: take the latest snapshot
//! (absent snapshot → empty reply plus a log entry), translate LSP
//! coordinates through the line table, issue a bridge request with the
//! build system's compiler arguments, translate the response, reply.

pub mod codeaction;
pub mod completion;
pub mod folding;
pub mod highlight;
pub mod hover;
pub mod lifecycle;
pub mod symbols;

use swiftls_protocol::ResponseError;

use crate::bridge::BridgeError;

/// Map a bridge failure onto the reply taxonomy: cancellation replies
/// `RequestCancelled`, everything else is an internal error carrying the
/// bridge's message.
pub(crate) fn reply_error(error: BridgeError) -> ResponseError {
    match error {
        BridgeError::Cancelled => ResponseError::cancelled(),
        BridgeError::Analyzer(e) => ResponseError::internal(e),
    }
}
