//! LSP wire protocol: JSON-RPC framing, message envelope, and schema types.

pub mod codec;
pub mod messages;
pub mod types;

pub use codec::{MessageReader, MessageWriter, ProtocolError};
pub use messages::{ErrorCode, Message, RequestId, ResponseError};
