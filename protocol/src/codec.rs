//! `Content-Length`-framed JSON-RPC transport.
//!
//! LSP frames are `Content-Length: N\r\n\r\n{json}` over a byte stream.
//! [`MessageReader`] and [`MessageWriter`] handle framing; envelope
//! classification lives in [`crate::messages`].

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on a single frame body, to keep a misbehaving client from
/// forcing an unbounded allocation.
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("transport I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame headers ended without Content-Length")]
    MissingContentLength,
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(usize),
    #[error("connection closed mid-frame")]
    TruncatedFrame,
    #[error("frame body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads framed JSON-RPC values from an async byte stream.
pub struct MessageReader<R> {
    input: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: BufReader::new(input),
        }
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream
    /// cleanly between frames.
    pub async fn read(&mut self) -> Result<Option<Value>, ProtocolError> {
        let Some(body_len) = self.read_content_length().await? else {
            return Ok(None);
        };
        if body_len > MAX_FRAME_BYTES {
            return Err(ProtocolError::FrameTooLarge(body_len));
        }

        let mut body = vec![0u8; body_len];
        self.input
            .read_exact(&mut body)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => ProtocolError::TruncatedFrame,
                _ => ProtocolError::Io(e),
            })?;

        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Consume header lines up to the blank separator.
    ///
    /// `Ok(None)` only on EOF before any header byte; EOF after a partial
    /// header block is a truncation error, not a clean shutdown.
    async fn read_content_length(&mut self) -> Result<Option<usize>, ProtocolError> {
        let mut content_length = None;
        let mut line = String::new();
        let mut started = false;

        loop {
            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                if started {
                    return Err(ProtocolError::TruncatedFrame);
                }
                return Ok(None);
            }
            started = true;

            let header = line.trim_end_matches(['\r', '\n']);
            if header.is_empty() {
                break;
            }

            // Headers are matched case-insensitively; unknown headers
            // (Content-Type in practice) are skipped.
            if let Some((name, value)) = header.split_once(':')
                && name.trim().eq_ignore_ascii_case("Content-Length")
            {
                let value = value.trim();
                content_length = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| ProtocolError::InvalidContentLength(value.to_string()))?,
                );
            }
        }

        content_length
            .map(Some)
            .ok_or(ProtocolError::MissingContentLength)
    }
}

/// Writes framed JSON-RPC values to an async byte stream.
pub struct MessageWriter<W> {
    output: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    /// Serialize `frame` and write it with its `Content-Length` header.
    pub async fn write<T: Serialize>(&mut self, frame: &T) -> Result<(), ProtocolError> {
        let body = serde_json::to_vec(frame)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.output.write_all(header.as_bytes()).await?;
        self.output.write_all(&body).await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn read_all(bytes: &[u8]) -> Result<Option<Value>, ProtocolError> {
        MessageReader::new(bytes).read().await
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "capabilities": {} }
        });

        let mut buf = Vec::new();
        MessageWriter::new(&mut buf).write(&frame).await.unwrap();

        let back = read_all(&buf).await.unwrap().unwrap();
        assert_eq!(back, frame);
    }

    #[tokio::test]
    async fn test_consecutive_frames() {
        let mut buf = Vec::new();
        {
            let mut writer = MessageWriter::new(&mut buf);
            writer.write(&json!({ "id": 1 })).await.unwrap();
            writer.write(&json!({ "id": 2 })).await.unwrap();
        }

        let mut reader = MessageReader::new(buf.as_slice());
        assert_eq!(reader.read().await.unwrap().unwrap()["id"], 1);
        assert_eq!(reader.read().await.unwrap().unwrap()["id"], 2);
        assert!(reader.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clean_eof_is_none() {
        assert!(read_all(b"").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_headers_is_truncation() {
        let err = read_all(b"Content-Length: 10\r\n").await.unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedFrame));
    }

    #[tokio::test]
    async fn test_eof_mid_body_is_truncation() {
        let err = read_all(b"Content-Length: 100\r\n\r\n{\"id\"").await.unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedFrame));
    }

    #[tokio::test]
    async fn test_missing_content_length() {
        let err = read_all(b"Content-Type: application/json\r\n\r\n{}")
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MissingContentLength));
    }

    #[tokio::test]
    async fn test_invalid_content_length() {
        let err = read_all(b"Content-Length: twelve\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidContentLength(_)));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let header = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1);
        let err = read_all(header.as_bytes()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn test_header_name_case_insensitive() {
        let body = r#"{"id":9}"#;
        let framed = format!("content-length: {}\r\n\r\n{body}", body.len());
        let value = read_all(framed.as_bytes()).await.unwrap().unwrap();
        assert_eq!(value["id"], 9);
    }

    #[tokio::test]
    async fn test_extra_headers_skipped() {
        let body = r#"{"id":3}"#;
        let framed = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let value = read_all(framed.as_bytes()).await.unwrap().unwrap();
        assert_eq!(value["id"], 3);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let framed = "Content-Length: 8\r\n\r\nnot json";
        let err = read_all(framed.as_bytes()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[tokio::test]
    async fn test_content_length_counts_bytes_not_chars() {
        // "ü" is two UTF-8 bytes; the header must carry the byte count.
        let frame = json!({ "s": "ü" });
        let mut buf = Vec::new();
        MessageWriter::new(&mut buf).write(&frame).await.unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        let body = serde_json::to_string(&frame).unwrap();
        assert!(text.starts_with(&format!("Content-Length: {}\r\n\r\n", body.len())));

        let back = read_all(&buf).await.unwrap().unwrap();
        assert_eq!(back["s"], "ü");
    }
}
