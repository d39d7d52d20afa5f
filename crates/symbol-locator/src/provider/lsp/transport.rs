use std::fmt::{Display, Formatter};

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTENT_LENGTH: &str = "content-length";

/// Write one JSON-RPC message with its `Content-Length` header.
pub(crate) async fn write_message<W>(
    writer: &mut W,
    message: &Value,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let body = serde_json::to_vec(message).map_err(TransportError::InvalidJson)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read the next message; `Ok(None)` on a clean end of stream.
pub(crate) async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, TransportError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length = None;
    let mut in_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return if in_header {
                Err(TransportError::UnexpectedEof)
            } else {
                Ok(None)
            };
        }
        in_header = true;

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        let Some((name, value)) = header.split_once(':') else {
            return Err(TransportError::InvalidHeader(header.to_string()));
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let length =
                value.trim().parse::<usize>().map_err(|_| TransportError::InvalidHeader(header.to_string()))?;
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or(TransportError::MissingContentLength)?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.map_err(|error| match error.kind() {
        std::io::ErrorKind::UnexpectedEof => TransportError::UnexpectedEof,
        _ => TransportError::Io(error),
    })?;
    serde_json::from_slice(&body).map(Some).map_err(TransportError::InvalidJson)
}

#[derive(Debug)]
pub enum TransportError {
    Io(std::io::Error),
    InvalidHeader(String),
    MissingContentLength,
    InvalidJson(serde_json::Error),
    UnexpectedEof,
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl Display for TransportError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "i/o error: {error}"),
            Self::InvalidHeader(header) => write!(f, "invalid header line {header:?}"),
            Self::MissingContentLength => write!(f, "message header has no Content-Length"),
            Self::InvalidJson(error) => write!(f, "invalid JSON payload: {error}"),
            Self::UnexpectedEof => write!(f, "stream ended in the middle of a message"),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
#[path = "../../../tests/src/provider/transport_tests.rs"]
mod tests;
