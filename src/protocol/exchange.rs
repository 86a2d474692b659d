//! Framed exchange over a byte stream.
//!
//! Reads are single-shot: one read call per request, no attempt to fill the
//! buffer. Writes loop until every byte is accepted, so short writes never
//! reach the caller.

use super::{FrameError, Request};
use bytes::BytesMut;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Failure during one request/response exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// The peer closed before sending anything.
    #[error("connection closed before a request arrived")]
    Closed,

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("write error: {0}")]
    Write(#[source] io::Error),
}

impl ExchangeError {
    /// True for protocol/format failures, false for I/O failures.
    pub fn is_format(&self) -> bool {
        matches!(self, ExchangeError::Frame(_))
    }
}

/// Issue one read of at most `limit` bytes and return what arrived.
///
/// An empty result means the peer closed the stream.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> Result<BytesMut, ExchangeError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::zeroed(limit);

    let n = loop {
        match reader.read(&mut buf[..]).await {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExchangeError::Read(e)),
        }
    };

    buf.truncate(n);
    trace!(bytes = n, "Read frame");
    Ok(buf)
}

/// Read exactly one request with a buffer of `buffer_size` bytes.
///
/// One byte of the buffer is reserved for the terminator, so at most
/// `buffer_size - 1` bytes are captured. The connection is left open on
/// every outcome; closing is up to the caller.
pub async fn read_request<R>(reader: &mut R, buffer_size: usize) -> Result<Request, ExchangeError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let frame = read_frame(reader, buffer_size.saturating_sub(1)).await?;
    if frame.is_empty() {
        return Err(ExchangeError::Closed);
    }

    Ok(Request::parse(frame)?)
}

/// Write all of `buf`, looping over short writes. Returns the byte count.
pub async fn write_all<W>(writer: &mut W, buf: &[u8]) -> Result<usize, ExchangeError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;

    while written < buf.len() {
        match writer.write(&buf[written..]).await {
            Ok(0) => {
                return Err(ExchangeError::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "peer accepted zero bytes",
                )))
            }
            Ok(n) => {
                written += n;
                trace!(bytes = n, written, total = buf.len(), "Partial write");
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExchangeError::Write(e)),
        }
    }

    writer.flush().await.map_err(ExchangeError::Write)?;
    Ok(written)
}
