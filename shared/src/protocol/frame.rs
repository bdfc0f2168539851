//! Frame codec for vectors of `f64`.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────┐
//! │ Length           │ Payload                          │
//! │ 8 bytes, u64 LE  │ `Length` bytes = N × f64 LE      │
//! └──────────────────┴──────────────────────────────────┘
//! ```
//!
//! Frames follow each other with no delimiter other than the length prefix.
//! The codec is direction-agnostic; it only buffers what it needs to assemble
//! one frame, and reuses those buffers across calls.

use crate::types::vector::Vector;
use bytes::{Buf, BufMut, BytesMut};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Header size in bytes (a single little-endian `u64`).
pub const HEADER_SIZE: usize = 8;

/// Encoded size of one vector component.
pub const VALUE_SIZE: usize = std::mem::size_of::<f64>();

/// Default maximum payload size (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u64 = 64 * 1024 * 1024;

/// Malformed or truncated frame. Fatal to the connection it was read from.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The stream closed after some, but not all, header bytes.
    #[error("stream closed inside frame header ({read} of {} bytes)", HEADER_SIZE)]
    PartialHeader { read: usize },

    /// The stream closed before the announced payload was complete.
    #[error("stream closed mid-payload ({read} of {expected} bytes)")]
    Truncated { expected: usize, read: usize },

    /// Payload length is not a whole number of doubles.
    #[error("misaligned payload: {0} bytes is not a multiple of {}", VALUE_SIZE)]
    MisalignedPayload(u64),

    /// Payload length exceeds the configured maximum.
    #[error("payload of {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: u64, max: u64 },

    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// True when the error means the peer went away rather than sent garbage.
    pub fn is_disconnect(&self) -> bool {
        match self {
            FramingError::Io(e) => is_disconnect(e),
            _ => false,
        }
    }
}

/// Classify an I/O error as an ordinary peer disconnect.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

/// Append one encoded frame for `vector` to `dst`.
pub fn encode(vector: &[f64], dst: &mut BytesMut) {
    let payload_len = vector.len() * VALUE_SIZE;
    dst.reserve(HEADER_SIZE + payload_len);
    dst.put_u64_le(payload_len as u64);
    for value in vector {
        dst.put_f64_le(*value);
    }
}

/// Decode a complete payload (header already stripped) into a vector.
pub fn decode_payload(payload: &[u8]) -> Result<Vector, FramingError> {
    if payload.len() % VALUE_SIZE != 0 {
        return Err(FramingError::MisalignedPayload(payload.len() as u64));
    }

    let mut buf = payload;
    let mut vector = Vec::with_capacity(payload.len() / VALUE_SIZE);
    while buf.has_remaining() {
        vector.push(buf.get_f64_le());
    }
    Ok(vector)
}

/// Reads and writes frames on a byte stream, reusing its scratch buffers.
#[derive(Debug)]
pub struct FrameCodec {
    max_payload: u64,
    read_buf: Vec<u8>,
    write_buf: BytesMut,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a codec with the default payload limit.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a codec that rejects payloads above `max_payload` bytes.
    pub fn with_max_payload(max_payload: u64) -> Self {
        Self {
            max_payload,
            read_buf: Vec::new(),
            write_buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly at a frame boundary.
    /// A stream that ends anywhere else is a [`FramingError`].
    pub async fn read_frame<R>(&mut self, reader: &mut R) -> Result<Option<Vector>, FramingError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            let n = reader.read(&mut header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(FramingError::PartialHeader { read: filled });
            }
            filled += n;
        }

        let payload_len = u64::from_le_bytes(header);
        if payload_len % VALUE_SIZE as u64 != 0 {
            return Err(FramingError::MisalignedPayload(payload_len));
        }
        if payload_len > self.max_payload {
            return Err(FramingError::PayloadTooLarge {
                len: payload_len,
                max: self.max_payload,
            });
        }

        let expected = payload_len as usize;
        self.read_buf.clear();
        self.read_buf.resize(expected, 0);
        let mut read = 0;
        while read < expected {
            let n = reader.read(&mut self.read_buf[read..]).await?;
            if n == 0 {
                return Err(FramingError::Truncated { expected, read });
            }
            read += n;
        }

        decode_payload(&self.read_buf).map(Some)
    }

    /// Encode `vector` and write it as a single frame, then flush.
    pub async fn write_frame<W>(&mut self, writer: &mut W, vector: &[f64]) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.write_buf.clear();
        encode(vector, &mut self.write_buf);
        writer.write_all(&self.write_buf).await?;
        writer.flush().await
    }
}
