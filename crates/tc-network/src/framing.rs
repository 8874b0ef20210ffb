//! Length-delimited framing for sessions.
//!
//! Frames are `[u32 big-endian length][payload]`. The length is checked
//! against the configured maximum before any payload is buffered.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{trace, warn};

use crate::error::{ProtocolError, TransportError};

const LEN_PREFIX_BYTES: usize = 4;

/// Default maximum frame size (8 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_bytes: usize,
}

impl FrameCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LEN_PREFIX_BYTES {
            return Ok(None);
        }

        let mut len_buf = [0u8; LEN_PREFIX_BYTES];
        len_buf.copy_from_slice(&src[..LEN_PREFIX_BYTES]);
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > self.max_frame_bytes {
            warn!(
                stage = "read_len_prefix",
                len,
                max = self.max_frame_bytes,
                "rejecting oversize frame"
            );
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_frame_bytes,
            }
            .into());
        }

        let total = LEN_PREFIX_BYTES + len;
        if src.len() < total {
            // Partial payload: keep what we have and wait for more.
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX_BYTES);
        trace!(stage = "read_payload", len, "frame complete");
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = payload.len();
        if len > self.max_frame_bytes {
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_frame_bytes,
            }
            .into());
        }
        let prefix = u32::try_from(len).map_err(|_| ProtocolError::FrameTooLarge {
            len,
            max: u32::MAX as usize,
        })?;

        trace!(stage = "write_len_prefix", len, "writing frame");
        dst.reserve(LEN_PREFIX_BYTES + len);
        dst.put_u32(prefix);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

/// A byte stream viewed as a sequence of frames.
///
/// `receive` is cancel-safe: bytes of a partially read frame stay buffered
/// in the codec and the next call resumes where the last one stopped.
pub struct FramedTransport<S> {
    framed: Framed<S, FrameCodec>,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S, max_frame_bytes: usize) -> Self {
        Self {
            framed: Framed::new(io, FrameCodec::new(max_frame_bytes)),
        }
    }

    /// Write one frame and flush it.
    pub async fn send(&mut self, payload: Bytes) -> Result<(), TransportError> {
        self.framed.send(payload).await
    }

    /// Read the next complete frame.
    ///
    /// Returns [`TransportError::Eof`] once the peer has closed the stream
    /// on a frame boundary.
    pub async fn receive(&mut self) -> Result<Bytes, TransportError> {
        match self.framed.next().await {
            Some(Ok(frame)) => Ok(frame.freeze()),
            Some(Err(err)) => Err(err),
            None => Err(TransportError::Eof),
        }
    }

    /// Flush pending frames and shut down the write half.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<Bytes>::close(&mut self.framed).await
    }

    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.framed.codec().max_frame_bytes()
    }
}
