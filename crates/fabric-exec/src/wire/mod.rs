//! Peer handshake over TCP.
//!
//! Every message is one JSON object terminated by `\n`. The connecting side sends a
//! [`fabric_model::PeerHello`] and the listener answers with a [`fabric_model::PeerAck`].
mod connector;
mod server;

pub use connector::TcpPeerConnector;
pub use server::HandshakeServer;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ExecError, ExecResult};

/// Largest accepted frame, newline included.
pub const MAX_FRAME_BYTES: usize = 4096;

/// Serialize `msg` as one newline-terminated JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> ExecResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(msg)?;
    buf.push(b'\n');
    if buf.len() > MAX_FRAME_BYTES {
        return Err(ExecError::FrameTooLarge {
            limit: MAX_FRAME_BYTES,
        });
    }
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. A final frame without a trailing newline is accepted at EOF.
pub async fn read_frame<R, T>(reader: &mut R) -> ExecResult<T>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = Vec::with_capacity(256);
    let n = (&mut *reader)
        .take(MAX_FRAME_BYTES as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Err(ExecError::Closed);
    }
    if buf.len() > MAX_FRAME_BYTES {
        return Err(ExecError::FrameTooLarge {
            limit: MAX_FRAME_BYTES,
        });
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(serde_json::from_slice(&buf)?)
}
