//! Length-prefixed bincode framing for the coordinator ↔ worker channel
//!
//! Every frame on the wire is
//!
//! ```text
//! +----------------+------------------------------------------+
//! | len: u32 (BE)  | bincode(Envelope { version, payload })   |
//! +----------------+------------------------------------------+
//! ```
//!
//! The envelope's `version` is decoded on its own before the payload, so a
//! peer built against a different protocol revision is rejected with
//! [`SharedError::VersionMismatch`] instead of a confusing decode error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{SharedError, SharedResult};

/// Revision of the message set in [`crate::messages::worker`]
pub const PROTOCOL_VERSION: u16 = 1;

/// Upper bound on a single frame body
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Versioned wrapper around every message on the wire
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub version: u16,
    pub payload: T,
}

/// Encode a payload into a complete frame, length prefix included
pub fn encode<T: Serialize>(payload: &T) -> SharedResult<Vec<u8>> {
    let envelope = Envelope {
        version: PROTOCOL_VERSION,
        payload,
    };
    let body = bincode::serialize(&envelope).map_err(|e| SharedError::SerializationError {
        message: e.to_string(),
    })?;

    if body.len() > MAX_FRAME_LEN {
        return Err(SharedError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode a frame body (without the length prefix)
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> SharedResult<T> {
    let version: u16 = bincode::deserialize(body).map_err(|e| SharedError::DeserializationError {
        message: format!("envelope header: {e}"),
    })?;
    if version != PROTOCOL_VERSION {
        return Err(SharedError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            found: version,
        });
    }

    let envelope: Envelope<T> = bincode::deserialize(body).map_err(|e| SharedError::DeserializationError {
        message: e.to_string(),
    })?;
    Ok(envelope.payload)
}

/// Write one message as a frame and flush it
pub async fn write_frame<W, T>(writer: &mut W, payload: &T) -> SharedResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one message frame
///
/// Returns `Ok(None)` when the peer closed the channel cleanly between
/// frames. EOF in the middle of a frame is an error.
pub async fn read_frame<R, T>(reader: &mut R) -> SharedResult<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(SharedError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    decode(&body).map(Some)
}
