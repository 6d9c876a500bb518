//! IPC communicator implementation for coordinator communication

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use shared::codec::{read_frame, write_frame};
use shared::{process_debug, CoordinatorMessage, ProcessId, WorkerId, WorkerMessage};

use crate::error::{WorkerError, WorkerResult};
use crate::traits::IpcCommunicator;

/// Real IPC communicator using TCP + bincode frames
pub struct RealIpcCommunicator<S = TcpStream> {
    stream: S,
}

impl RealIpcCommunicator<TcpStream> {
    /// Connect to the coordinator and bind the channel to `worker_id`
    pub async fn connect(addr: SocketAddr, worker_id: WorkerId) -> WorkerResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        process_debug!(ProcessId::current(), "🔌 Connected to coordinator at {}", addr);

        Self::from_stream(stream, worker_id).await
    }
}

impl<S> RealIpcCommunicator<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already open stream and send the `Hello` frame on it
    pub async fn from_stream(mut stream: S, worker_id: WorkerId) -> WorkerResult<Self> {
        let hello = WorkerMessage::Hello {
            worker_id,
            pid: std::process::id(),
        };
        write_frame(&mut stream, &hello).await?;
        Ok(Self { stream })
    }
}

#[async_trait]
impl<S> IpcCommunicator for RealIpcCommunicator<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: WorkerMessage) -> WorkerResult<()> {
        if matches!(message, WorkerMessage::Hello { .. }) {
            return Err(WorkerError::ProtocolViolation {
                message: "hello is only sent when the channel opens".to_string(),
            });
        }
        write_frame(&mut self.stream, &message).await?;
        Ok(())
    }

    async fn recv(&mut self) -> WorkerResult<Option<CoordinatorMessage>> {
        Ok(read_frame(&mut self.stream).await?)
    }
}
