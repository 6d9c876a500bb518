//! Real communication service implementation
//!
//! Every worker holds one persistent TCP connection to the coordinator.
//! Frames on a connection are delivered in send order, which is the only
//! ordering guarantee the protocol relies on. Each connection gets a reader
//! task feeding the shared inbound event channel and a writer task draining
//! that worker's outbound queue.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Mutex};

use shared::codec::{read_frame, write_frame};
use shared::{process_debug, process_warn, CoordinatorMessage, ProcessId, WorkerId, WorkerMessage};

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::traits::{Communicator, InboundEvent};

/// Outbound queue depth per worker; a worker never has more than one reply pending
const OUTBOUND_BUFFER: usize = 8;

/// Inbound event buffer shared by all workers
const INBOUND_BUFFER: usize = 1000;

/// Live channel to one worker
struct Connection {
    outbound: mpsc::Sender<CoordinatorMessage>,
    /// Dropping this closes the connection
    _close: oneshot::Sender<()>,
}

type ConnectionMap = Arc<Mutex<HashMap<WorkerId, Connection>>>;

/// Real communicator implementation using TCP + bincode protocol
pub struct RealCommunicator {
    /// Open worker channels keyed by the id announced in `Hello`
    connections: ConnectionMap,

    /// Active TCP listeners for cleanup
    active_listeners: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>>,
}

impl RealCommunicator {
    /// Create new communicator
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            active_listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of identified worker channels currently open
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Serve one accepted connection until it closes
    async fn serve_connection(stream: TcpStream, events: mpsc::Sender<InboundEvent>, connections: ConnectionMap) {
        let (mut reader, writer) = stream.into_split();

        // The first frame must identify the worker
        let (worker_id, pid) = match read_frame::<_, WorkerMessage>(&mut reader).await {
            Ok(Some(WorkerMessage::Hello { worker_id, pid })) => (worker_id, pid),
            Ok(Some(other)) => {
                process_warn!(
                    ProcessId::current(),
                    "🚫 Dropping connection: first frame was {} instead of hello",
                    other.kind()
                );
                return;
            }
            Ok(None) => return,
            Err(e) => {
                process_warn!(ProcessId::current(), "🚫 Dropping connection: {}", e);
                return;
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();
        {
            let mut map = connections.lock().await;
            if map.contains_key(&worker_id) {
                drop(map);
                process_warn!(
                    ProcessId::current(),
                    "🚫 Rejecting second channel claiming to be {}",
                    worker_id
                );
                return;
            }
            map.insert(
                worker_id,
                Connection {
                    outbound: outbound_tx,
                    _close: close_tx,
                },
            );
        }

        tokio::spawn(Self::write_loop(worker_id, writer, outbound_rx));

        if events.send(InboundEvent::Connected { worker_id, pid }).await.is_err() {
            connections.lock().await.remove(&worker_id);
            return;
        }
        process_debug!(ProcessId::current(), "🔗 {} connected (PID: {})", worker_id, pid);

        let reason = Self::read_loop(worker_id, reader, &events, close_rx).await;

        connections.lock().await.remove(&worker_id);
        let _ = events.send(InboundEvent::Disconnected { worker_id, reason }).await;
    }

    /// Forward frames until EOF, a read error, or a local close
    async fn read_loop(
        worker_id: WorkerId,
        mut reader: OwnedReadHalf,
        events: &mpsc::Sender<InboundEvent>,
        mut close_rx: oneshot::Receiver<()>,
    ) -> Option<String> {
        loop {
            tokio::select! {
                frame = read_frame::<_, WorkerMessage>(&mut reader) => match frame {
                    Ok(Some(message)) => {
                        if events.send(InboundEvent::Message { worker_id, message }).await.is_err() {
                            return Some("coordinator stopped listening".to_string());
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => return Some(e.to_string()),
                },
                _ = &mut close_rx => return Some("closed by coordinator".to_string()),
            }
        }
    }

    async fn write_loop(
        worker_id: WorkerId,
        mut writer: OwnedWriteHalf,
        mut outbound: mpsc::Receiver<CoordinatorMessage>,
    ) {
        while let Some(message) = outbound.recv().await {
            if let Err(e) = write_frame(&mut writer, &message).await {
                process_warn!(
                    ProcessId::current(),
                    "⚠️ Failed to send {} to {}: {}",
                    message.kind(),
                    worker_id,
                    e
                );
                break;
            }
        }
    }
}

impl Default for RealCommunicator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Communicator for RealCommunicator {
    async fn start_listener(
        &self,
        bind_addr: SocketAddr,
    ) -> CoordinatorResult<(SocketAddr, mpsc::Receiver<InboundEvent>)> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| CoordinatorError::communication(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        let connections = self.connections.clone();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _addr)) = listener.accept().await {
                tokio::spawn(Self::serve_connection(stream, tx.clone(), connections.clone()));
            }
        });

        // Store handle for cleanup
        {
            let mut listeners = self.active_listeners.lock().await;
            listeners.push(handle);
        }

        process_debug!(ProcessId::current(), "🏭 Worker listener started on {}", local_addr);
        Ok((local_addr, rx))
    }

    async fn send(&self, worker_id: WorkerId, message: CoordinatorMessage) -> CoordinatorResult<()> {
        let outbound = {
            let connections = self.connections.lock().await;
            connections
                .get(&worker_id)
                .map(|c| c.outbound.clone())
                .ok_or(CoordinatorError::WorkerNotConnected { worker_id })?
        };

        outbound
            .send(message)
            .await
            .map_err(|_| CoordinatorError::WorkerNotConnected { worker_id })?;
        Ok(())
    }

    async fn disconnect(&self, worker_id: WorkerId) -> CoordinatorResult<()> {
        if self.connections.lock().await.remove(&worker_id).is_some() {
            process_debug!(ProcessId::current(), "🔌 Closed channel to {}", worker_id);
        }
        Ok(())
    }

    async fn shutdown(&self) -> CoordinatorResult<()> {
        // Cancel all active listeners
        let listeners = {
            let mut active = self.active_listeners.lock().await;
            std::mem::take(&mut *active)
        };

        for handle in listeners {
            handle.abort();
        }

        self.connections.lock().await.clear();

        process_debug!(ProcessId::current(), "🔌 Communication channels shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::TaskId;
    use std::time::Duration;
    use tokio::time::timeout;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    async fn next_event(rx: &mut mpsc::Receiver<InboundEvent>) -> InboundEvent {
        timeout(TEST_TIMEOUT, rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
    }

    async fn connect_as(addr: SocketAddr, worker_id: WorkerId) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_frame(&mut stream, &WorkerMessage::Hello { worker_id, pid: 4242 })
            .await
            .unwrap();
        stream
    }

    #[tokio::test]
    async fn test_communicator_creation() {
        let comm = RealCommunicator::new();
        assert_eq!(comm.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_hello_then_messages_in_order() {
        let comm = RealCommunicator::new();
        let (addr, mut rx) = comm.start_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let mut stream = connect_as(addr, WorkerId(1)).await;
        write_frame(&mut stream, &WorkerMessage::RequestTask).await.unwrap();

        assert_eq!(
            next_event(&mut rx).await,
            InboundEvent::Connected { worker_id: WorkerId(1), pid: 4242 }
        );
        assert_eq!(
            next_event(&mut rx).await,
            InboundEvent::Message { worker_id: WorkerId(1), message: WorkerMessage::RequestTask }
        );

        let task = TaskId::new("en-US").unwrap();
        comm.send(WorkerId(1), CoordinatorMessage::Assign { task: task.clone() })
            .await
            .unwrap();
        let reply: Option<CoordinatorMessage> = timeout(TEST_TIMEOUT, read_frame(&mut stream))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply, Some(CoordinatorMessage::Assign { task }));

        drop(stream);
        assert_eq!(
            next_event(&mut rx).await,
            InboundEvent::Disconnected { worker_id: WorkerId(1), reason: None }
        );
        assert_eq!(comm.connection_count().await, 0);

        comm.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_without_hello_is_dropped() {
        let comm = RealCommunicator::new();
        let (addr, mut rx) = comm.start_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_frame(&mut stream, &WorkerMessage::RequestTask).await.unwrap();

        // The coordinator closes the socket and never reports the connection
        let closed: Option<CoordinatorMessage> = timeout(TEST_TIMEOUT, read_frame(&mut stream))
            .await
            .unwrap()
            .unwrap();
        assert!(closed.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_closes_worker_socket() {
        let comm = RealCommunicator::new();
        let (addr, mut rx) = comm.start_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let mut stream = connect_as(addr, WorkerId(3)).await;
        next_event(&mut rx).await;

        comm.disconnect(WorkerId(3)).await.unwrap();

        let closed: Option<CoordinatorMessage> = timeout(TEST_TIMEOUT, read_frame(&mut stream))
            .await
            .unwrap()
            .unwrap();
        assert!(closed.is_none());
        assert!(matches!(
            next_event(&mut rx).await,
            InboundEvent::Disconnected { worker_id: WorkerId(3), reason: Some(_) }
        ));

        let err = comm.send(WorkerId(3), CoordinatorMessage::Terminate).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::WorkerNotConnected { .. }));
    }

    #[tokio::test]
    async fn test_send_to_unknown_worker_fails() {
        let comm = RealCommunicator::new();
        let err = comm.send(WorkerId(7), CoordinatorMessage::Terminate).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::WorkerNotConnected { .. }));
    }
}
