//! Test helper functions and utilities
//!
//! [`TestHelpers::scripted_coordinator`] plays the coordinator's side of a
//! duplex channel: it hands out the given tasks in order, one per request,
//! then answers with `Terminate`.

use std::collections::VecDeque;

use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

use shared::codec::{read_frame, write_frame};
use shared::{CoordinatorMessage, TaskId, WorkerId, WorkerMessage};
use worker::services::RealIpcCommunicator;

pub struct TestHelpers;

impl TestHelpers {
    /// Worker-side communicator wired to a scripted coordinator
    ///
    /// The handle resolves to every message the coordinator received once
    /// the worker side is dropped.
    pub async fn scripted_channel(
        worker_id: WorkerId,
        tasks: Vec<TaskId>,
    ) -> (RealIpcCommunicator<DuplexStream>, JoinHandle<Vec<WorkerMessage>>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let coordinator = tokio::spawn(Self::scripted_coordinator(server, tasks));
        let communicator = RealIpcCommunicator::from_stream(client, worker_id).await.unwrap();
        (communicator, coordinator)
    }

    pub async fn scripted_coordinator(mut stream: DuplexStream, tasks: Vec<TaskId>) -> Vec<WorkerMessage> {
        let mut pending: VecDeque<TaskId> = tasks.into();
        let mut received = Vec::new();

        while let Ok(Some(message)) = read_frame::<_, WorkerMessage>(&mut stream).await {
            let reply = match &message {
                WorkerMessage::RequestTask => Some(match pending.pop_front() {
                    Some(task) => CoordinatorMessage::Assign { task },
                    None => CoordinatorMessage::Terminate,
                }),
                _ => None,
            };
            received.push(message);

            if let Some(reply) = reply {
                if write_frame(&mut stream, &reply).await.is_err() {
                    break;
                }
            }
        }

        received
    }

    /// Coordinator that reads the hello and the first request, then hangs up
    pub async fn hang_up_after_request(mut stream: DuplexStream) {
        for _ in 0..2 {
            let _ = read_frame::<_, WorkerMessage>(&mut stream).await;
        }
    }
}
