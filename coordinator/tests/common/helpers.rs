//! Test helpers for coordinator tests
//!
//! [`SimulatedPool`] stands in for both the worker channels and the worker
//! processes. Each simulated worker is a tokio task speaking the protocol
//! through in-memory queues, with small random delays so results arrive in
//! varying order.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{mpsc, watch};

use coordinator::{
    Communicator, Coordinator, CoordinatorError, CoordinatorResult, InboundEvent, MockFileSystem, ProcessManager,
    RunConfig, RunReport, SpawnedWorker,
};
use shared::{CoordinatorMessage, ExitRecord, TaskId, WorkerId, WorkerMessage};

use super::fixtures::TestFixtures;

/// How a simulated worker treats one task
#[derive(Debug, Clone, Copy)]
enum TaskBehaviour {
    Report(f64),
    Crash,
    Hang,
}

#[derive(Default)]
struct PoolLog {
    sent: Vec<(WorkerId, CoordinatorMessage)>,
    disconnected: Vec<WorkerId>,
    stop_requests: usize,
}

struct PoolInner {
    events: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    inboxes: Mutex<HashMap<WorkerId, mpsc::Sender<CoordinatorMessage>>>,
    behaviour: HashMap<TaskId, TaskBehaviour>,
    default_accuracy: f64,
    max_delay_ms: u64,
    log: Mutex<PoolLog>,
    stop_tx: watch::Sender<bool>,
}

/// In-memory worker pool implementing both [`Communicator`] and [`ProcessManager`]
#[derive(Clone)]
pub struct SimulatedPool {
    inner: Arc<PoolInner>,
}

/// Builder for [`SimulatedPool`]
pub struct SimulatedPoolBuilder {
    behaviour: HashMap<TaskId, TaskBehaviour>,
    default_accuracy: f64,
    max_delay_ms: u64,
}

impl SimulatedPoolBuilder {
    /// Report this accuracy for `task`
    pub fn with_accuracy(mut self, task: &str, accuracy: f64) -> Self {
        self.behaviour.insert(TestFixtures::task(task), TaskBehaviour::Report(accuracy));
        self
    }

    /// Die with a non-zero exit while holding `task`
    pub fn crashing_on(mut self, task: &str) -> Self {
        self.behaviour.insert(TestFixtures::task(task), TaskBehaviour::Crash);
        self
    }

    /// Never finish `task` until the pool is stopped
    pub fn hanging_on(mut self, task: &str) -> Self {
        self.behaviour.insert(TestFixtures::task(task), TaskBehaviour::Hang);
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn build(self) -> SimulatedPool {
        let (stop_tx, _) = watch::channel(false);
        SimulatedPool {
            inner: Arc::new(PoolInner {
                events: Mutex::new(None),
                inboxes: Mutex::new(HashMap::new()),
                behaviour: self.behaviour,
                default_accuracy: self.default_accuracy,
                max_delay_ms: self.max_delay_ms,
                log: Mutex::new(PoolLog::default()),
                stop_tx,
            }),
        }
    }
}

impl SimulatedPool {
    pub fn builder() -> SimulatedPoolBuilder {
        SimulatedPoolBuilder {
            behaviour: HashMap::new(),
            default_accuracy: TestFixtures::DEFAULT_ACCURACY,
            max_delay_ms: 5,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Every message the coordinator sent, in send order
    pub fn sent(&self) -> Vec<(WorkerId, CoordinatorMessage)> {
        self.inner.log.lock().unwrap().sent.clone()
    }

    /// Tasks assigned, in assignment order
    pub fn assignments(&self) -> Vec<TaskId> {
        self.sent()
            .into_iter()
            .filter_map(|(_, message)| match message {
                CoordinatorMessage::Assign { task } => Some(task),
                CoordinatorMessage::Terminate => None,
            })
            .collect()
    }

    /// Workers that received `Terminate`, deduplicated
    pub fn terminated_workers(&self) -> HashSet<WorkerId> {
        self.sent()
            .into_iter()
            .filter(|(_, message)| *message == CoordinatorMessage::Terminate)
            .map(|(worker_id, _)| worker_id)
            .collect()
    }

    /// Workers that were told to stop before ever receiving a task
    pub fn terminated_without_assign(&self) -> HashSet<WorkerId> {
        let assigned: HashSet<WorkerId> = self
            .sent()
            .into_iter()
            .filter(|(_, message)| matches!(message, CoordinatorMessage::Assign { .. }))
            .map(|(worker_id, _)| worker_id)
            .collect();
        self.terminated_workers().difference(&assigned).copied().collect()
    }

    pub fn disconnected(&self) -> Vec<WorkerId> {
        self.inner.log.lock().unwrap().disconnected.clone()
    }

    pub fn stop_requests(&self) -> usize {
        self.inner.log.lock().unwrap().stop_requests
    }

    fn behaviour_for(&self, task: &TaskId) -> TaskBehaviour {
        self.inner
            .behaviour
            .get(task)
            .copied()
            .unwrap_or(TaskBehaviour::Report(self.inner.default_accuracy))
    }

    fn random_delay(&self) -> Duration {
        let max = self.inner.max_delay_ms;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Body of one simulated worker process
    async fn run_worker(
        self,
        worker_id: WorkerId,
        events: mpsc::Sender<InboundEvent>,
        mut inbox: mpsc::Receiver<CoordinatorMessage>,
        exits: mpsc::Sender<ExitRecord>,
    ) {
        let mut stop_rx = self.inner.stop_tx.subscribe();
        let _ = events
            .send(InboundEvent::Connected { worker_id, pid: 10_000 + worker_id.0 })
            .await;

        let record = loop {
            let message = |message| InboundEvent::Message { worker_id, message };
            let _ = events.send(message(WorkerMessage::RequestTask)).await;

            let reply = tokio::select! {
                reply = inbox.recv() => reply,
                _ = stop_rx.wait_for(|stop| *stop) => None,
            };

            match reply {
                Some(CoordinatorMessage::Assign { task }) => {
                    tokio::time::sleep(self.random_delay()).await;
                    match self.behaviour_for(&task) {
                        TaskBehaviour::Report(accuracy) => {
                            let _ = events.send(message(WorkerMessage::Result { task, accuracy })).await;
                        }
                        TaskBehaviour::Crash => break ExitRecord::abnormal(worker_id, Some(101), None),
                        TaskBehaviour::Hang => {
                            let _ = stop_rx.wait_for(|stop| *stop).await;
                            break ExitRecord::abnormal(worker_id, None, Some(15));
                        }
                    }
                }
                Some(CoordinatorMessage::Terminate) => break ExitRecord::normal(worker_id),
                // Channel closed by the coordinator, or pool stopped
                None => break ExitRecord::abnormal(worker_id, Some(1), None),
            }
        };

        self.inner.inboxes.lock().unwrap().remove(&worker_id);
        let reason = (!record.is_normal()).then(|| "worker process ended".to_string());
        let _ = events.send(InboundEvent::Disconnected { worker_id, reason }).await;
        let _ = exits.send(record).await;
    }
}

#[async_trait]
impl Communicator for SimulatedPool {
    async fn start_listener(
        &self,
        _bind_addr: SocketAddr,
    ) -> CoordinatorResult<(SocketAddr, mpsc::Receiver<InboundEvent>)> {
        let (tx, rx) = mpsc::channel(256);
        *self.inner.events.lock().unwrap() = Some(tx);
        Ok(("127.0.0.1:6001".parse().unwrap(), rx))
    }

    async fn send(&self, worker_id: WorkerId, message: CoordinatorMessage) -> CoordinatorResult<()> {
        let inbox = self
            .inner
            .inboxes
            .lock()
            .unwrap()
            .get(&worker_id)
            .cloned()
            .ok_or(CoordinatorError::WorkerNotConnected { worker_id })?;

        self.inner.log.lock().unwrap().sent.push((worker_id, message.clone()));
        inbox
            .send(message)
            .await
            .map_err(|_| CoordinatorError::WorkerNotConnected { worker_id })
    }

    async fn disconnect(&self, worker_id: WorkerId) -> CoordinatorResult<()> {
        self.inner.inboxes.lock().unwrap().remove(&worker_id);
        self.inner.log.lock().unwrap().disconnected.push(worker_id);
        Ok(())
    }

    async fn shutdown(&self) -> CoordinatorResult<()> {
        self.inner.events.lock().unwrap().take();
        Ok(())
    }
}

#[async_trait]
impl ProcessManager for SimulatedPool {
    async fn spawn_pool(
        &self,
        count: u32,
        _coordinator_addr: SocketAddr,
        exits: mpsc::Sender<ExitRecord>,
    ) -> CoordinatorResult<Vec<SpawnedWorker>> {
        let events = self
            .inner
            .events
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoordinatorError::communication("listener not started"))?;

        let mut spawned = Vec::new();
        for i in 1..=count {
            let worker_id = WorkerId(i);
            let (inbox_tx, inbox_rx) = mpsc::channel(4);
            self.inner.inboxes.lock().unwrap().insert(worker_id, inbox_tx);

            tokio::spawn(self.clone().run_worker(worker_id, events.clone(), inbox_rx, exits.clone()));
            spawned.push(SpawnedWorker { worker_id, pid: Some(10_000 + i) });
        }
        Ok(spawned)
    }

    async fn stop_all(&self) -> CoordinatorResult<()> {
        self.inner.log.lock().unwrap().stop_requests += 1;
        self.inner.stop_tx.send_replace(true);
        Ok(())
    }
}

/// Common assertions and runners
pub struct TestHelpers;

impl TestHelpers {
    /// File system mock that must not be touched (allow-list runs, no report)
    pub fn unused_file_system() -> MockFileSystem {
        MockFileSystem::new()
    }

    /// Coordinator wired to a simulated pool
    pub fn coordinator(
        config: RunConfig,
        pool: &SimulatedPool,
        file_system: MockFileSystem,
    ) -> Coordinator<SimulatedPool, SimulatedPool, MockFileSystem> {
        Coordinator::new(config, pool.clone(), pool.clone(), file_system)
    }

    /// Run to completion, failing the test if the run hangs
    pub async fn run_to_completion(
        coordinator: &mut Coordinator<SimulatedPool, SimulatedPool, MockFileSystem>,
    ) -> CoordinatorResult<RunReport> {
        tokio::time::timeout(Duration::from_millis(TestFixtures::RUN_TIMEOUT_MS), coordinator.run())
            .await
            .expect("run did not terminate")
    }

    /// Simulate the whole run for an allow-list and pool size
    pub async fn simulate(tasks: Vec<TaskId>, pool_size: u32, pool: &SimulatedPool) -> RunReport {
        let mut coordinator = Self::coordinator(TestFixtures::config(tasks, pool_size), pool, Self::unused_file_system());
        Self::run_to_completion(&mut coordinator).await.unwrap()
    }

    /// Each task appears at most once among the assignments
    pub fn assert_unique_assignments(pool: &SimulatedPool) {
        let assignments = pool.assignments();
        let unique: HashSet<&TaskId> = assignments.iter().collect();
        assert_eq!(unique.len(), assignments.len(), "duplicate assignment in {assignments:?}");
    }
}
