//! Worker pool that runs requests off the calling thread and hands back
//! completions through a channel.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::TrySendError;
use orrery_lod::LodSelector;

use crate::protocol::{Request, Response};
use crate::worker::Worker;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Worker threads to spawn. `0` picks one per core, minus one for the
    /// calling thread.
    pub worker_count: usize,
    /// Maximum requests queued or executing at once. Clamped to at least 1.
    pub max_in_flight: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            worker_count: 0,
            max_in_flight: 64,
        }
    }
}

impl DispatchSettings {
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            0 => (num_cpus::get().max(2) - 1).max(1),
            n => n,
        }
    }
}

/// Identifies one submission; echoed on its [`Completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskTicket(u64);

impl TaskTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub ticket: TaskTicket,
    /// Id of the worker that ran it.
    pub worker: usize,
    pub response: Response,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("in-flight budget of {budget} tasks is exhausted")]
    Saturated { budget: usize },

    #[error("dispatcher has been shut down")]
    ShutDown,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

enum Payload {
    Typed(Request),
    Encoded(String),
}

struct Job {
    ticket: TaskTicket,
    payload: Payload,
}

/// Fans requests out to a fixed pool of worker threads.
///
/// The caller submits with [`submit`](Self::submit) and collects finished
/// work with [`drain_completions`](Self::drain_completions) once per frame.
/// Nothing here blocks the caller. Completions arrive in whatever order
/// workers finish them.
pub struct TaskDispatcher {
    task_sender: Option<crossbeam_channel::Sender<Job>>,
    completion_receiver: crossbeam_channel::Receiver<Completion>,
    worker_handles: Vec<JoinHandle<()>>,
    budget: usize,
    in_flight: Arc<AtomicUsize>,
    next_ticket: AtomicU64,
}

impl TaskDispatcher {
    /// Spawn the worker pool. Each worker gets its own clone of `selector`.
    pub fn new(settings: DispatchSettings, selector: LodSelector) -> Result<Self, DispatchError> {
        let worker_count = settings.resolved_worker_count();
        let budget = settings.max_in_flight.max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded::<Job>(budget);
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();

        // Built up front so a failed spawn drops it, which joins the workers
        // already running.
        let mut dispatcher = Self {
            task_sender: Some(task_tx),
            completion_receiver: completion_rx,
            worker_handles: Vec::with_capacity(worker_count),
            budget,
            in_flight: Arc::new(AtomicUsize::new(0)),
            next_ticket: AtomicU64::new(0),
        };

        for id in 0..worker_count {
            let rx = task_rx.clone();
            let tx = completion_tx.clone();
            let flight = Arc::clone(&dispatcher.in_flight);
            let mut worker = Worker::new(id, selector.clone());

            let handle = std::thread::Builder::new()
                .name(format!("orrery-worker-{id}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        let response = match job.payload {
                            Payload::Typed(request) => Some(worker.handle(request)),
                            Payload::Encoded(text) => worker.handle_encoded(&text),
                        };
                        if let Some(response) = response {
                            let _ = tx.send(Completion {
                                ticket: job.ticket,
                                worker: worker.id(),
                                response,
                            });
                        }
                        flight.fetch_sub(1, Ordering::AcqRel);
                    }
                    tracing::debug!(worker = worker.id(), stats = ?worker.stats(), "worker exiting");
                })?;
            dispatcher.worker_handles.push(handle);
        }

        tracing::info!(workers = worker_count, budget, "task dispatcher started");
        Ok(dispatcher)
    }

    /// Queue a typed request.
    pub fn submit(&self, request: Request) -> Result<TaskTicket, DispatchError> {
        self.enqueue(Payload::Typed(request))
    }

    /// Queue a JSON request. A message the worker cannot decode is dropped
    /// with a warning and its ticket never completes.
    pub fn submit_encoded(&self, text: impl Into<String>) -> Result<TaskTicket, DispatchError> {
        self.enqueue(Payload::Encoded(text.into()))
    }

    fn enqueue(&self, payload: Payload) -> Result<TaskTicket, DispatchError> {
        let sender = self.task_sender.as_ref().ok_or(DispatchError::ShutDown)?;

        let budget = self.budget;
        if self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < budget).then_some(n + 1)
            })
            .is_err()
        {
            return Err(DispatchError::Saturated { budget });
        }

        let ticket = TaskTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        sender
            .try_send(Job { ticket, payload })
            .map_err(|err| {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                match err {
                    TrySendError::Full(_) => DispatchError::Saturated { budget },
                    TrySendError::Disconnected(_) => DispatchError::ShutDown,
                }
            })?;
        Ok(ticket)
    }

    /// Collect every completion that has arrived so far. Never blocks.
    pub fn drain_completions(&self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.completion_receiver.try_recv() {
            completions.push(completion);
        }
        completions
    }

    /// Requests queued or executing.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn is_shut_down(&self) -> bool {
        self.task_sender.is_none()
    }

    /// Stop accepting work, let workers finish what is queued, and join them.
    /// Completions produced meanwhile remain drainable.
    pub fn shutdown(&mut self) {
        if self.task_sender.take().is_none() {
            return;
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
        tracing::info!("task dispatcher shut down");
    }
}

impl Drop for TaskDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
