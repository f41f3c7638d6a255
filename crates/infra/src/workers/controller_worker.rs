use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use onboard_events::{EventBus, ResourceEvent, Subscription};

use crate::reconciler::ReconcileError;
use crate::store::StoreError;

const TICK: Duration = Duration::from_millis(250);

/// Delay before a key whose failure needs an external change is tried again.
const SLOW_RETRY: Duration = Duration::from_secs(2);

/// Errors the worker knows how to classify.
///
/// Every failed key is reconciled again; this only picks the delay.
pub trait Retryable: core::fmt::Debug {
    /// `true`: retry on the next tick. `false`: retry after `SLOW_RETRY`.
    fn is_retryable(&self) -> bool;
}

impl Retryable for ReconcileError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// FIFO of keys waiting to be reconciled. A key is queued at most once.
#[derive(Debug, Default)]
struct WorkQueue {
    order: VecDeque<String>,
    queued: HashSet<String>,
}

impl WorkQueue {
    fn push(&mut self, key: String) {
        if self.queued.insert(key.clone()) {
            self.order.push_back(key);
        }
    }

    fn pop(&mut self) -> Option<String> {
        let key = self.order.pop_front()?;
        self.queued.remove(&key);
        Some(key)
    }
}

/// Controller loop driving reconciliation from watch events.
///
/// - Subscribes to the watch bus
/// - Maps every event to zero or more keys and de-duplicates them
/// - Runs `reconcile` for each key; failed keys are queued again, on the
///   next tick when retryable and after a longer delay otherwise
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct ControllerWorker;

impl ControllerWorker {
    /// Spawn the worker thread.
    ///
    /// `reconcile` must be idempotent: the same key may be delivered many
    /// times, including right after the worker's own writes.
    pub fn spawn<B, M, R, ME, RE>(
        name: &'static str,
        bus: B,
        mut map: M,
        mut reconcile: R,
    ) -> std::io::Result<WorkerHandle>
    where
        B: EventBus<ResourceEvent> + Send + Sync + 'static,
        M: FnMut(&ResourceEvent) -> Result<Vec<String>, ME> + Send + 'static,
        R: FnMut(&str) -> Result<(), RE> + Send + 'static,
        ME: core::fmt::Debug + Send + 'static,
        RE: Retryable + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut map, &mut reconcile))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, R, ME, RE>(
    name: &'static str,
    sub: Subscription<ResourceEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    map: &mut M,
    reconcile: &mut R,
) where
    M: FnMut(&ResourceEvent) -> Result<Vec<String>, ME>,
    R: FnMut(&str) -> Result<(), RE>,
    ME: core::fmt::Debug,
    RE: Retryable,
{
    let mut queue = WorkQueue::default();
    let mut retry: Vec<String> = Vec::new();
    let mut slow_retry: Vec<String> = Vec::new();
    let mut last_retry = Instant::now();
    let mut last_slow_retry = Instant::now();

    let mut enqueue = |queue: &mut WorkQueue, event: ResourceEvent| match map(&event) {
        Ok(keys) => keys.into_iter().for_each(|key| queue.push(key)),
        Err(err) => warn!(
            worker = name,
            kind = event.kind(),
            object = event.name(),
            error = ?err,
            "failed to map watch event"
        ),
    };

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(TICK) {
            Ok(event) => {
                enqueue(&mut queue, event);
                for event in sub.drain() {
                    enqueue(&mut queue, event);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if last_retry.elapsed() >= TICK {
            retry.drain(..).for_each(|key| queue.push(key));
            last_retry = Instant::now();
        }
        if last_slow_retry.elapsed() >= SLOW_RETRY {
            slow_retry.drain(..).for_each(|key| queue.push(key));
            last_slow_retry = Instant::now();
        }

        while let Some(key) = queue.pop() {
            match reconcile(&key) {
                Ok(()) => debug!(worker = name, signup = %key, "reconciled"),
                Err(err) if err.is_retryable() => {
                    warn!(worker = name, signup = %key, error = ?err, "reconcile failed, retrying");
                    retry.push(key);
                }
                Err(err) => {
                    warn!(
                        worker = name,
                        signup = %key,
                        error = ?err,
                        retry_in = ?SLOW_RETRY,
                        "reconcile failed"
                    );
                    if !slow_retry.contains(&key) {
                        slow_retry.push(key);
                    }
                }
            }
        }
    }
}
