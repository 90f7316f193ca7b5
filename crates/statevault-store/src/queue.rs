// ABOUTME: Single-consumer ordered task runner for durable writes.
// ABOUTME: Tasks run strictly in submission order, one at a time, and cannot wedge the drain.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};

type Task = BoxFuture<'static, ()>;

/// An ordered queue of asynchronous tasks drained by a single worker.
///
/// `enqueue` appends and returns immediately; the worker picks tasks up in
/// submission order and awaits each one to settlement before the next, so no
/// two tasks ever run concurrently. Tasks have output `()`: fallible work
/// must fold its error inside the task, which is what keeps the drain
/// oblivious to outcomes. A task that panics is caught and logged; the
/// drain always makes forward progress.
///
/// Handles are cheap clones sharing one worker. Construct one queue per
/// ordering domain and pass it explicitly; all writes submitted through
/// clones of the same queue are totally ordered.
#[derive(Clone)]
pub struct SerialTaskQueue {
    tx: mpsc::UnboundedSender<Task>,
    depth: watch::Sender<usize>,
}

impl SerialTaskQueue {
    /// Create a queue and spawn its worker. Must be called within a tokio
    /// runtime. The worker exits once every handle is dropped, after
    /// finishing any tasks already submitted.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (depth, _) = watch::channel(0usize);
        tokio::spawn(drain(rx, depth.clone()));
        Self { tx, depth }
    }

    /// Append a task to the pending sequence. Returns immediately; the task
    /// runs after every task enqueued before it, on any handle, has settled.
    pub fn enqueue(&self, task: impl Future<Output = ()> + Send + 'static) {
        self.depth.send_modify(|n| *n += 1);
        if self.tx.send(Box::pin(task)).is_err() {
            // Worker already gone (runtime shutdown); the task is dropped.
            self.depth.send_modify(|n| *n -= 1);
        }
    }

    /// Number of tasks submitted but not yet settled.
    pub fn depth(&self) -> usize {
        *self.depth.borrow()
    }

    /// True when no submitted task is pending or in flight.
    pub fn is_idle(&self) -> bool {
        self.depth() == 0
    }

    /// Wait until every task submitted so far has settled.
    pub async fn idle(&self) {
        let mut rx = self.depth.subscribe();
        loop {
            if *rx.borrow_and_update() == 0 {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for SerialTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<Task>, depth: watch::Sender<usize>) {
    while let Some(task) = rx.recv().await {
        if AssertUnwindSafe(task).catch_unwind().await.is_err() {
            tracing::warn!("queued task panicked; continuing drain");
        }
        depth.send_modify(|n| *n -= 1);
    }
}
