//! Async widget-class loading
//!
//! Resolution futures run as tokio tasks and report back over an unbounded
//! channel. Continuations never run on those tasks: the owner drains the
//! channel on its own thread (`dispatch_ready` / `dispatch_next`), so stack
//! state only changes between the owner's own calls. Cancelling a load drops
//! its continuation and aborts the task; a completion that arrives for a
//! cancelled load is discarded. A resolver that panics fails its load like
//! any other resolver error.

use super::error::LayoutError;
use crate::data::{SoftClassRef, WidgetClass};
use anyhow::{anyhow, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, warn};

/// Future produced by a class resolver
pub type ResolveFuture = Pin<Box<dyn Future<Output = Result<WidgetClass>> + Send + 'static>>;

/// Resolves soft class references to loaded classes
pub trait ClassResolver {
    fn resolve(&self, soft: &SoftClassRef) -> ResolveFuture;
}

/// Work to run on the owner's thread once a load finishes
pub type LoadContinuation<T> = Box<dyn FnOnce(&mut T, LoadId, Result<WidgetClass, LayoutError>)>;

/// Identifies one in-flight load; doubles as its cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load-{}", self.0)
    }
}

struct InFlight<T> {
    soft: SoftClassRef,
    continuation: LoadContinuation<T>,
    task: JoinHandle<()>,
    /// The resolver future runs in its own task so a panic in it still reports
    resolve_task: AbortHandle,
}

impl<T> InFlight<T> {
    fn abort(&self) {
        self.resolve_task.abort();
        self.task.abort();
    }
}

struct LoadCompletion {
    id: LoadId,
    result: Result<WidgetClass>,
}

pub struct AsyncLoadCoordinator<T> {
    resolver: Box<dyn ClassResolver>,
    next_id: u64,
    in_flight: HashMap<LoadId, InFlight<T>>,
    completion_tx: mpsc::UnboundedSender<LoadCompletion>,
    completion_rx: mpsc::UnboundedReceiver<LoadCompletion>,
}

impl<T> AsyncLoadCoordinator<T> {
    pub fn new(resolver: Box<dyn ClassResolver>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            resolver,
            next_id: 1,
            in_flight: HashMap::new(),
            completion_tx,
            completion_rx,
        }
    }

    /// Fails with `NoAsyncRuntime` unless called inside a tokio runtime
    pub fn ensure_runtime(&self) -> Result<(), LayoutError> {
        tokio::runtime::Handle::try_current()
            .map(|_| ())
            .map_err(|_| LayoutError::NoAsyncRuntime)
    }

    /// Start resolving `soft`; `continuation` runs exactly once when the load
    /// finishes, unless the load is cancelled first.
    pub fn request_load(
        &mut self,
        soft: SoftClassRef,
        continuation: LoadContinuation<T>,
    ) -> Result<LoadId, LayoutError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| LayoutError::NoAsyncRuntime)?;

        let id = LoadId(self.next_id);
        self.next_id += 1;

        let resolve = runtime.spawn(self.resolver.resolve(&soft));
        let resolve_task = resolve.abort_handle();
        let tx = self.completion_tx.clone();
        let task = runtime.spawn(async move {
            let result = match resolve.await {
                Ok(result) => result,
                Err(err) => Err(join_failure(err)),
            };
            // Receiver only goes away with the coordinator
            let _ = tx.send(LoadCompletion { id, result });
        });

        debug!(target: "layerstack::loader", %id, class = %soft, "requested class load");
        self.in_flight.insert(
            id,
            InFlight {
                soft,
                continuation,
                task,
                resolve_task,
            },
        );
        Ok(id)
    }

    /// Cancel a load. Its continuation will never run. Returns false if the
    /// load already finished or was cancelled.
    pub fn cancel(&mut self, id: LoadId) -> bool {
        match self.in_flight.remove(&id) {
            Some(entry) => {
                entry.abort();
                debug!(target: "layerstack::loader", %id, class = %entry.soft, "cancelled class load");
                true
            }
            None => false,
        }
    }

    /// Cancel every outstanding load
    pub fn cancel_all(&mut self) -> usize {
        let ids: Vec<LoadId> = self.in_flight.keys().copied().collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    pub fn is_pending(&self, id: LoadId) -> bool {
        self.in_flight.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Run continuations for every load that has already finished. Never blocks.
    pub fn dispatch_ready(&mut self, target: &mut T) -> usize {
        let mut dispatched = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.complete(completion, target) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Wait for the next live completion and run its continuation.
    /// Returns false immediately when nothing is in flight.
    pub async fn dispatch_next(&mut self, target: &mut T) -> bool {
        while !self.in_flight.is_empty() {
            let Some(completion) = self.completion_rx.recv().await else {
                return false;
            };
            if self.complete(completion, target) {
                return true;
            }
        }
        false
    }

    fn complete(&mut self, completion: LoadCompletion, target: &mut T) -> bool {
        let LoadCompletion { id, result } = completion;
        let Some(entry) = self.in_flight.remove(&id) else {
            debug!(target: "layerstack::loader", %id, "discarding completion of cancelled load");
            return false;
        };

        let result = result.map_err(|err| {
            warn!(target: "layerstack::loader", %id, class = %entry.soft, error = %format!("{:#}", err), "class load failed");
            LayoutError::LoadFailed {
                class: entry.soft.to_string(),
                reason: format!("{:#}", err),
            }
        });
        (entry.continuation)(target, id, result);
        true
    }
}

/// Turn a dead resolver task into an ordinary load error
fn join_failure(err: JoinError) -> anyhow::Error {
    if err.is_panic() {
        anyhow!("class load panicked: {}", panic_message(err.into_panic()))
    } else {
        anyhow!("class load task was cancelled")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<T> Drop for AsyncLoadCoordinator<T> {
    fn drop(&mut self) {
        for (_, entry) in self.in_flight.drain() {
            entry.abort();
        }
    }
}

impl<T> fmt::Debug for AsyncLoadCoordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLoadCoordinator")
            .field("pending", &self.in_flight.len())
            .finish()
    }
}
