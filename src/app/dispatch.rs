//! Bounded worker pool for pipeline runs.
//!
//! Each request becomes a tokio task that waits for a permit, runs the
//! blocking pipeline under a timeout, and reports a [`Completion`].

use crate::location::{Fix, LocationError, LocationResolver, LocationSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub source: LocationSource,
    pub result: Result<Fix, LocationError>,
}

pub struct Dispatcher {
    resolver: Arc<LocationResolver>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    completions: mpsc::UnboundedSender<Completion>,
    next_id: u64,
    in_flight: HashMap<RequestId, (LocationSource, AbortHandle)>,
}

impl Dispatcher {
    pub fn new(
        resolver: Arc<LocationResolver>,
        workers: usize,
        timeout: Duration,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            resolver,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
            completions,
            next_id: 1,
            in_flight: HashMap::new(),
        }
    }

    /// Start a pipeline run. Must be called inside a tokio runtime.
    pub fn submit(&mut self, source: LocationSource) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        let resolver = self.resolver.clone();
        let permits = self.permits.clone();
        let timeout = self.timeout;
        let tx = self.completions.clone();

        let task = tokio::spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(permit) => {
                    let job = tokio::task::spawn_blocking(move || {
                        // Held until the pipeline really returns, even past a timeout.
                        let _permit = permit;
                        resolver.resolve(source)
                    });
                    match tokio::time::timeout(timeout, job).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(join)) => Err(LocationError::Worker(join.to_string())),
                        Err(_) => Err(LocationError::Timeout(timeout)),
                    }
                }
                Err(_) => Err(LocationError::Cancelled),
            };
            let _ = tx.send(Completion { id, source, result });
        });

        debug!(%id, %source, network = source.uses_network(), "request dispatched");
        self.in_flight.insert(id, (source, task.abort_handle()));
        id
    }

    /// Abort a request and forget it. A completion it already queued is
    /// rejected by [`Dispatcher::finish`].
    pub fn cancel(&mut self, id: RequestId) -> Option<LocationSource> {
        let (source, handle) = self.in_flight.remove(&id)?;
        handle.abort();
        debug!(%id, %source, "request cancelled");
        Some(source)
    }

    /// Forget a request whose completion has been received. Returns `false`
    /// when the request was cancelled first and the completion is stale.
    pub fn finish(&mut self, id: RequestId) -> bool {
        self.in_flight.remove(&id).is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Source of the most recently submitted request still running.
    pub fn latest(&self) -> Option<LocationSource> {
        self.in_flight.iter().max_by_key(|(id, _)| **id).map(|(_, (source, _))| *source)
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, handle)) in self.in_flight.drain() {
            handle.abort();
        }
    }
}
