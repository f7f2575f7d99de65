//! Supervision of detached background tasks.
//!
//! Detached writes and sweepers are spawned through the supervisor so a
//! reload that times out waiting for them can abort the stragglers. Abort
//! handles for finished tasks are pruned on every spawn.

use std::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug, Default)]
pub struct TaskSupervisor {
    handles: Mutex<Vec<AbortHandle>>,
}

impl TaskSupervisor {
    pub fn new() -> TaskSupervisor {
        TaskSupervisor::default()
    }

    /// Spawn a task and retain its abort handle. The returned join handle
    /// is the caller's to await or drop.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = tokio::spawn(future);
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle.abort_handle());
        handle
    }

    pub fn pending(&self) -> usize {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Abort every task still running. Only the reload timeout path calls
    /// this.
    pub fn abort_all(&self) -> usize {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        let aborted = handles.len();
        for handle in handles.drain(..) {
            handle.abort();
        }
        aborted
    }
}
