/// Background task runner
///
/// Runs one unit of work at a time on a named worker thread. The owning
/// (interactive) thread polls for completion once per frame; the result,
/// an error, or a caught panic is handed back exactly once, after which
/// the task is idle again.

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{ModalError, Result};

/// Cooperative cancellation flag shared with the worker
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Externally observable task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    /// Finished, result not yet collected by `poll`
    Completed,
}

/// Outcome of one `poll` call
#[derive(Debug)]
pub enum TaskPoll<T> {
    Idle,
    Running,
    Completed(Result<T>),
}

impl<T> TaskPoll<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskPoll::Completed(_))
    }
}

struct Run<T> {
    handle: JoinHandle<()>,
    result: Receiver<Result<T>>,
    token: CancellationToken,
}

/// A named, poll-driven background task
pub struct BackgroundTask<T> {
    name: String,
    run: Option<Run<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start `work` on a new thread
    ///
    /// Fails with `TaskBusy` while a previous run is still executing. A
    /// finished run whose result was never polled is reclaimed and its
    /// result discarded.
    pub fn launch<F>(&mut self, work: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Result<T> + Send + 'static,
    {
        match self.state() {
            TaskState::Running => return Err(ModalError::TaskBusy),
            TaskState::Completed => {
                log::debug!("task '{}': discarding unpolled result", self.name);
                self.reclaim();
            }
            TaskState::Idle => {}
        }

        let (sender, receiver) = bounded(1);
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| work(worker_token)))
                    .unwrap_or_else(|payload| {
                        Err(ModalError::TaskFailed(format!(
                            "task '{}' panicked: {}",
                            name,
                            panic_message(payload.as_ref())
                        )))
                    });
                // The receiver only disappears when the task handle is dropped
                let _ = sender.send(result);
            })
            .map_err(|e| ModalError::TaskFailed(format!("could not spawn '{}': {}", self.name, e)))?;

        log::info!("task '{}' launched", self.name);
        self.run = Some(Run {
            handle,
            result: receiver,
            token,
        });
        Ok(())
    }

    pub fn state(&self) -> TaskState {
        match &self.run {
            None => TaskState::Idle,
            Some(run) if !run.result.is_empty() || run.handle.is_finished() => TaskState::Completed,
            Some(_) => TaskState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    /// Non-blocking completion check
    pub fn poll(&mut self) -> TaskPoll<T> {
        let Some(run) = &self.run else {
            return TaskPoll::Idle;
        };
        let result = match run.result.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return TaskPoll::Running,
            Err(TryRecvError::Disconnected) => Err(ModalError::TaskFailed(format!(
                "task '{}' exited without a result",
                self.name
            ))),
        };
        self.reclaim();
        self.log_completion(&result);
        TaskPoll::Completed(result)
    }

    /// Block until the current run finishes
    pub fn wait(&mut self) -> TaskPoll<T> {
        let Some(run) = &self.run else {
            return TaskPoll::Idle;
        };
        let result = run.result.recv().unwrap_or_else(|_| {
            Err(ModalError::TaskFailed(format!(
                "task '{}' exited without a result",
                self.name
            )))
        });
        self.reclaim();
        self.log_completion(&result);
        TaskPoll::Completed(result)
    }

    /// Ask the running work to stop; it decides when to honour it
    pub fn cancel(&self) {
        if let Some(run) = &self.run {
            run.token.cancel();
        }
    }

    fn reclaim(&mut self) {
        if let Some(run) = self.run.take() {
            // The worker has sent (or dropped) its result, so join is prompt
            if run.handle.join().is_err() {
                log::error!("task '{}': worker thread panicked outside its work", self.name);
            }
        }
    }

    fn log_completion(&self, result: &Result<T>) {
        match result {
            Ok(_) => log::info!("task '{}' completed", self.name),
            Err(e) => log::warn!("task '{}' failed: {}", self.name, e),
        }
    }
}

impl<T> Drop for BackgroundTask<T> {
    fn drop(&mut self) {
        // Detach a still-running worker after asking it to stop
        if let Some(run) = &self.run {
            run.token.cancel();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
