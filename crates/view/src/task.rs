use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Why a [`Task`] produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError<E> {
    /// The task was cancelled before its outcome was observed.
    #[error("task aborted")]
    Aborted,
    /// The worker itself failed.
    #[error("task failed: {0}")]
    Failed(E),
}

/// Cooperative cancellation signal handed to the worker closure.
///
/// Workers are expected to check it between blocking steps; nothing ever
/// forcefully kills a worker thread, so locks and partially filled buffers
/// stay consistent across an abort.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

enum State<T, E> {
    Running,
    Finished(Result<T, E>),
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
    done: Condvar,
    cancel: CancelToken,
}

/// A unit of background work running on its own thread.
///
/// Handles are cheap to clone and all point at the same worker; the outcome
/// is written once under the shared lock, so `done`/`result`/`is_success`
/// may be called from any thread while the worker completes.
pub struct Task<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Start `work` on a fresh worker thread.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T, E> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Running),
            done: Condvar::new(),
            cancel: CancelToken::default(),
        });

        let worker = Arc::clone(&shared);
        thread::spawn(move || {
            let outcome = work(&worker.cancel);
            let mut state = worker.state.lock().unwrap();
            *state = State::Finished(outcome);
            worker.done.notify_all();
        });

        Self { shared }
    }
}

impl<T, E> Task<T, E> {
    /// True once the worker has returned or failed. Never blocks.
    pub fn done(&self) -> bool {
        matches!(*self.shared.state.lock().unwrap(), State::Finished(_))
    }

    /// Block until the worker has finished.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while matches!(*state, State::Running) {
            state = self.shared.done.wait(state).unwrap();
        }
    }

    /// Block up to `timeout`; returns whether the worker finished in time.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let state = self.shared.state.lock().unwrap();
        let (state, _) = self
            .shared
            .done
            .wait_timeout_while(state, timeout, |s| matches!(*s, State::Running))
            .unwrap();
        matches!(*state, State::Finished(_))
    }

    /// Request cancellation. Has no effect once the worker has finished.
    ///
    /// The worker keeps running until it next checks its [`CancelToken`],
    /// but any `result` call after this fails with [`TaskError::Aborted`].
    pub fn abort(&self) {
        let state = self.shared.state.lock().unwrap();
        if matches!(*state, State::Running) {
            self.shared.cancel.cancel();
        }
    }

    /// True iff the worker finished cleanly and the task was never aborted.
    pub fn is_success(&self) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        matches!(*self.shared.state.lock().unwrap(), State::Finished(Ok(_)))
    }

    /// True when both handles drive the same underlying worker.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T, E> Task<T, E>
where
    T: Clone,
    E: Clone,
{
    /// The worker's outcome.
    ///
    /// Returns [`TaskError::Aborted`] immediately if the task was cancelled,
    /// even when the work would eventually have produced a value; otherwise
    /// blocks until the worker is done.
    pub fn result(&self) -> Result<T, TaskError<E>> {
        if self.shared.cancel.is_cancelled() {
            return Err(TaskError::Aborted);
        }
        self.wait();
        if self.shared.cancel.is_cancelled() {
            return Err(TaskError::Aborted);
        }
        match &*self.shared.state.lock().unwrap() {
            State::Finished(Ok(value)) => Ok(value.clone()),
            State::Finished(Err(e)) => Err(TaskError::Failed(e.clone())),
            State::Running => unreachable!("wait() returned while still running"),
        }
    }
}
