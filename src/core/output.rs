//! Deferred dependency nodes.
//!
//! An [`Output`] is a value that may not be known yet because it depends on
//! an in-flight provisioning operation. Consumers either suspend on it
//! ([`Output::wait`]), poll it ([`Output::try_get`]), or derive a downstream
//! node from it ([`Output::apply`]) that settles automatically when the
//! upstream settles.
//!
//! Nodes are settled exactly once, through a [`Resolver`] handed to whoever
//! performs the operation. A resolver dropped without settling marks the
//! node failed with [`DeployError::Cancelled`], so abandoned in-flight work
//! is observable instead of hanging its consumers forever.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{DeployError, Error, Result, ValueError};

type Settled<T> = std::result::Result<T, Error>;
type Callback<T> = Box<dyn FnOnce(&Settled<T>) + Send>;

enum State<T> {
    Pending(Vec<Callback<T>>),
    Resolved(T),
    Failed(Error),
}

struct Cell<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

impl<T: Clone> Cell<T> {
    /// Settle the node once; later calls are ignored.
    fn settle(&self, outcome: Settled<T>) {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let State::Pending(callbacks) = &mut *state else {
                return;
            };
            let callbacks = std::mem::take(callbacks);
            *state = match &outcome {
                Ok(value) => State::Resolved(value.clone()),
                Err(error) => State::Failed(error.clone()),
            };
            self.cond.notify_all();
            callbacks
        };

        // Run downstream callbacks outside the lock: a callback may read
        // this node again through a cloned handle.
        for callback in callbacks {
            callback(&outcome);
        }
    }
}

/// A deferred value produced by an in-flight provisioning operation.
///
/// Handles are cheap to clone and share one underlying node.
pub struct Output<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Clone> Output<T> {
    /// Create an unresolved node and the resolver that settles it.
    pub fn pending() -> (Self, Resolver<T>) {
        let cell = Arc::new(Cell {
            state: Mutex::new(State::Pending(Vec::new())),
            cond: Condvar::new(),
        });
        let output = Self {
            cell: Arc::clone(&cell),
        };
        (output, Resolver {
            cell,
            settled: false,
        })
    }

    /// Create a node that is already resolved.
    pub fn resolved(value: T) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Resolved(value)),
                cond: Condvar::new(),
            }),
        }
    }

    /// Create a node that is already failed.
    pub fn failed(error: Error) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Failed(error)),
                cond: Condvar::new(),
            }),
        }
    }

    /// Non-blocking read.
    ///
    /// Returns `None` while the node is pending, so an unresolved value is
    /// simply not observable.
    pub fn try_get(&self) -> Option<Result<T>> {
        let state = self
            .cell
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &*state {
            State::Pending(_) => None,
            State::Resolved(value) => Some(Ok(value.clone())),
            State::Failed(error) => Some(Err(error.clone())),
        }
    }

    /// Whether the node has resolved successfully.
    pub fn is_resolved(&self) -> bool {
        matches!(self.try_get(), Some(Ok(_)))
    }

    /// Suspend until the node settles.
    pub fn wait(&self) -> Result<T> {
        let mut state = self
            .cell
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                State::Pending(_) => {
                    state = self
                        .cell
                        .cond
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                State::Resolved(value) => return Ok(value.clone()),
                State::Failed(error) => return Err(error.clone()),
            }
        }
    }

    /// Suspend until the node settles or the timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::Unresolved` if the node is still pending when
    /// the timeout elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T> {
        let deadline = std::time::Instant::now() + timeout;
        let mut state = self
            .cell
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                State::Pending(_) => {
                    let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                    if remaining.is_zero() {
                        return Err(ValueError::Unresolved.into());
                    }
                    let (guard, _) = self
                        .cell
                        .cond
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner);
                    state = guard;
                }
                State::Resolved(value) => return Ok(value.clone()),
                State::Failed(error) => return Err(error.clone()),
            }
        }
    }
}

impl<T: Clone + Send + 'static> Output<T> {
    /// Derive a downstream node.
    ///
    /// The projection runs when this node resolves; an upstream failure
    /// propagates to the derived node unchanged, and a projection error
    /// fails the derived node.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(&T) -> Result<U> + Send + 'static,
    {
        let (derived, resolver) = Output::pending();
        let callback: Callback<T> = Box::new(move |outcome| match outcome {
            Ok(value) => match f(value) {
                Ok(mapped) => resolver.resolve(mapped),
                Err(error) => resolver.fail(error),
            },
            Err(error) => resolver.fail(error.clone()),
        });

        let ready = {
            let mut state = self
                .cell
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                State::Pending(callbacks) => {
                    callbacks.push(callback);
                    None
                }
                State::Resolved(value) => Some((callback, Ok(value.clone()))),
                State::Failed(error) => Some((callback, Err(error.clone()))),
            }
        };

        if let Some((callback, outcome)) = ready {
            callback(&outcome);
        }

        derived
    }
}

/// Settles a pending [`Output`] exactly once.
pub struct Resolver<T: Clone> {
    cell: Arc<Cell<T>>,
    settled: bool,
}

impl<T: Clone> Resolver<T> {
    /// Resolve the node with a value.
    pub fn resolve(mut self, value: T) {
        self.settled = true;
        self.cell.settle(Ok(value));
    }

    /// Fail the node with an error.
    pub fn fail(mut self, error: Error) {
        self.settled = true;
        self.cell.settle(Err(error));
    }
}

impl<T: Clone> Drop for Resolver<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.cell.settle(Err(DeployError::Cancelled.into()));
        }
    }
}
