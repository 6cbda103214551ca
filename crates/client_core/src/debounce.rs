//! Cancel-and-replace scheduling for callbacks that should only run after a quiet period.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Delays a side-effecting callback until `delay` has passed without another [`Debouncer::call`].
///
/// Only the latest call within a window fires, with that call's arguments. Once a call has
/// fired its callback runs detached, so later calls never abort work already in flight.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Arc<RwLock<Callback<T>>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, callback: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            callback: Arc::new(RwLock::new(boxed(callback))),
            pending: Mutex::new(None),
        }
    }

    /// Swaps the callback used by the next firing without touching the timer.
    pub fn set_callback<F, Fut>(&self, callback: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = boxed(callback);
    }

    /// Re-arms the timer with `args`. Must be called from within a Tokio runtime.
    pub fn call(&self, args: T) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = Arc::clone(&*callback.read().unwrap_or_else(PoisonError::into_inner));
            tokio::spawn(current(args));
        });

        if let Some(previous) = lock(&self.pending).replace(task) {
            previous.abort();
        }
    }

    /// Drops the scheduled call, if any. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        match lock(&self.pending).take() {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let slot = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

fn boxed<T, F, Fut>(callback: F) -> Callback<T>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |args| Box::pin(callback(args)) as BoxFuture<'static, ()>)
}

/// Locks a std mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
