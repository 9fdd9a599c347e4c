//! Single-writer, multi-reader build facts
//!
//! A [`Fact`] is a value that becomes known at some point during the gather
//! phase. It starts out pending and settles exactly once, either to a value or
//! to an explicit failure. The write half ([`FactSetter`]) is consumed when it
//! settles the fact, so a second resolution cannot be expressed. Dropping a
//! setter that never settled marks the fact as failed, so readers never wait
//! on a writer that has gone away.

use tokio::sync::watch;

/// Observable state of a fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactState<T> {
    /// Not settled yet
    Pending,
    /// Settled to a value
    Ready(T),
    /// Settled as unavailable
    Failed,
}

impl<T> FactState<T> {
    /// Whether the fact has settled (either way)
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Read half of a build fact
///
/// Cheap to clone; any number of readers may wait concurrently.
#[derive(Debug, Clone)]
pub struct Fact<T> {
    name: &'static str,
    rx: watch::Receiver<FactState<T>>,
}

/// Write half of a build fact
///
/// Exactly one exists per pending fact. Settling consumes it.
#[derive(Debug)]
pub struct FactSetter<T> {
    name: &'static str,
    tx: Option<watch::Sender<FactState<T>>>,
}

/// Create a pending fact and its single writer
pub fn fact<T>(name: &'static str) -> (FactSetter<T>, Fact<T>) {
    let (tx, rx) = watch::channel(FactState::Pending);
    (FactSetter { name, tx: Some(tx) }, Fact { name, rx })
}

impl<T: Clone> Fact<T> {
    /// Create a fact that is already settled to a value
    pub fn ready(name: &'static str, value: T) -> Self {
        let (setter, fact) = fact(name);
        setter.resolve(value);
        fact
    }

    /// Create a fact that is already settled as failed
    pub fn failed(name: &'static str) -> Self {
        let (setter, fact) = fact(name);
        setter.fail();
        fact
    }

    /// Create a settled fact from an optional value
    pub fn settled(name: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => Self::ready(name, value),
            None => Self::failed(name),
        }
    }

    /// Name of the fact, used in logs and errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state without waiting
    pub fn state(&self) -> FactState<T> {
        self.rx.borrow().clone()
    }

    /// Current value without waiting, if the fact has settled to one
    pub fn peek(&self) -> Option<T> {
        match &*self.rx.borrow() {
            FactState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Wait until the fact settles
    ///
    /// Returns `None` if the fact failed or its writer was dropped unsettled.
    pub async fn wait(&self) -> Option<T> {
        let mut rx = self.rx.clone();
        let settled = rx.wait_for(FactState::is_settled).await;
        match settled {
            Ok(state) => match &*state {
                FactState::Ready(value) => Some(value.clone()),
                _ => None,
            },
            Err(_) => None,
        }
    }
}

impl<T> FactSetter<T> {
    /// Name of the fact this setter owns
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Settle the fact to a value
    pub fn resolve(mut self, value: T) {
        self.settle(FactState::Ready(value));
    }

    /// Settle the fact as unavailable
    pub fn fail(mut self) {
        self.settle(FactState::Failed);
    }

    /// Settle from a result, failing on `None`
    pub fn resolve_or_fail(self, value: Option<T>) {
        match value {
            Some(value) => self.resolve(value),
            None => self.fail(),
        }
    }

    fn settle(&mut self, state: FactState<T>) {
        if let Some(tx) = self.tx.take() {
            tx.send_if_modified(|current| {
                if current.is_settled() {
                    return false;
                }
                *current = state;
                true
            });
        }
    }
}

impl<T> Drop for FactSetter<T> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::debug!("Fact '{}' was never settled, marking it failed", self.name);
            self.settle(FactState::Failed);
        }
    }
}
