//! Connectivity gating.
//!
//! The engine waits on a [`ConnectivityGate`] before each attempt. How reachability
//! is observed is up to the embedder: an OS path monitor, a periodic probe, or a UI
//! toggle feeds [`ConnectivityMonitor::set_connected`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};

/// Reports and awaits network reachability.
#[async_trait]
pub trait ConnectivityGate: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Resolves immediately when connected, otherwise once connectivity returns.
    async fn wait_for_connection(&self);
}

struct GateState {
    connected: bool,
    next_id: u64,
    waiters: HashMap<u64, oneshot::Sender<()>>,
}

/// A shared, internally synchronized [`ConnectivityGate`].
///
/// Create one per process, wrap it in an `Arc`, hand it to every client and to
/// whatever observes reachability. State changes and waiter registration are
/// serialized by a single mutex that is never held across an `.await`, so a flip
/// to connected wakes each registered waiter exactly once.
///
/// # Examples
///
/// ```
/// use relaycall::{ConnectivityGate, ConnectivityMonitor};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let monitor = Arc::new(ConnectivityMonitor::with_status(false));
///
/// let waiter = {
///     let monitor = monitor.clone();
///     tokio::spawn(async move { monitor.wait_for_connection().await })
/// };
///
/// monitor.set_connected(true);
/// waiter.await.unwrap();
/// assert!(monitor.is_connected().await);
/// # }
/// ```
pub struct ConnectivityMonitor {
    state: Mutex<GateState>,
    status: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor that starts out connected.
    pub fn new() -> Self {
        Self::with_status(true)
    }

    pub fn with_status(connected: bool) -> Self {
        let (status, _) = watch::channel(connected);
        Self {
            state: Mutex::new(GateState {
                connected,
                next_id: 0,
                waiters: HashMap::new(),
            }),
            status,
        }
    }

    /// Records a reachability change.
    ///
    /// A transition to connected releases every pending waiter.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.lock();
        let was_connected = state.connected;
        state.connected = connected;
        self.status.send_replace(connected);

        if connected && !was_connected {
            let released = state.waiters.len();
            for (_, waiter) in state.waiters.drain() {
                let _ = waiter.send(());
            }
            tracing::info!(released_waiters = released, "Network connectivity restored");
        } else if !connected && was_connected {
            tracing::warn!("Network connectivity lost");
        }
    }

    /// Returns a receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    /// The number of callers currently suspended in `wait_for_connection`.
    pub fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ConnectivityMonitor")
            .field("connected", &state.connected)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

/// Removes a waiter whose future was dropped before it was released.
struct Registration<'a> {
    monitor: &'a ConnectivityMonitor,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.monitor.lock().waiters.remove(&self.id);
    }
}

#[async_trait]
impl ConnectivityGate for ConnectivityMonitor {
    async fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn wait_for_connection(&self) {
        let (id, released) = {
            let mut state = self.lock();
            if state.connected {
                return;
            }
            let id = state.next_id;
            state.next_id += 1;
            let (tx, rx) = oneshot::channel();
            state.waiters.insert(id, tx);
            (id, rx)
        };

        let _registration = Registration { monitor: self, id };
        let _ = released.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    async fn wait_for_waiters(monitor: &ConnectivityMonitor, n: usize) {
        while monitor.waiter_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_connected_returns_immediately() {
        let monitor = ConnectivityMonitor::new();
        monitor.wait_for_connection().await;
        assert!(monitor.is_connected().await);
        assert_eq!(monitor.waiter_count(), 0);
    }

    #[tokio::test]
    async fn test_waiters_released_once_on_reconnect() {
        let monitor = Arc::new(ConnectivityMonitor::with_status(false));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let monitor = monitor.clone();
                tokio::spawn(async move { monitor.wait_for_connection().await })
            })
            .collect();

        wait_for_waiters(&monitor, 3).await;
        monitor.set_connected(true);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(monitor.waiter_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_staying_offline_does_not_release() {
        let monitor = Arc::new(ConnectivityMonitor::with_status(false));

        let waiter = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.wait_for_connection().await })
        };
        wait_for_waiters(&monitor, 1).await;

        monitor.set_connected(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!waiter.is_finished());
        assert_eq!(monitor.waiter_count(), 1);

        monitor.set_connected(true);
        waiter.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_deregisters() {
        let monitor = ConnectivityMonitor::with_status(false);

        let result =
            tokio::time::timeout(Duration::from_secs(1), monitor.wait_for_connection()).await;

        assert!(result.is_err());
        assert_eq!(monitor.waiter_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let monitor = ConnectivityMonitor::new();
        let mut status = monitor.subscribe();

        monitor.set_connected(false);
        status.changed().await.unwrap();
        assert!(!*status.borrow());

        monitor.set_connected(true);
        status.changed().await.unwrap();
        assert!(*status.borrow());
    }
}
