//! Change notification for session consumers

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::state::AuthState;

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    /// Kept in subscription order
    entries: Mutex<Vec<(u64, Listener)>>,
    dispatch: Mutex<Dispatch>,
}

/// States waiting to be delivered, oldest first
#[derive(Default)]
struct Dispatch {
    pending: VecDeque<AuthState>,
    delivering: bool,
}

impl Listeners {
    pub(crate) fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, listener));

        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.entries.lock().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Call every listener once, in subscription order.
    ///
    /// A commit made from inside a listener is queued and delivered after
    /// the current round reaches every listener, so each listener sees
    /// states in commit order and ends on the latest one. Each round works
    /// on a copy of the list so listeners may subscribe or unsubscribe while
    /// being notified. A panicking listener is logged and skipped.
    pub(crate) fn notify(&self, state: &AuthState) {
        {
            let mut dispatch = self.dispatch.lock();
            dispatch.pending.push_back(state.clone());
            if dispatch.delivering {
                return;
            }
            dispatch.delivering = true;
        }

        loop {
            let next = {
                let mut dispatch = self.dispatch.lock();
                let next = dispatch.pending.pop_front();
                if next.is_none() {
                    dispatch.delivering = false;
                }
                next
            };

            match next {
                Some(state) => self.deliver(&state),
                None => break,
            }
        }
    }

    fn deliver(&self, state: &AuthState) {
        let listeners: Vec<Listener> = self
            .entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
                tracing::warn!("Session listener panicked, notifying remaining listeners");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Read-only view of the session for UI consumers.
///
/// Cheap to clone; every clone sees the same state and listener list as the
/// `SessionManager` it came from.
#[derive(Clone)]
pub struct SessionReader {
    state: Arc<RwLock<AuthState>>,
    listeners: Arc<Listeners>,
}

impl SessionReader {
    pub(crate) fn new(state: Arc<RwLock<AuthState>>, listeners: Arc<Listeners>) -> Self {
        Self { state, listeners }
    }

    /// Snapshot of the last committed state
    pub fn current(&self) -> AuthState {
        self.state.read().clone()
    }

    /// Register a listener called after every committed session change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, Arc<Listeners>) {
        (Arc::new(Mutex::new(Vec::new())), Arc::new(Listeners::default()))
    }

    #[test]
    fn test_notify_in_subscription_order() {
        let (calls, listeners) = recorder();

        let first = Arc::clone(&calls);
        let _a = listeners.subscribe(Arc::new(move |_: &AuthState| {
            first.lock().push("first")
        }));
        let second = Arc::clone(&calls);
        let _b = listeners.subscribe(Arc::new(move |_: &AuthState| {
            second.lock().push("second")
        }));

        listeners.notify(&AuthState::signed_out());

        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let (calls, listeners) = recorder();

        let _a = listeners.subscribe(Arc::new(|state: &AuthState| {
            assert!(state.is_authenticated(), "listener failure");
        }));
        let after = Arc::clone(&calls);
        let _b = listeners.subscribe(Arc::new(move |_: &AuthState| {
            after.lock().push("after")
        }));

        listeners.notify(&AuthState::signed_out());

        assert_eq!(*calls.lock(), vec!["after"]);
    }

    #[test]
    fn test_nested_notify_waits_for_current_round() {
        let listeners = Arc::new(Listeners::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let registry = Arc::clone(&listeners);
        let first = Arc::clone(&seen);
        let _a = listeners.subscribe(Arc::new(move |state: &AuthState| {
            first.lock().push(("first", state.is_authenticated()));
            if state.is_authenticated() {
                registry.notify(&AuthState::signed_out());
            }
        }));
        let second = Arc::clone(&seen);
        let _b = listeners.subscribe(Arc::new(move |state: &AuthState| {
            second.lock().push(("second", state.is_authenticated()));
        }));

        let user = serde_json::from_value(serde_json::json!({
            "id": "user-123",
            "name": "John Doe",
            "email": "johndoe@example.com"
        }))
        .unwrap();
        listeners.notify(&AuthState::authenticated("token-123".to_string(), user));

        assert_eq!(
            *seen.lock(),
            vec![
                ("first", true),
                ("second", true),
                ("first", false),
                ("second", false),
            ]
        );
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (calls, listeners) = recorder();

        let recorded = Arc::clone(&calls);
        let subscription = listeners.subscribe(Arc::new(move |_: &AuthState| {
            recorded.lock().push("hit")
        }));
        assert_eq!(listeners.len(), 1);

        subscription.unsubscribe();
        assert_eq!(listeners.len(), 0);

        listeners.notify(&AuthState::signed_out());
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_subscription_outlives_registry() {
        let listeners = Arc::new(Listeners::default());
        let subscription = listeners.subscribe(Arc::new(|_: &AuthState| {}));

        drop(listeners);
        drop(subscription);
    }
}
