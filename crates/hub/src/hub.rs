//! ActivitySubscriptionHub - ordered, failure-isolated listener registry

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ActivityChanged, ActivityListener, ContractError, FnListener};
use metrics::counter;
use tracing::{debug, error, trace};

use crate::handle::SinkHandle;

/// Handle returned by [`ActivitySubscriptionHub::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Outcome of one [`ActivitySubscriptionHub::notify`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

impl NotifyReport {
    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

struct Subscription {
    token: SubscriptionToken,
    listener: Arc<dyn ActivityListener>,
}

/// Registry of activity listeners.
///
/// Listeners run synchronously in subscription order on the notifying task.
/// An error or panic from one listener is logged and counted; the remaining
/// listeners still run.
pub struct ActivitySubscriptionHub {
    next_token: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Default for ActivitySubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActivitySubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivitySubscriptionHub")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ActivitySubscriptionHub {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener; it is called after every earlier subscriber
    pub fn subscribe(&self, listener: Arc<dyn ActivityListener>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        debug!(listener = listener.name(), token = token.0, "listener subscribed");
        self.lock().push(Subscription { token, listener });
        token
    }

    /// Register a closure as a listener
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, callback: F) -> SubscriptionToken
    where
        F: Fn(&ActivityChanged) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnListener::new(name, callback)))
    }

    /// Forward events to a sink worker queue
    pub fn subscribe_sink(&self, handle: &SinkHandle) -> SubscriptionToken {
        self.subscribe(Arc::new(handle.listener()))
    }

    /// Remove a listener. Returns false for unknown or already removed tokens.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.token != token);
        let removed = subscriptions.len() != before;
        if removed {
            debug!(token = token.0, "listener unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// The registry is snapshotted first, so listeners may subscribe or
    /// unsubscribe from inside a callback; changes apply to the next event.
    pub fn notify(&self, event: &ActivityChanged) -> NotifyReport {
        let listeners: Vec<Arc<dyn ActivityListener>> =
            self.lock().iter().map(|s| Arc::clone(&s.listener)).collect();

        let mut report = NotifyReport::default();
        for listener in &listeners {
            if invoke(listener.as_ref(), event) {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        trace!(
            label = %event.label,
            delivered = report.delivered,
            failed = report.failed,
            "activity change dispatched"
        );
        counter!("hub_events_total").increment(1);
        report
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        // Listeners never run under this lock, so a poisoned registry is intact
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run one listener, containing errors and panics
fn invoke(listener: &dyn ActivityListener, event: &ActivityChanged) -> bool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_activity_changed(event)));

    match outcome {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(listener = listener.name(), error = %e, "listener failed");
            counter!("hub_listener_failures_total", "listener" => listener.name().to_string())
                .increment(1);
            false
        }
        Err(payload) => {
            error!(
                listener = listener.name(),
                panic = panic_message(payload.as_ref()),
                "listener panicked"
            );
            counter!("hub_listener_panics_total", "listener" => listener.name().to_string())
                .increment(1);
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
