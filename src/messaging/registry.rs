use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use super::EventKind;

/// Callback invoked with the event payload.
pub type EventListener = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// Ordered listener registry keyed by event kind.
///
/// Registration is idempotent per (kind, listener identity). Dispatch order
/// is registration order. Removing the last listener for a kind removes the
/// kind's entry entirely.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<EventKind, Vec<EventListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Registers `listener` for `kind`. A second registration of the same
    /// listener for the same kind is a no-op.
    pub fn add(&mut self, kind: EventKind, listener: EventListener) {
        let entry = self.listeners.entry(kind).or_default();
        if !entry.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            entry.push(listener);
        }
    }

    /// Removes a listener by identity. No-op when it was never registered.
    pub fn remove(&mut self, kind: &EventKind, listener: &EventListener) {
        if let Some(entry) = self.listeners.get_mut(kind) {
            entry.retain(|existing| !Arc::ptr_eq(existing, listener));
            if entry.is_empty() {
                self.listeners.remove(kind);
            }
        }
    }

    /// Snapshot of the listeners for `kind`, in registration order.
    ///
    /// Callers dispatch against the snapshot after releasing the state lock,
    /// so a listener can re-register without deadlocking.
    pub fn snapshot(&self, kind: &EventKind) -> Vec<EventListener> {
        self.listeners.get(kind).cloned().unwrap_or_default()
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.get(kind).map(Vec::len).unwrap_or(0)
    }
}

/// Invokes `listeners` in order with `data`.
///
/// Each callback is isolated: a panicking listener is logged and must not
/// starve its siblings or affect delivery of later messages.
pub fn fire(kind: &EventKind, listeners: &[EventListener], data: &Value) {
    for listener in listeners {
        let result = catch_unwind(AssertUnwindSafe(|| listener(data.clone())));
        if result.is_err() {
            tracing::error!("Listener for '{}' panicked during dispatch", kind.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_listener(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> EventListener {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Arc::new(move |_| log.lock().unwrap().push(tag.clone()))
    }

    #[test]
    fn test_duplicate_registration_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recording_listener(&log, "a");

        let mut registry = ListenerRegistry::new();
        registry.add(EventKind::Notification, Arc::clone(&listener));
        registry.add(EventKind::Notification, Arc::clone(&listener));

        assert_eq!(registry.listener_count(&EventKind::Notification), 1);

        let snapshot = registry.snapshot(&EventKind::Notification);
        fire(&EventKind::Notification, &snapshot, &Value::Null);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dispatch_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recording_listener(&log, "first");
        let second = recording_listener(&log, "second");

        let mut registry = ListenerRegistry::new();
        registry.add(EventKind::Notification, first);
        registry.add(EventKind::Notification, second);

        let snapshot = registry.snapshot(&EventKind::Notification);
        fire(&EventKind::Notification, &snapshot, &Value::Null);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_removing_last_listener_drops_the_entry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recording_listener(&log, "a");

        let mut registry = ListenerRegistry::new();
        registry.add(EventKind::ScanProgress, Arc::clone(&listener));
        registry.remove(&EventKind::ScanProgress, &listener);

        assert_eq!(registry.listener_count(&EventKind::ScanProgress), 0);
        assert!(registry.snapshot(&EventKind::ScanProgress).is_empty());
    }

    #[test]
    fn test_removing_unknown_listener_is_a_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registered = recording_listener(&log, "a");
        let stranger = recording_listener(&log, "b");

        let mut registry = ListenerRegistry::new();
        registry.add(EventKind::Notification, Arc::clone(&registered));
        registry.remove(&EventKind::Notification, &stranger);

        assert_eq!(registry.listener_count(&EventKind::Notification), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_starve_siblings() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let panicking: EventListener = Arc::new(|_| panic!("listener bug"));
        let surviving = recording_listener(&log, "survivor");

        let mut registry = ListenerRegistry::new();
        registry.add(EventKind::Notification, panicking);
        registry.add(EventKind::Notification, surviving);

        let snapshot = registry.snapshot(&EventKind::Notification);
        fire(&EventKind::Notification, &snapshot, &Value::Null);

        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }
}
