//! Typed observer interface between state containers and overlay consumers.
//!
//! State containers ([`crate::DiagnosticsIndex`], [`crate::SettingsStore`], ...) publish an
//! [`OverlayEvent`] after each committed change. Consumers subscribe to an [`EventTopic`] and get
//! back a [`SubscriptionToken`] that must be handed back to [`EventBus::unsubscribe`] when the
//! consumer goes away.
//!
//! Delivery is synchronous: [`EventBus::publish`] runs every matching handler on the calling
//! thread, in subscription order, before returning. Handlers are invoked after the bus lock has
//! been released, so a handler may subscribe or unsubscribe without deadlocking.
//!
//! # Example
//!
//! ```rust
//! use editor_overlay::{EventBus, EventTopic, OverlayEvent};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let bus = EventBus::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let hits_clone = Arc::clone(&hits);
//! let token = bus.subscribe(EventTopic::SettingsChanged, move |_| {
//!     hits_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.publish(&OverlayEvent::SettingsChanged);
//! assert!(bus.unsubscribe(token));
//! bus.publish(&OverlayEvent::SettingsChanged);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OverlayEvent {
    /// The current text of a buffer changed.
    BufferEdited {
        /// File path of the buffer.
        path: String,
    },
    /// The reference snapshot (e.g. `HEAD` content) of a file changed.
    ReferenceChanged {
        /// File path.
        path: String,
    },
    /// The diagnostic list of a file was replaced.
    DiagnosticsChanged {
        /// File path.
        path: String,
    },
    /// Blame data for a file was replaced or invalidated.
    BlameChanged {
        /// File path.
        path: String,
    },
    /// The checked-out branch changed; every cached blame list is gone.
    BranchChanged,
    /// User settings changed.
    SettingsChanged,
}

impl OverlayEvent {
    /// The topic this event is delivered on.
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BufferEdited { .. } => EventTopic::BufferEdited,
            Self::ReferenceChanged { .. } => EventTopic::ReferenceChanged,
            Self::DiagnosticsChanged { .. } => EventTopic::DiagnosticsChanged,
            Self::BlameChanged { .. } => EventTopic::BlameChanged,
            Self::BranchChanged => EventTopic::BranchChanged,
            Self::SettingsChanged => EventTopic::SettingsChanged,
        }
    }

    /// The file path this event is scoped to, or `None` for global events.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::BufferEdited { path }
            | Self::ReferenceChanged { path }
            | Self::DiagnosticsChanged { path }
            | Self::BlameChanged { path } => Some(path),
            Self::BranchChanged | Self::SettingsChanged => None,
        }
    }
}

/// Payload-free discriminant of [`OverlayEvent`], used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTopic {
    /// See [`OverlayEvent::BufferEdited`].
    BufferEdited,
    /// See [`OverlayEvent::ReferenceChanged`].
    ReferenceChanged,
    /// See [`OverlayEvent::DiagnosticsChanged`].
    DiagnosticsChanged,
    /// See [`OverlayEvent::BlameChanged`].
    BlameChanged,
    /// See [`OverlayEvent::BranchChanged`].
    BranchChanged,
    /// See [`OverlayEvent::SettingsChanged`].
    SettingsChanged,
}

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Event handler stored by the bus.
pub type EventHandler = Arc<dyn Fn(&OverlayEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_token: u64,
    handlers: BTreeMap<SubscriptionToken, (EventTopic, EventHandler)>,
}

/// Synchronous, topic-filtered event bus.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event published on `topic`.
    pub fn subscribe<F>(&self, topic: EventTopic, handler: F) -> SubscriptionToken
    where
        F: Fn(&OverlayEvent) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let token = SubscriptionToken(inner.next_token);
        inner.next_token = inner.next_token.saturating_add(1);
        inner.handlers.insert(token, (topic, Arc::new(handler)));
        token
    }

    /// Remove a subscription. Returns `false` if the token was unknown (already removed).
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.lock().handlers.remove(&token).is_some()
    }

    /// Deliver `event` to every handler subscribed to its topic. Returns the number of handlers
    /// invoked.
    pub fn publish(&self, event: &OverlayEvent) -> usize {
        let topic = event.topic();
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.lock();
            inner
                .handlers
                .values()
                .filter(|(t, _)| *t == topic)
                .map(|(_, h)| Arc::clone(h))
                .collect()
        };

        tracing::trace!(?event, handlers = handlers.len(), "publishing overlay event");
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Total number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// Number of live subscriptions for one topic.
    pub fn topic_subscriber_count(&self, topic: EventTopic) -> usize {
        self.inner
            .lock()
            .handlers
            .values()
            .filter(|(t, _)| *t == topic)
            .count()
    }
}
