//! Synchronous event notification.
//!
//! An [`EventNotifier`] holds a list of listeners and invokes all of them,
//! in registration order, with one payload whenever it is raised. Collections
//! expose one notifier per kind of mutation.

use std::fmt;
use std::sync::Arc;

/// Handle returned by [`EventNotifier::add_listener`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<P> = Box<dyn FnMut(&P)>;

/// A minimal synchronous publish mechanism.
///
/// Once destroyed, a notifier drops its listeners and ignores new ones.
pub struct EventNotifier<P> {
    listeners: Vec<(ListenerId, Listener<P>)>,
    next_id: u64,
    destroyed: bool,
}

impl<P> Default for EventNotifier<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventNotifier<P> {
    /// Creates a notifier without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            destroyed: false,
        }
    }

    /// Registers a listener and returns its handle.
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&P) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        if self.destroyed {
            tracing::debug!("Ignoring listener registered on a destroyed notifier");
        } else {
            self.listeners.push((id, Box::new(listener)));
        }
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Invokes every listener with `payload`.
    pub fn raise(&mut self, payload: &P) {
        for (_, listener) in &mut self.listeners {
            listener(payload);
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drops all listeners and disables the notifier for good.
    pub fn destroy(&mut self) {
        self.listeners.clear();
        self.destroyed = true;
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<P> fmt::Debug for EventNotifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("listeners", &self.listeners.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Payload of a collection's *removed* event.
#[derive(Debug)]
pub struct ItemRemoved<T> {
    /// The item that left the collection.
    pub item: Arc<T>,
    /// The position the item occupied right before removal.
    pub index: usize,
}

/// Payload of an indexed collection's *moved* event.
#[derive(Debug)]
pub struct ItemMoved<T> {
    pub item: Arc<T>,
    pub from: usize,
    pub to: usize,
}

/// Payload of an override collection's *replaced* event.
#[derive(Debug)]
pub struct ItemReplaced<T> {
    /// The item that was displaced.
    pub old: Arc<T>,
    /// The item taking its place.
    pub new: Arc<T>,
}
