use super::event::GitOutputEvent;
use super::listeners::OutputListener;
use crate::git::error::{GitError, Result};
use std::collections::HashMap;

/// Event name for subprocess output chunks.
pub const GIT_OUTPUT: &str = "git.output";

/// Handle returned by `subscribe`, used to remove the listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Synchronous publish/subscribe registry for output events.
///
/// Listeners for an event run in subscription order. Dispatch stops at the
/// first listener error, which propagates to the publisher.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, Box<dyn OutputListener>)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event name, appended after any existing
    /// listeners for that event.
    pub fn subscribe(
        &mut self,
        event: impl Into<String>,
        listener: Box<dyn OutputListener>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(event.into())
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove a listener by the id returned from `subscribe`.
    ///
    /// Returns the listener if it was registered for the event.
    pub fn unsubscribe(&mut self, event: &str, id: ListenerId) -> Option<Box<dyn OutputListener>> {
        let entries = self.listeners.get_mut(event)?;
        let position = entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        Some(entries.remove(position).1)
    }

    /// Dispatch an event to every listener registered for `event`, in
    /// subscription order.
    pub fn publish(&mut self, event: &str, payload: &GitOutputEvent) -> Result<()> {
        let Some(entries) = self.listeners.get_mut(event) else {
            return Ok(());
        };

        for (_, listener) in entries.iter_mut() {
            listener
                .handle_output(payload)
                .map_err(GitError::Listener)?;
        }

        Ok(())
    }

    /// Number of listeners registered for an event name.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &counts)
            .finish()
    }
}
