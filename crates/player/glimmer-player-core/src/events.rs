//! Event surface of the display host.
//!
//! Events are queued during an operation and dispatched to listeners in a
//! single `process_queue` pass, so listener callbacks never run inside the
//! tick's critical section.

use serde::{Deserialize, Serialize};

/// Hit region reported by a click, in normalized surface coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub id: String,
    pub position: [f32; 2],
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MessagePhrase {
    Begin,
    End,
}

/// Item lifetime notification (element created/destroyed within a
/// composition).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub item_name: String,
    pub composition_id: String,
    pub phrase: MessagePhrase,
}

/// Events a display host emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerEvent {
    /// An interactive element was clicked.
    Click {
        region: Region,
        composition_id: String,
        composition_name: String,
    },
    /// An item entered or left its active window.
    Message(MessageItem),
    /// The player was paused.
    Pause,
    /// Per-frame update notification.
    Update { playing: bool },
    /// A render error was observed; ticking is paused until `resume`.
    RenderError { message: String },
}

impl PlayerEvent {
    /// Stable name of this event on the public surface.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Message(_) => "message",
            Self::Pause => "pause",
            Self::Update { .. } => "update",
            Self::RenderError { .. } => "rendererror",
        }
    }
}

/// Listener for display host events.
pub trait EventListener {
    fn on_event(&mut self, event: &PlayerEvent);

    /// Event names this listener cares about; empty means all.
    fn interested_events(&self) -> Vec<&'static str> {
        vec![]
    }

    fn is_interested_in(&self, name: &str) -> bool {
        let interested = self.interested_events();
        interested.is_empty() || interested.contains(&name)
    }
}

/// Queueing dispatcher with bounded backlog.
pub struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
    queue: Vec<PlayerEvent>,
    max_queue_size: usize,
    enabled: bool,
}

impl EventDispatcher {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            listeners: Vec::new(),
            queue: Vec::new(),
            max_queue_size,
            enabled: true,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Queue an event for the next `process_queue` pass. Dropped when the
    /// backlog is full or dispatching is disabled.
    pub fn dispatch(&mut self, event: PlayerEvent) {
        if !self.enabled {
            return;
        }
        if self.queue.len() < self.max_queue_size {
            self.queue.push(event);
        }
    }

    /// Deliver every queued event to interested listeners and clear the
    /// queue.
    pub fn process_queue(&mut self) {
        let events = std::mem::take(&mut self.queue);
        for event in events {
            for listener in &mut self.listeners {
                if listener.is_interested_in(event.name()) {
                    listener.on_event(&event);
                }
            }
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.queue.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .field("queued", &self.queue.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Listener that appends events into a shared buffer. Useful for tests.
pub struct CollectingListener {
    events: std::rc::Rc<std::cell::RefCell<Vec<PlayerEvent>>>,
    interested: Vec<&'static str>,
}

impl CollectingListener {
    pub fn new() -> (Self, std::rc::Rc<std::cell::RefCell<Vec<PlayerEvent>>>) {
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        (
            Self {
                events: events.clone(),
                interested: vec![],
            },
            events,
        )
    }

    pub fn for_events(
        interested: Vec<&'static str>,
    ) -> (Self, std::rc::Rc<std::cell::RefCell<Vec<PlayerEvent>>>) {
        let (mut listener, events) = Self::new();
        listener.interested = interested;
        (listener, events)
    }
}

impl EventListener for CollectingListener {
    fn on_event(&mut self, event: &PlayerEvent) {
        self.events.borrow_mut().push(event.clone());
    }

    fn interested_events(&self) -> Vec<&'static str> {
        self.interested.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_queues_until_processed() {
        let mut dispatcher = EventDispatcher::new(16);
        let (listener, events) = CollectingListener::new();
        dispatcher.add_listener(Box::new(listener));

        dispatcher.dispatch(PlayerEvent::Pause);
        assert_eq!(dispatcher.queue_len(), 1);
        assert!(events.borrow().is_empty());

        dispatcher.process_queue();
        assert_eq!(dispatcher.queue_len(), 0);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn listener_filtering_by_name() {
        let mut dispatcher = EventDispatcher::new(16);
        let (listener, events) = CollectingListener::for_events(vec!["update"]);
        dispatcher.add_listener(Box::new(listener));

        dispatcher.dispatch(PlayerEvent::Pause);
        dispatcher.dispatch(PlayerEvent::Update { playing: true });
        dispatcher.process_queue();

        let seen = events.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), "update");
    }

    #[test]
    fn bounded_queue_drops_overflow() {
        let mut dispatcher = EventDispatcher::new(2);
        dispatcher.dispatch(PlayerEvent::Pause);
        dispatcher.dispatch(PlayerEvent::Pause);
        dispatcher.dispatch(PlayerEvent::Pause);
        assert_eq!(dispatcher.queue_len(), 2);
    }

    #[test]
    fn disabled_dispatcher_drops_events() {
        let mut dispatcher = EventDispatcher::new(16);
        dispatcher.dispatch(PlayerEvent::Pause);
        dispatcher.set_enabled(false);
        assert_eq!(dispatcher.queue_len(), 0);
        dispatcher.dispatch(PlayerEvent::Pause);
        assert_eq!(dispatcher.queue_len(), 0);
    }
}
