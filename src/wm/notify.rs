//! Notification bus
//!
//! Fans window lifecycle events out to the panel, taskbar and any other
//! collaborator. Delivery is synchronous and in emission order, which is what
//! keeps the per-window sequence causal: `Added` first, `Removed` last.
//! There is no history; late listeners catch up with a registry snapshot.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::shared::{Geometry, NativeHandle, WindowState};

/// Events delivered to collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WindowEvent {
    WindowAdded {
        handle: NativeHandle,
        title: String,
        geometry: Geometry,
    },
    WindowRemoved {
        handle: NativeHandle,
    },
    WindowStateChanged {
        handle: NativeHandle,
        state: WindowState,
    },
    WindowTitleChanged {
        handle: NativeHandle,
        title: String,
    },
    /// Geometry moved without a state change (native move/resize, workspace change)
    WindowGeometryChanged {
        handle: NativeHandle,
        geometry: Geometry,
    },
    WindowFocused {
        handle: NativeHandle,
    },
}

impl WindowEvent {
    pub fn handle(&self) -> NativeHandle {
        match self {
            Self::WindowAdded { handle, .. }
            | Self::WindowRemoved { handle }
            | Self::WindowStateChanged { handle, .. }
            | Self::WindowTitleChanged { handle, .. }
            | Self::WindowGeometryChanged { handle, .. }
            | Self::WindowFocused { handle } => *handle,
        }
    }
}

/// Typed handlers, one per event kind; implement only what you need
pub trait WindowListener: Send {
    fn window_added(&mut self, _handle: NativeHandle, _title: &str, _geometry: Geometry) {}
    fn window_removed(&mut self, _handle: NativeHandle) {}
    fn window_state_changed(&mut self, _handle: NativeHandle, _state: WindowState) {}
    fn window_title_changed(&mut self, _handle: NativeHandle, _title: &str) {}
    fn window_geometry_changed(&mut self, _handle: NativeHandle, _geometry: Geometry) {}
    fn window_focused(&mut self, _handle: NativeHandle) {}

    /// A closed listener is dropped from the bus after the current event
    fn is_closed(&self) -> bool {
        false
    }
}

/// Forwards every event into an unbounded tokio channel
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<WindowEvent>,
}

impl ChannelListener {
    pub fn new(tx: mpsc::UnboundedSender<WindowEvent>) -> Self {
        Self { tx }
    }

    fn forward(&mut self, event: WindowEvent) {
        // Receiver gone: is_closed() reports it and the bus prunes us
        let _ = self.tx.send(event);
    }
}

impl WindowListener for ChannelListener {
    fn window_added(&mut self, handle: NativeHandle, title: &str, geometry: Geometry) {
        self.forward(WindowEvent::WindowAdded { handle, title: title.to_string(), geometry });
    }

    fn window_removed(&mut self, handle: NativeHandle) {
        self.forward(WindowEvent::WindowRemoved { handle });
    }

    fn window_state_changed(&mut self, handle: NativeHandle, state: WindowState) {
        self.forward(WindowEvent::WindowStateChanged { handle, state });
    }

    fn window_title_changed(&mut self, handle: NativeHandle, title: &str) {
        self.forward(WindowEvent::WindowTitleChanged { handle, title: title.to_string() });
    }

    fn window_geometry_changed(&mut self, handle: NativeHandle, geometry: Geometry) {
        self.forward(WindowEvent::WindowGeometryChanged { handle, geometry });
    }

    fn window_focused(&mut self, handle: NativeHandle) {
        self.forward(WindowEvent::WindowFocused { handle });
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Identifies a registered listener for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observer list
#[derive(Default)]
pub struct NotificationBus {
    listeners: Vec<(ListenerId, Box<dyn WindowListener>)>,
    next_id: u64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Box<dyn WindowListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when `id` was not registered
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Register a channel adapter and hand back its receiving end
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<WindowEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(Box::new(ChannelListener::new(tx)));
        rx
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self, event: &WindowEvent) {
        debug!("Notify: {:?}", event);
        for (_, listener) in self.listeners.iter_mut() {
            match event {
                WindowEvent::WindowAdded { handle, title, geometry } => {
                    listener.window_added(*handle, title, *geometry)
                }
                WindowEvent::WindowRemoved { handle } => listener.window_removed(*handle),
                WindowEvent::WindowStateChanged { handle, state } => {
                    listener.window_state_changed(*handle, *state)
                }
                WindowEvent::WindowTitleChanged { handle, title } => {
                    listener.window_title_changed(*handle, title)
                }
                WindowEvent::WindowGeometryChanged { handle, geometry } => {
                    listener.window_geometry_changed(*handle, *geometry)
                }
                WindowEvent::WindowFocused { handle } => listener.window_focused(*handle),
            }
        }
        self.listeners.retain(|(_, listener)| !listener.is_closed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Taskbar stand-in that only cares about titles
    struct TitleTracker {
        titles: Arc<Mutex<Vec<(NativeHandle, String)>>>,
    }

    impl WindowListener for TitleTracker {
        fn window_added(&mut self, handle: NativeHandle, title: &str, _geometry: Geometry) {
            self.titles.lock().unwrap().push((handle, title.to_string()));
        }

        fn window_title_changed(&mut self, handle: NativeHandle, title: &str) {
            self.titles.lock().unwrap().push((handle, title.to_string()));
        }
    }

    #[test]
    fn test_typed_listener_receives_only_its_kinds() {
        let titles = Arc::new(Mutex::new(Vec::new()));
        let mut bus = NotificationBus::new();
        bus.register(Box::new(TitleTracker { titles: titles.clone() }));

        bus.emit(&WindowEvent::WindowAdded {
            handle: 1,
            title: "Terminal".into(),
            geometry: Geometry::new(0, 0, 100, 100),
        });
        bus.emit(&WindowEvent::WindowStateChanged { handle: 1, state: WindowState::Maximized });
        bus.emit(&WindowEvent::WindowTitleChanged { handle: 1, title: "vim".into() });

        let titles = titles.lock().unwrap();
        assert_eq!(*titles, vec![(1, "Terminal".to_string()), (1, "vim".to_string())]);
    }

    #[test]
    fn test_channel_preserves_order() {
        let mut bus = NotificationBus::new();
        let mut rx = bus.subscribe();

        bus.emit(&WindowEvent::WindowAdded {
            handle: 7,
            title: "a".into(),
            geometry: Geometry::default(),
        });
        bus.emit(&WindowEvent::WindowStateChanged { handle: 7, state: WindowState::Minimized });
        bus.emit(&WindowEvent::WindowRemoved { handle: 7 });

        assert!(matches!(rx.try_recv(), Ok(WindowEvent::WindowAdded { handle: 7, .. })));
        assert!(matches!(rx.try_recv(), Ok(WindowEvent::WindowStateChanged { handle: 7, .. })));
        assert_eq!(rx.try_recv(), Ok(WindowEvent::WindowRemoved { handle: 7 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let mut bus = NotificationBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.listener_count(), 1);

        drop(rx);
        bus.emit(&WindowEvent::WindowFocused { handle: 3 });

        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_unregister() {
        let mut bus = NotificationBus::new();
        let id = bus.register(Box::new(TitleTracker { titles: Arc::default() }));
        assert!(bus.unregister(id));
        assert!(!bus.unregister(id));
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(WindowEvent::WindowRemoved { handle: 42 }).unwrap();
        assert_eq!(json["type"], "WindowRemoved");
        assert_eq!(json["handle"], 42);
    }
}
