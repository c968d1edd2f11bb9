//! Events Module
//!
//! Sorts incoming X11 events into "the window list may have changed" and
//! "nothing for us". The engine never acts on an event directly: any relevant
//! event just marks the next reconcile as needed, so lost or reordered events
//! cannot leave the registry out of date.

use tracing::{debug, trace, warn};
use x11rb::protocol::xproto::Atom;
use x11rb::protocol::Event;

/// Result of routing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Window set, attributes or focus may have changed
    Reconcile,
    /// Event should be ignored
    Ignore,
}

/// Event router - decides which events need a reconcile
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    watched_properties: Vec<Atom>,
}

impl EventRouter {
    /// Create a router that reacts to changes of `watched_properties`
    pub fn new(watched_properties: impl IntoIterator<Item = Atom>) -> Self {
        Self {
            watched_properties: watched_properties.into_iter().collect(),
        }
    }

    /// Route an event
    pub fn route_event(&self, event: &Event) -> EventResult {
        match event {
            Event::CreateNotify(e) => {
                debug!("CreateNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::DestroyNotify(e) => {
                debug!("DestroyNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::MapNotify(e) => {
                debug!("MapNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::UnmapNotify(e) => {
                debug!("UnmapNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::ReparentNotify(e) => {
                debug!("ReparentNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::ConfigureNotify(e) => {
                // Frequent during drags
                trace!("ConfigureNotify: window {}", e.window);
                EventResult::Reconcile
            }
            Event::PropertyNotify(e) => {
                if self.watched_properties.contains(&e.atom) {
                    debug!("PropertyNotify: window {}, atom {}", e.window, e.atom);
                    EventResult::Reconcile
                } else {
                    EventResult::Ignore
                }
            }
            Event::Error(e) => {
                // Usually a request racing a window's destruction
                warn!(
                    "X11 Error: error_code={}, request_code={}, minor_code={}",
                    e.error_code, e.major_opcode, e.minor_opcode
                );
                EventResult::Ignore
            }
            _ => EventResult::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{
        DestroyNotifyEvent, MotionNotifyEvent, Property, PropertyNotifyEvent,
    };

    const NET_WM_NAME: Atom = 303;
    const UNRELATED: Atom = 999;

    fn router() -> EventRouter {
        EventRouter::new([NET_WM_NAME])
    }

    fn property_notify(atom: Atom) -> Event {
        Event::PropertyNotify(PropertyNotifyEvent {
            window: 0x2a00007,
            atom,
            state: Property::NEW_VALUE,
            ..Default::default()
        })
    }

    #[test]
    fn test_structure_events_need_reconcile() {
        let event = Event::DestroyNotify(DestroyNotifyEvent {
            window: 0x2a00007,
            ..Default::default()
        });
        assert_eq!(router().route_event(&event), EventResult::Reconcile);
    }

    #[test]
    fn test_only_watched_properties_need_reconcile() {
        assert_eq!(router().route_event(&property_notify(NET_WM_NAME)), EventResult::Reconcile);
        assert_eq!(router().route_event(&property_notify(UNRELATED)), EventResult::Ignore);
    }

    #[test]
    fn test_input_events_are_ignored() {
        let event = Event::MotionNotify(MotionNotifyEvent::default());
        assert_eq!(router().route_event(&event), EventResult::Ignore);
    }
}
