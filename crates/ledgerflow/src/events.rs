//! Lifecycle events emitted by the chart controller.
//!
//! Subscribers receive events by reference after the controller has finished the step that
//! produced them; they cannot call back into the chart.

use crate::controller::UpdateType;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChartEvent {
    RenderStart {
        node_count: usize,
        link_count: usize,
    },
    DataProcessed {
        node_count: usize,
        link_count: usize,
        warning_count: usize,
    },
    RenderComplete {
        render_time: Duration,
        node_count: usize,
        link_count: usize,
    },
    RenderError {
        error: String,
    },
    PartialUpdate {
        update_type: UpdateType,
    },
    Resized {
        width: f64,
        height: f64,
    },
}

impl ChartEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RenderStart { .. } => "renderStart",
            Self::DataProcessed { .. } => "dataProcessed",
            Self::RenderComplete { .. } => "renderComplete",
            Self::RenderError { .. } => "renderError",
            Self::PartialUpdate { .. } => "partialUpdate",
            Self::Resized { .. } => "resized",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChartEvent) + Send>;

/// Observer list owned by one chart.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&ChartEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn emit(&mut self, event: ChartEvent) {
        tracing::trace!(event = event.name(), "chart event");
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::default();
        let sink = Arc::clone(&seen);
        let id = bus.subscribe(move |e| sink.lock().unwrap().push(e.name()));

        bus.emit(ChartEvent::Resized {
            width: 800.0,
            height: 600.0,
        });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(ChartEvent::RenderError {
            error: "boom".to_string(),
        });

        assert_eq!(*seen.lock().unwrap(), vec!["resized"]);
        assert!(bus.is_empty());
    }

    #[test]
    fn events_serialize_with_camel_case_fields() {
        let event = ChartEvent::RenderStart {
            node_count: 3,
            link_count: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "renderStart", "nodeCount": 3, "linkCount": 2})
        );
    }
}
