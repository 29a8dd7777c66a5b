//! Pipeline event system for async event handling.
//!
//! Events are emitted by the pipeline during execution and can be
//! received asynchronously by the caller.

use super::graph::PipelineState;
use std::fmt;
use std::future::Future;
use tokio::sync::broadcast;

/// Events emitted by the pipeline during execution.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Pipeline state has changed.
    StateChanged {
        /// Previous state.
        from: PipelineState,
        /// New state.
        to: PipelineState,
    },

    /// Pipeline execution started.
    Started,

    /// Pipeline execution stopped.
    Stopped,

    /// A component's task started.
    ComponentStarted {
        /// The component that started.
        component: String,
    },

    /// A component's task finished.
    ComponentStopped {
        /// The component that finished.
        component: String,
        /// Number of deliveries it processed.
        processed: u64,
    },

    /// An error occurred in the pipeline.
    Error {
        /// The error message.
        message: String,
        /// The component where the error occurred (if known).
        component: Option<String>,
    },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::StateChanged { from, to } => {
                write!(f, "StateChanged: {:?} -> {:?}", from, to)
            }
            PipelineEvent::Started => write!(f, "Pipeline started"),
            PipelineEvent::Stopped => write!(f, "Pipeline stopped"),
            PipelineEvent::ComponentStarted { component } => {
                write!(f, "Component {} started", component)
            }
            PipelineEvent::ComponentStopped {
                component,
                processed,
            } => {
                write!(f, "Component {} finished ({} deliveries)", component, processed)
            }
            PipelineEvent::Error { message, component } => {
                if let Some(c) = component {
                    write!(f, "Error in {}: {}", c, message)
                } else {
                    write!(f, "Error: {}", message)
                }
            }
        }
    }
}

/// Sender for pipeline events.
///
/// This is held by the pipeline and used to emit events.
#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventSender {
    /// Create a new event sender with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event.
    ///
    /// Returns the number of receivers that received the event.
    /// Returns 0 if there are no receivers (which is fine).
    pub fn send(&self, event: PipelineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Send a state changed event.
    pub fn send_state_changed(&self, from: PipelineState, to: PipelineState) {
        self.send(PipelineEvent::StateChanged { from, to });
    }

    /// Send a component started event.
    pub fn send_component_started(&self, component: impl Into<String>) {
        self.send(PipelineEvent::ComponentStarted {
            component: component.into(),
        });
    }

    /// Send a component stopped event.
    pub fn send_component_stopped(&self, component: impl Into<String>, processed: u64) {
        self.send(PipelineEvent::ComponentStopped {
            component: component.into(),
            processed,
        });
    }

    /// Send an error event.
    pub fn send_error(&self, message: impl Into<String>, component: Option<String>) {
        self.send(PipelineEvent::Error {
            message: message.into(),
            component,
        });
    }

    /// Create a receiver for events.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Create a stream of events.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receiver for pipeline events.
///
/// Multiple receivers can be created from a single sender.
pub struct EventReceiver {
    receiver: broadcast::Receiver<PipelineEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` if the sender has been dropped.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // We missed some events, continue to get the next one
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is available or the sender has been dropped.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // We missed some events, try again
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

/// A stream adapter for receiving events.
///
/// Implements `Stream` for use with async iteration.
pub struct EventStream {
    receiver: EventReceiver,
}

impl EventStream {
    /// Create a new event stream from a receiver.
    pub fn new(receiver: EventReceiver) -> Self {
        Self { receiver }
    }
}

impl futures::Stream for EventStream {
    type Item = PipelineEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        // Use a pinned future for the async recv
        let fut = self.receiver.recv();
        tokio::pin!(fut);
        fut.poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_send_recv() {
        let sender = EventSender::new(16);
        let mut receiver = sender.subscribe();

        sender.send(PipelineEvent::Started);

        let event = receiver.recv().await.unwrap();
        assert!(matches!(event, PipelineEvent::Started));
    }

    #[tokio::test]
    async fn test_multiple_receivers() {
        let sender = EventSender::new(16);
        let mut receiver1 = sender.subscribe();
        let mut receiver2 = sender.subscribe();

        sender.send_state_changed(PipelineState::Created, PipelineState::Running);

        // Both receivers should get the event
        let e1 = receiver1.recv().await.unwrap();
        let e2 = receiver2.recv().await.unwrap();

        assert!(matches!(e1, PipelineEvent::StateChanged { .. }));
        assert!(matches!(e2, PipelineEvent::StateChanged { .. }));
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let sender = EventSender::new(16);
        let mut receiver = sender.subscribe();
        assert!(receiver.try_recv().is_none());

        sender.send_component_started("clock");
        assert!(matches!(
            receiver.try_recv(),
            Some(PipelineEvent::ComponentStarted { .. })
        ));
    }

    #[tokio::test]
    async fn test_event_stream() {
        use futures::StreamExt;

        let sender = EventSender::new(16);
        let mut stream = sender.stream();

        sender.send(PipelineEvent::Started);

        let event = stream.next().await.unwrap();
        assert!(matches!(event, PipelineEvent::Started));
    }

    #[test]
    fn test_event_display() {
        let event = PipelineEvent::Error {
            message: "test error".to_string(),
            component: Some("hold".to_string()),
        };
        assert_eq!(format!("{}", event), "Error in hold: test error");

        let event = PipelineEvent::Stopped;
        assert_eq!(format!("{}", event), "Pipeline stopped");
    }
}
