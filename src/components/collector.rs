//! Terminal sink that records every delivered message.

use crate::component::Sink;
use crate::envelope::Message;
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// A sink that stores every delivered message, observable from outside the
/// pipeline through a [`CollectorHandle`].
///
/// Useful as the terminal stage in tests and diagnostics: each delivered
/// message is cloned into shared storage, so assertions can inspect payloads
/// and envelopes after a [`drain`](crate::pipeline::Pipeline::drain).
///
/// # Example
///
/// ```rust,ignore
/// let collector = Collector::new();
/// let received = collector.handle();
/// let sink = pipeline.add_sink("sink", collector);
/// // ... run the pipeline ...
/// assert_eq!(received.payloads(), vec![1, 2, 3]);
/// ```
pub struct Collector<T> {
    messages: Arc<Mutex<Vec<Message<T>>>>,
}

/// Shared view of the messages a [`Collector`] has received.
#[derive(Clone)]
pub struct CollectorHandle<T> {
    messages: Arc<Mutex<Vec<Message<T>>>>,
}

impl<T> Collector<T> {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a handle observing this collector's messages.
    pub fn handle(&self) -> CollectorHandle<T> {
        CollectorHandle {
            messages: Arc::clone(&self.messages),
        }
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Sink for Collector<T> {
    type In = T;

    fn consume(&mut self, message: &Message<T>) -> Result<()> {
        self.messages
            .lock()
            .expect("collector storage poisoned")
            .push(message.clone());
        Ok(())
    }
}

impl<T: Clone> CollectorHandle<T> {
    /// Number of messages received so far.
    pub fn len(&self) -> usize {
        self.messages.lock().expect("collector storage poisoned").len()
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every received message.
    pub fn messages(&self) -> Vec<Message<T>> {
        self.messages
            .lock()
            .expect("collector storage poisoned")
            .clone()
    }

    /// Snapshot of the received payloads, in delivery order.
    pub fn payloads(&self) -> Vec<T> {
        self.messages
            .lock()
            .expect("collector storage poisoned")
            .iter()
            .map(|message| message.payload().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::port::PortId;
    use crate::temporal::Timestamp;

    #[test]
    fn test_collector_records_messages() {
        let mut collector = Collector::new();
        let handle = collector.handle();
        assert!(handle.is_empty());

        for i in 0..3u64 {
            let message = Message::new(
                Envelope::new(
                    PortId(1),
                    i + 1,
                    Timestamp::from_millis(i * 10),
                    Timestamp::from_millis(i * 10),
                ),
                i as i32,
            );
            collector.consume(&message).unwrap();
        }

        assert_eq!(handle.len(), 3);
        assert_eq!(handle.payloads(), vec![0, 1, 2]);
        assert_eq!(
            handle.messages()[2].originating_time(),
            Timestamp::from_millis(20)
        );
    }
}
