//! Outbound port: constructs envelopes and broadcasts messages.

use super::{PortId, ProducerPort};
use crate::envelope::{Envelope, Message};
use crate::error::{Error, Result};
use crate::temporal::Timestamp;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Delivery function registered by a connected receiver. Takes ownership of
/// the receiver's independent copy of each message.
pub(crate) type DeliveryFn<T> = Arc<dyn Fn(Message<T>) + Send + Sync>;

/// Shared list of deliveries bound to one producer. Most producers fan out to
/// one or two receivers.
pub(crate) type SubscriberList<T> = Arc<Mutex<SmallVec<[DeliveryFn<T>; 2]>>>;

/// An outbound port owned by a component.
///
/// `post` stamps a fresh [`Envelope`] (source id, next sequence id, the given
/// originating time, wall-clock creation time) and hands one clone of the
/// payload to every connected receiver. The call never waits for downstream
/// processing; deliveries are queued on each receiving component's mailbox.
///
/// Originating times posted on one producer must be non-decreasing. A post
/// that moves backwards fails with [`Error::OrderingViolation`] and leaves
/// previously delivered state untouched.
pub struct Producer<T> {
    id: PortId,
    name: String,
    subscribers: SubscriberList<T>,
    stopped: Arc<AtomicBool>,
    last_time: Option<Timestamp>,
    next_sequence: u64,
}

impl<T: Clone + Send + 'static> Producer<T> {
    pub(crate) fn new(
        id: PortId,
        name: String,
        subscribers: SubscriberList<T>,
        stopped: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            name,
            subscribers,
            stopped,
            last_time: None,
            next_sequence: 0,
        }
    }

    /// Handle for connecting this producer to a receiver.
    pub fn port(&self) -> ProducerPort {
        ProducerPort(self.id)
    }

    /// The qualified port name (`component.port`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Originating time of the most recent successful post, if any.
    pub fn last_originating_time(&self) -> Option<Timestamp> {
        self.last_time
    }

    /// Post a payload with the given originating time.
    ///
    /// Fails with [`Error::PipelineStopped`] once the owning pipeline has
    /// been signalled stopped, and with [`Error::OrderingViolation`] if
    /// `originating_time` is strictly earlier than the previous post on this
    /// producer.
    pub fn post(&mut self, payload: T, originating_time: Timestamp) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(Error::PipelineStopped);
        }
        if let Some(last) = self.last_time {
            if originating_time < last {
                return Err(Error::OrderingViolation {
                    port: self.name.clone(),
                    attempted: originating_time,
                    last,
                });
            }
        }

        self.next_sequence += 1;
        self.last_time = Some(originating_time);
        let envelope = Envelope::new(
            self.id,
            self.next_sequence,
            originating_time,
            Timestamp::now(),
        );

        let subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        for deliver in subscribers.iter() {
            deliver(Message::new(envelope, payload.clone()));
        }
        crate::observability::record_posted(&self.name);
        tracing::trace!(
            port = %self.name,
            time = %originating_time,
            fanout = subscribers.len(),
            "posted"
        );
        Ok(())
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("last_time", &self.last_time)
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producer_with_log() -> (Producer<i32>, Arc<Mutex<Vec<Message<i32>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let deliver: DeliveryFn<i32> = Arc::new(move |message| {
            sink.lock().unwrap().push(message);
        });
        let subscribers: SubscriberList<i32> =
            Arc::new(Mutex::new(SmallVec::from_iter([deliver])));
        let producer = Producer::new(
            PortId(1),
            "test.out".into(),
            subscribers,
            Arc::new(AtomicBool::new(false)),
        );
        (producer, log)
    }

    #[test]
    fn test_post_stamps_envelope() {
        let (mut producer, log) = producer_with_log();

        producer.post(10, Timestamp::from_millis(100)).unwrap();
        producer.post(20, Timestamp::from_millis(200)).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].payload(), &10);
        assert_eq!(log[0].envelope().source_id(), PortId(1));
        assert_eq!(log[0].envelope().sequence_id(), 1);
        assert_eq!(log[1].envelope().sequence_id(), 2);
        assert_eq!(log[1].originating_time(), Timestamp::from_millis(200));
    }

    #[test]
    fn test_post_rejects_backwards_time() {
        let (mut producer, log) = producer_with_log();

        producer.post(1, Timestamp::from_millis(100)).unwrap();
        let err = producer.post(2, Timestamp::from_millis(50)).unwrap_err();
        assert!(matches!(err, Error::OrderingViolation { .. }));

        // the rejected post delivered nothing and did not advance state
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(
            producer.last_originating_time(),
            Some(Timestamp::from_millis(100))
        );

        // equal times remain valid; sequence ids disambiguate
        producer.post(3, Timestamp::from_millis(100)).unwrap();
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_post_after_stop_fails() {
        let stopped = Arc::new(AtomicBool::new(false));
        let subscribers: SubscriberList<i32> = Arc::new(Mutex::new(SmallVec::new()));
        let mut producer = Producer::new(
            PortId(1),
            "test.out".into(),
            subscribers,
            Arc::clone(&stopped),
        );

        producer.post(1, Timestamp::from_millis(1)).unwrap();
        stopped.store(true, Ordering::Release);
        assert!(matches!(
            producer.post(2, Timestamp::from_millis(2)),
            Err(Error::PipelineStopped)
        ));
    }
}
