//! Sample-and-hold stream alignment.

use crate::component::Component;
use crate::envelope::Message;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::port::{Producer, ProducerPort, ReceiverPort};

/// Re-emits the most recent value of an irregularly timed data stream on the
/// cadence of an independent clock stream (zero-order hold).
///
/// This is the standard mechanism for fusing streams that arrive at
/// different, non-commensurate rates: the data input only updates the held
/// value, and every clock tick re-emits that value tagged with the **tick's**
/// originating time, realigning the data stream to the clock's timeline.
///
/// Between two ticks only the latest data value is retained; earlier values
/// are overwritten and lost. Ticks arriving before any data has been seen
/// produce nothing, unless the repeater was seeded with an initial value.
///
/// The clock payload type is independent of the data type and its values are
/// ignored; any stream can serve as the clock.
pub struct Repeater<T> {
    out: Producer<T>,
    last: Option<T>,
}

/// Port handles of a built [`Repeater`].
pub struct RepeaterPorts {
    /// Data input: updates the held value, never triggers emission.
    pub data: ReceiverPort,
    /// Clock input: each tick re-emits the held value, if any.
    pub clock: ReceiverPort,
    /// Output carrying re-aligned samples.
    pub out: ProducerPort,
}

impl<T: Clone + Send + 'static> Repeater<T> {
    /// Build a repeater into `pipeline`.
    ///
    /// `Clk` is the clock stream's payload type. When `initial` is `Some`,
    /// ticks arriving before the first data message re-emit that seed value.
    pub fn build<Clk: Clone + Send + 'static>(
        pipeline: &mut Pipeline,
        name: impl Into<String>,
        initial: Option<T>,
    ) -> RepeaterPorts {
        let mut builder = pipeline.component::<Repeater<T>>(name);
        let out = builder.producer::<T>("out");
        let out_port = out.port();
        let data = builder.receiver::<T, _>("in", Repeater::<T>::on_data);
        let clock = builder.receiver::<Clk, _>("clock", Repeater::<T>::on_tick::<Clk>);
        let ports = RepeaterPorts {
            data: data.port(),
            clock: clock.port(),
            out: out_port,
        };
        builder.build(Repeater { out, last: initial });
        ports
    }

    fn on_data(&mut self, message: &Message<T>) -> Result<()> {
        // hold an owned copy; the delivered payload dies with this callback
        self.last = Some(message.payload().clone());
        Ok(())
    }

    fn on_tick<Clk>(&mut self, tick: &Message<Clk>) -> Result<()> {
        if let Some(value) = &self.last {
            self.out.post(value.clone(), tick.originating_time())?;
        }
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Component for Repeater<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::port::{PortId, SubscriberList};
    use crate::temporal::Timestamp;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex};

    fn bare_repeater(initial: Option<i32>) -> Repeater<i32> {
        let subscribers: SubscriberList<i32> = Arc::new(Mutex::new(smallvec::SmallVec::new()));
        let out = Producer::new(
            PortId(1),
            "hold.out".into(),
            subscribers,
            Arc::new(AtomicBool::new(false)),
        );
        Repeater { out, last: initial }
    }

    fn message<T>(payload: T, time_ms: u64) -> Message<T> {
        Message::new(
            Envelope::new(
                PortId(9),
                1,
                Timestamp::from_millis(time_ms),
                Timestamp::from_millis(time_ms),
            ),
            payload,
        )
    }

    #[test]
    fn test_tick_without_data_emits_nothing() {
        let mut repeater = bare_repeater(None);
        repeater.on_tick(&message((), 100)).unwrap();
        assert_eq!(repeater.out.last_originating_time(), None);
    }

    #[test]
    fn test_tick_emits_with_clock_time() {
        let mut repeater = bare_repeater(None);
        repeater.on_data(&message(7, 100)).unwrap();
        repeater.on_tick(&message((), 250)).unwrap();
        assert_eq!(
            repeater.out.last_originating_time(),
            Some(Timestamp::from_millis(250))
        );
    }

    #[test]
    fn test_last_value_wins() {
        let mut repeater = bare_repeater(None);
        repeater.on_data(&message(1, 100)).unwrap();
        repeater.on_data(&message(2, 150)).unwrap();
        assert_eq!(repeater.last, Some(2));
    }

    #[test]
    fn test_seed_value_is_held() {
        let mut repeater = bare_repeater(Some(42));
        repeater.on_tick(&message((), 100)).unwrap();
        assert_eq!(
            repeater.out.last_originating_time(),
            Some(Timestamp::from_millis(100))
        );
        assert_eq!(repeater.last, Some(42));
    }
}
