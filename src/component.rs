//! Component contracts: lifecycle plus the three capability roles.
//!
//! A component is a named participant in the pipeline graph owning zero or
//! more receivers and zero or more producers. The capability roles compose:
//!
//! - [`Source`]: produces messages, no inputs (e.g. a sensor or clock)
//! - [`Sink`]: consumes messages, no outputs (e.g. a recorder or display feed)
//! - [`Transform`]: one logical input in, one logical output out
//!
//! Role implementations are registered with
//! [`Pipeline::add_source`](crate::pipeline::Pipeline::add_source),
//! [`add_sink`](crate::pipeline::Pipeline::add_sink) and
//! [`add_transform`](crate::pipeline::Pipeline::add_transform). Components
//! that need ports beyond their role, such as the
//! [`Repeater`](crate::components::Repeater)'s auxiliary clock input, are
//! built directly on a
//! [`ComponentBuilder`](crate::pipeline::ComponentBuilder) and implement only
//! [`Component`].
//!
//! # Execution model
//!
//! Callbacks are **synchronous**; the pipeline handles async scheduling. All
//! callbacks of one component run serialized on its own task, so component
//! state needs no internal locking. Different components run concurrently.

use crate::envelope::Message;
use crate::error::Result;
use crate::temporal::Timestamp;

/// Lifecycle contract every graph participant implements.
///
/// Components are created during graph construction, connected to peers, and
/// activated when the pipeline starts; they receive no further messages after
/// the pipeline stops and are not reusable across runs. Both hooks run on the
/// component's own task, serialized with its callbacks.
pub trait Component: Send + 'static {
    /// Called once when the pipeline activates, before any delivery.
    fn on_start(&mut self) {}

    /// Called once after the component's last callback has finished.
    fn on_stop(&mut self) {}
}

/// Stateless placeholder component, used for externally driven input ports.
impl Component for () {}

/// A producer-only component driven at a fixed cadence.
///
/// `produce` is invoked on every cadence tick of the component's task.
/// Return `Ok(None)` to retire the cadence once the source is exhausted.
pub trait Source: Send + 'static {
    /// Payload type this source emits.
    type Out: Clone + Send + 'static;

    /// Produce the next sample and its originating time.
    fn produce(&mut self) -> Result<Option<(Self::Out, Timestamp)>>;
}

/// A consumer-only component: the terminal end of a stream.
pub trait Sink: Send + 'static {
    /// Payload type this sink accepts.
    type In: Clone + Send + 'static;

    /// Consume a delivered message. The payload borrow ends with this call;
    /// retaining it requires an explicit clone.
    fn consume(&mut self, message: &Message<Self::In>) -> Result<()>;
}

/// A consumer-producer component: transforms an input stream inline.
pub trait Transform: Send + 'static {
    /// Payload type this transform accepts.
    type In: Clone + Send + 'static;
    /// Payload type this transform emits.
    type Out: Clone + Send + 'static;

    /// Transform a delivered message into zero, one, or several outputs.
    fn transform(&mut self, message: &Message<Self::In>) -> Result<Output<Self::Out>>;
}

/// Output of a [`Transform`] step: each emitted value carries the
/// originating time it should be posted with.
#[derive(Debug)]
pub enum Output<T> {
    /// No output (the input was filtered out).
    None,
    /// A single output value.
    Single(T, Timestamp),
    /// Several output values, posted in order.
    Multiple(Vec<(T, Timestamp)>),
}

impl<T> Output<T> {
    /// Create a single-value output.
    #[inline]
    pub fn single(value: T, time: Timestamp) -> Self {
        Self::Single(value, time)
    }

    /// Create an empty output.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Check if there is no output.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Get the number of output values.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(..) => 1,
            Self::Multiple(v) => v.len(),
        }
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to a Vec of timestamped values.
    pub fn into_vec(self) -> Vec<(T, Timestamp)> {
        match self {
            Self::None => vec![],
            Self::Single(value, time) => vec![(value, time)],
            Self::Multiple(v) => v,
        }
    }
}

impl<T> Default for Output<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T> From<Option<(T, Timestamp)>> for Output<T> {
    fn from(opt: Option<(T, Timestamp)>) -> Self {
        match opt {
            Some((value, time)) => Self::Single(value, time),
            None => Self::None,
        }
    }
}

impl<T> From<Vec<(T, Timestamp)>> for Output<T> {
    fn from(mut v: Vec<(T, Timestamp)>) -> Self {
        match v.len() {
            0 => Self::None,
            1 => {
                let (value, time) = v.remove(0);
                Self::Single(value, time)
            }
            _ => Self::Multiple(v),
        }
    }
}

impl<T> FromIterator<(T, Timestamp)> for Output<T> {
    fn from_iter<I: IntoIterator<Item = (T, Timestamp)>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_none() {
        let out: Output<i32> = Output::none();
        assert!(out.is_none());
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn test_output_from_option() {
        let out: Output<i32> = Some((1, Timestamp::from_millis(10))).into();
        assert_eq!(out.len(), 1);

        let out: Output<i32> = None.into();
        assert!(out.is_none());
    }

    #[test]
    fn test_output_from_vec() {
        let out: Output<i32> = vec![].into();
        assert!(out.is_none());

        let out: Output<i32> = vec![(1, Timestamp::from_millis(10))].into();
        assert!(matches!(out, Output::Single(1, _)));

        let out: Output<i32> = vec![
            (1, Timestamp::from_millis(10)),
            (2, Timestamp::from_millis(20)),
        ]
        .into();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_output_collect() {
        let out: Output<i32> = (0..3)
            .map(|i| (i, Timestamp::from_millis(i as u64)))
            .collect();
        let values: Vec<i32> = out.into_vec().into_iter().map(|(v, _)| v).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }
}
