//! Inbound port: binds an upstream producer to a component callback.

use super::{PortId, ReceiverPort};
use std::marker::PhantomData;

/// An inbound port owned by a component.
///
/// A receiver is bound to exactly one callback at creation time and accepts
/// at most one upstream producer; fan-in is not supported, so a component
/// consuming several sources owns one receiver per source. Deliveries are
/// queued on the owning component's mailbox and run serialized with every
/// other callback of that component, in posting order per receiver.
pub struct Receiver<T> {
    id: PortId,
    name: String,
    _payload: PhantomData<fn(T)>,
}

impl<T> Receiver<T> {
    pub(crate) fn new(id: PortId, name: String) -> Self {
        Self {
            id,
            name,
            _payload: PhantomData,
        }
    }

    /// Handle for connecting an upstream producer to this receiver.
    pub fn port(&self) -> ReceiverPort {
        ReceiverPort(self.id)
    }

    /// The qualified port name (`component.port`).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> std::fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
