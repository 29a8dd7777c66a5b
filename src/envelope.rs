//! Message envelopes: the metadata attached to every value crossing a port.

use crate::port::PortId;
use crate::temporal::Timestamp;
use std::cmp::Ordering;

/// Metadata stamped onto every message by the producing port.
///
/// All fields are fixed at construction; a derived envelope (for example,
/// re-emitting a held value under a different originating time) is always a
/// new value, never an in-place mutation.
///
/// For a fixed source, `originating_time` is non-decreasing across successive
/// messages and `sequence_id` is strictly increasing, so the
/// `(originating_time, source_id, sequence_id)` triple orders messages
/// totally even when several share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Envelope {
    source_id: PortId,
    sequence_id: u64,
    originating_time: Timestamp,
    creation_time: Timestamp,
}

impl Envelope {
    pub(crate) fn new(
        source_id: PortId,
        sequence_id: u64,
        originating_time: Timestamp,
        creation_time: Timestamp,
    ) -> Self {
        Self {
            source_id,
            sequence_id,
            originating_time,
            creation_time,
        }
    }

    /// The producing port, unique within one pipeline run.
    pub fn source_id(&self) -> PortId {
        self.source_id
    }

    /// Per-source sequence number; strictly increasing, used as a tie-break.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Logical time of the underlying real-world event. The ordering key for
    /// every delivery guarantee, distinct from wall-clock creation time.
    pub fn originating_time(&self) -> Timestamp {
        self.originating_time
    }

    /// Wall-clock time the message was produced. Diagnostic only.
    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    /// Derive a new envelope carrying a different originating time.
    pub fn with_originating_time(&self, originating_time: Timestamp) -> Self {
        Self {
            originating_time,
            ..*self
        }
    }
}

impl PartialOrd for Envelope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Envelope {
    /// Diagnostic ordering: lexicographic on
    /// `(originating_time, source_id, sequence_id)`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.originating_time
            .cmp(&other.originating_time)
            .then(self.source_id.cmp(&other.source_id))
            .then(self.sequence_id.cmp(&other.sequence_id))
    }
}

/// An envelope paired with a payload of type `T`.
///
/// The runtime delivers messages to receiver callbacks by reference; the
/// borrow ends with the callback, at which point the delivered value is
/// recycled. A component that needs the payload to outlive the callback
/// (for example, holding it until a later clock tick) must clone it into
/// storage it owns.
#[derive(Debug, Clone)]
pub struct Message<T> {
    envelope: Envelope,
    payload: T,
}

impl<T> Message<T> {
    pub(crate) fn new(envelope: Envelope, payload: T) -> Self {
        Self { envelope, payload }
    }

    /// The envelope stamped by the producing port.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The carried value.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Shorthand for the envelope's originating time.
    pub fn originating_time(&self) -> Timestamp {
        self.envelope.originating_time
    }
}
