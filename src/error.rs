//! Error types for chronoflow.

use crate::temporal::Timestamp;
use thiserror::Error;

/// Result type alias using chronoflow's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chronoflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A producer was asked to post with an originating time older than its
    /// previous post. Monotonicity is mandatory at the source.
    #[error("ordering violation on '{port}': {attempted} is earlier than previous post at {last}")]
    OrderingViolation {
        /// Name of the offending producer port.
        port: String,
        /// The originating time of the rejected post.
        attempted: Timestamp,
        /// The originating time of the last accepted post.
        last: Timestamp,
    },

    /// Attempted to connect ports carrying different payload types.
    #[error("type mismatch: producer '{producer}' carries {produced}, receiver '{receiver}' expects {expected}")]
    TypeMismatch {
        /// Name of the producer port.
        producer: String,
        /// Name of the receiver port.
        receiver: String,
        /// Payload type produced upstream.
        produced: &'static str,
        /// Payload type the receiver expects.
        expected: &'static str,
    },

    /// The receiver already has an upstream producer bound to it.
    #[error("receiver '{0}' already has an upstream producer")]
    AlreadyConnected(String),

    /// A post was attempted after the pipeline was signalled stopped.
    #[error("pipeline is stopped")]
    PipelineStopped,

    /// A port handle does not belong to this pipeline.
    #[error("unknown port: {0}")]
    UnknownPort(String),

    /// A lifecycle operation was attempted in the wrong pipeline state.
    #[error("invalid pipeline state: {0}")]
    InvalidState(String),

    /// The requested connection would close a cycle in the component graph.
    #[error("connecting '{from}' to '{to}' would create a cycle")]
    Cycle {
        /// Component owning the producer.
        from: String,
        /// Component owning the receiver.
        to: String,
    },
}
