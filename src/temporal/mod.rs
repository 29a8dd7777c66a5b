//! Logical time used for message ordering and stream alignment.

mod timestamp;

pub use timestamp::Timestamp;
