//! Concrete components built purely on the substrate contracts.
//!
//! - [`Repeater`]: sample-and-hold stream alignment (the clock-driven family)
//! - [`Timer`]: clock tick source
//! - [`Sequence`]: scripted source with explicit timestamps
//! - [`Map`]: 1-to-1 transform preserving originating times
//! - [`Collector`]: recording sink

mod collector;
mod map;
mod repeater;
mod sequence;
mod timer;

pub use collector::{Collector, CollectorHandle};
pub use map::Map;
pub use repeater::{Repeater, RepeaterPorts};
pub use sequence::Sequence;
pub use timer::Timer;
