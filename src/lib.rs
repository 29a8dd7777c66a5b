//! # chronoflow
//!
//! A time-synchronized streaming dataflow runtime.
//!
//! Chronoflow composes streaming components (sensors, transforms, sinks)
//! that exchange timestamped messages at independent, possibly unrelated
//! rates, and keeps delivery deterministic while they do:
//!
//! - **Ordered by logical time**: every message carries an [`Envelope`]
//!   whose originating time is the single ordering key; producers reject
//!   posts that move backwards.
//! - **Serialized per component**: each component runs on its own task, so
//!   its callbacks never overlap and its state needs no locking, while
//!   different components run concurrently.
//! - **Owned payloads**: a delivered payload is borrowed for the duration of
//!   the callback only; holding one past the callback takes an explicit
//!   clone into component-owned storage.
//! - **Clock-driven alignment**: components like the sample-and-hold
//!   [`Repeater`](components::Repeater) re-align irregular streams to the
//!   cadence of an independent clock stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chronoflow::prelude::*;
//! use std::time::Duration;
//!
//! let mut pipeline = Pipeline::new();
//!
//! // An irregular sensor stream, realigned to a 50 Hz clock
//! let mut sensor = pipeline.input::<f64>("sensor");
//! let clock = pipeline.add_source("clock", Timer::new(), Duration::from_millis(20));
//! let hold = Repeater::<f64>::build::<u64>(&mut pipeline, "hold", None);
//! let collector = Collector::new();
//! let received = collector.handle();
//! let sink = pipeline.add_sink("sink", collector);
//!
//! pipeline.connect(sensor.port(), hold.data)?;
//! pipeline.connect(clock, hold.clock)?;
//! pipeline.connect(hold.out, sink)?;
//!
//! pipeline.start()?;
//! sensor.post(21.5, Timestamp::now())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod component;
pub mod components;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod port;
pub mod temporal;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::component::{Component, Output, Sink, Source, Transform};
    pub use crate::components::{
        Collector, CollectorHandle, Map, Repeater, RepeaterPorts, Sequence, Timer,
    };
    pub use crate::envelope::{Envelope, Message};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{Pipeline, PipelineEvent, PipelineState};
    pub use crate::port::{Producer, ProducerPort, Receiver, ReceiverPort};
    pub use crate::temporal::Timestamp;
}

pub use envelope::{Envelope, Message};
pub use error::{Error, Result};
