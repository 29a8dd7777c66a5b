//! Pipeline construction and execution.
//!
//! This module provides the core pipeline infrastructure:
//!
//! - [`Pipeline`]: the graph container; creates ports, connects them, and
//!   owns the execution lifecycle
//! - [`ComponentBuilder`]: per-component construction of ports and cadences
//! - [`PipelineEvent`]: async events emitted during execution
//!
//! # Example
//!
//! ```rust,ignore
//! use chronoflow::prelude::*;
//! use std::time::Duration;
//!
//! let mut pipeline = Pipeline::new();
//!
//! // A clock, a sample-and-hold stage, and a recording sink
//! let clock = pipeline.add_source("clock", Timer::new(), Duration::from_millis(20));
//! let hold = Repeater::<f64>::build::<u64>(&mut pipeline, "hold", None);
//! let collector = Collector::new();
//! let sink = pipeline.add_sink("sink", collector);
//!
//! let mut sensor = pipeline.input::<f64>("sensor");
//! pipeline.connect(sensor.port(), hold.data)?;
//! pipeline.connect(clock, hold.clock)?;
//! pipeline.connect(hold.out, sink)?;
//!
//! pipeline.start()?;
//! sensor.post(21.5, Timestamp::now())?;
//! ```

mod builder;
mod events;
mod graph;
mod scheduler;

pub use builder::ComponentBuilder;
pub use events::{EventReceiver, EventSender, EventStream, PipelineEvent};
pub use graph::{ComponentId, Pipeline, PipelineState};
