//! Per-component execution: one task, one mailbox, serialized callbacks.
//!
//! Every component runs on its own Tokio task draining a FIFO mailbox of
//! delivery jobs. Because a single task applies every job to the component's
//! state, no two callbacks of one component ever run concurrently and
//! component-local state needs no locking. Per-receiver delivery order
//! follows posting order; receivers of different components (and different
//! receivers of one component fed by different producers) carry no relative
//! ordering guarantee.

use super::events::EventSender;
use super::graph::{ComponentId, Pipeline, PipelineState};
use super::PipelineEvent;
use crate::component::Component;
use crate::error::{Error, Result};
use daggy::petgraph::algo::toposort;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A queued delivery: applies one callback to the component's state.
pub(crate) type Job<C> = Box<dyn FnOnce(&mut C) -> Result<()> + Send>;

/// Periodic cadence configured on a component via
/// [`ComponentBuilder::interval`](super::ComponentBuilder::interval).
pub(crate) struct TickConfig<C> {
    pub(crate) period: Duration,
    /// Runs serialized with the component's callbacks. `Ok(false)` retires
    /// the cadence.
    pub(crate) on_tick: Box<dyn FnMut(&mut C) -> Result<bool> + Send>,
}

/// Type-erased handle used by the pipeline to spawn a component's task.
pub(crate) trait Runner: Send {
    fn spawn(self: Box<Self>, shutdown: watch::Receiver<bool>, events: EventSender)
        -> JoinHandle<()>;
}

pub(crate) struct ComponentRunner<C: Component> {
    pub(crate) name: String,
    pub(crate) state: C,
    pub(crate) mailbox: kanal::Receiver<Job<C>>,
    pub(crate) tick: Option<TickConfig<C>>,
}

impl<C: Component> Runner for ComponentRunner<C> {
    fn spawn(
        self: Box<Self>,
        mut shutdown: watch::Receiver<bool>,
        events: EventSender,
    ) -> JoinHandle<()> {
        let ComponentRunner {
            name,
            mut state,
            mailbox,
            tick,
        } = *self;

        tokio::spawn(async move {
            tracing::debug!(component = %name, "component task started");
            events.send_component_started(&name);
            state.on_start();

            let (mut ticker, mut on_tick) = match tick {
                Some(config) => {
                    let mut interval = tokio::time::interval(config.period);
                    // a stalled component must not replay missed ticks in a burst
                    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    (Some(interval), Some(config.on_tick))
                }
                None => (None, None),
            };

            let mut processed: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    // stop wins over queued work: in-flight callbacks finish,
                    // queued deliveries are discarded
                    _ = shutdown.changed() => break,
                    _ = async { ticker.as_mut().expect("cadence").tick().await }, if ticker.is_some() => {
                        let tick_fn = on_tick.as_mut().expect("cadence");
                        match tick_fn(&mut state) {
                            Ok(true) => {}
                            Ok(false) => {
                                tracing::debug!(component = %name, "cadence retired");
                                ticker = None;
                            }
                            Err(Error::PipelineStopped) => {
                                // a tick racing the shutdown signal; discarded
                                tracing::debug!(component = %name, "tick after stop discarded");
                                break;
                            }
                            Err(error) => {
                                tracing::error!(component = %name, %error, "tick failed");
                                events.send_error(error.to_string(), Some(name.clone()));
                                break;
                            }
                        }
                    }
                    job = mailbox.as_async().recv() => match job {
                        Ok(job) => {
                            processed += 1;
                            crate::observability::record_delivered(&name);
                            match job(&mut state) {
                                Ok(()) => {}
                                Err(Error::PipelineStopped) => {
                                    // a post racing the shutdown signal; discarded
                                    tracing::debug!(component = %name, "post after stop discarded");
                                    break;
                                }
                                Err(error) => {
                                    tracing::error!(component = %name, %error, "callback failed");
                                    events.send_error(error.to_string(), Some(name.clone()));
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    },
                }
            }

            state.on_stop();
            tracing::debug!(component = %name, processed, "component task finished");
            events.send_component_stopped(&name, processed);
        })
    }
}

impl Pipeline {
    /// Activate the pipeline: spawn one task per component and begin
    /// draining deliveries (including any queued during construction).
    ///
    /// Fails with [`Error::InvalidState`] if the pipeline is not freshly
    /// constructed or if any component was never finished with
    /// [`ComponentBuilder::build`](super::ComponentBuilder::build).
    pub fn start(&mut self) -> Result<()> {
        if self.state != PipelineState::Created {
            return Err(Error::InvalidState(format!(
                "cannot start a {:?} pipeline",
                self.state
            )));
        }

        let ids: Vec<ComponentId> = self
            .graph
            .graph()
            .node_indices()
            .map(ComponentId)
            .collect();
        for id in &ids {
            let node = self.graph.node_weight(id.0).expect("component node");
            if node.runner.is_none() {
                return Err(Error::InvalidState(format!(
                    "component '{}' was never built",
                    node.name
                )));
            }
        }

        for id in ids {
            let runner = self
                .graph
                .node_weight_mut(id.0)
                .and_then(|node| node.runner.take())
                .expect("validated above");
            let shutdown = self.shutdown.subscribe();
            let events = self.events.clone();
            self.tasks.push(runner.spawn(shutdown, events));
        }

        self.state = PipelineState::Running;
        self.events
            .send_state_changed(PipelineState::Created, PipelineState::Running);
        self.events.send(PipelineEvent::Started);
        tracing::info!(components = self.tasks.len(), "pipeline started");
        Ok(())
    }

    /// Stop the pipeline.
    ///
    /// Posts issued from this point fail with [`Error::PipelineStopped`];
    /// callbacks already executing run to completion, no new callback starts,
    /// and queued deliveries are discarded. Waits for every component task to
    /// finish (running its `on_stop` hook). Calling `stop` again is a no-op.
    pub async fn stop(&mut self) {
        match self.state {
            PipelineState::Stopped => return,
            PipelineState::Created => {
                self.stopped.store(true, Ordering::Release);
                self.state = PipelineState::Stopped;
                return;
            }
            PipelineState::Running => {}
        }

        self.stopped.store(true, Ordering::Release);
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            if task.await.is_err() {
                tracing::warn!("component task panicked before shutdown");
            }
        }

        self.state = PipelineState::Stopped;
        self.events
            .send_state_changed(PipelineState::Running, PipelineState::Stopped);
        self.events.send(PipelineEvent::Stopped);
        tracing::info!("pipeline stopped");
    }

    /// Wait until every delivery queued so far, including cascades triggered
    /// by those deliveries, has been processed.
    ///
    /// Runs a completion barrier through each component's mailbox in
    /// topological order, so a downstream component is only barriered after
    /// everything upstream of it has drained. Cadence-driven sources keep
    /// producing while this runs; the guarantee covers work enqueued before
    /// each component's barrier.
    pub async fn drain(&self) -> Result<()> {
        if self.state != PipelineState::Running {
            return Err(Error::InvalidState(
                "drain requires a running pipeline".into(),
            ));
        }

        let order = toposort(self.graph.graph(), None).expect("connect() rejects cycles");
        for idx in order {
            let node = self.graph.node_weight(idx).expect("component node");
            if let Some(barrier) = &node.barrier {
                let (done, wait) = tokio::sync::oneshot::channel();
                if barrier(done) {
                    // Err means the component's task ended; nothing to wait for
                    let _ = wait.await;
                }
            }
        }
        Ok(())
    }
}
