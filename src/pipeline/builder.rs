//! Component construction: port creation, cadences, and role adapters.

use super::graph::{AttachFn, BarrierFn, ComponentId, Pipeline};
use super::scheduler::{ComponentRunner, Job, TickConfig};
use crate::component::{Component, Output, Sink, Source, Transform};
use crate::envelope::Message;
use crate::error::Result;
use crate::port::{
    DeliveryFn, Producer, ProducerPort, Receiver, ReceiverPort, SubscriberList,
};
use smallvec::SmallVec;
use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builds one component: creates its ports, optionally gives it a periodic
/// cadence, and finishes it with its state.
///
/// Obtained from [`Pipeline::component`]. Ports created here are owned by the
/// component under construction; callbacks receive `&mut` access to its state
/// and a borrowed [`Message`], serialized with every other callback of the
/// same component.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = pipeline.component::<Counter>("counter");
/// let out = builder.producer::<u64>("out");
/// let input = builder.receiver::<i32, _>("in", |counter: &mut Counter, msg| {
///     counter.seen += 1;
///     counter.out.post(counter.seen, msg.originating_time())
/// });
/// builder.build(Counter { seen: 0, out });
/// ```
pub struct ComponentBuilder<'a, C: Component> {
    pipeline: &'a mut Pipeline,
    id: ComponentId,
    name: String,
    mailbox_tx: kanal::Sender<Job<C>>,
    mailbox_rx: kanal::Receiver<Job<C>>,
    tick: Option<TickConfig<C>>,
}

impl Pipeline {
    /// Begin building a named component with state type `C`.
    pub fn component<C: Component>(&mut self, name: impl Into<String>) -> ComponentBuilder<'_, C> {
        let name = name.into();
        let id = self.add_component_node(name.clone());
        let (mailbox_tx, mailbox_rx) = kanal::unbounded::<Job<C>>();
        ComponentBuilder {
            pipeline: self,
            id,
            name,
            mailbox_tx,
            mailbox_rx,
            tick: None,
        }
    }

    /// Create an externally driven input: a producer-only component whose
    /// producer stays with the caller. Useful for feeding a pipeline from
    /// outside the graph (tests, device callbacks, bridges).
    pub fn input<T: Clone + Send + 'static>(&mut self, name: impl Into<String>) -> Producer<T> {
        let mut builder = self.component::<()>(name);
        let producer = builder.producer::<T>("out");
        builder.build(());
        producer
    }
}

impl<C: Component> ComponentBuilder<'_, C> {
    /// Create a receiver bound to `callback`.
    ///
    /// The callback runs on the component's task, one delivery at a time, in
    /// posting order for this receiver. The payload borrow ends with the
    /// callback; retaining a payload requires an explicit clone. A callback
    /// error stops this component and is reported as a pipeline event.
    pub fn receiver<T, F>(&mut self, name: &str, callback: F) -> Receiver<T>
    where
        T: Clone + Send + 'static,
        F: Fn(&mut C, &Message<T>) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.pipeline.alloc_port();
        let qualified = format!("{}.{}", self.name, name);
        let callback: Arc<dyn Fn(&mut C, &Message<T>) -> Result<()> + Send + Sync> =
            Arc::new(callback);
        let mailbox = self.mailbox_tx.clone();
        let component = self.name.clone();

        let deliver: DeliveryFn<T> = Arc::new(move |message: Message<T>| {
            let callback = Arc::clone(&callback);
            let job: Job<C> = Box::new(move |state: &mut C| callback(state, &message));
            if mailbox.send(job).is_err() {
                crate::observability::record_dropped(&component);
                tracing::warn!(component = %component, "delivery to finished component dropped");
            }
        });

        self.pipeline.register_receiver(
            id,
            self.id,
            qualified.clone(),
            TypeId::of::<T>(),
            type_name::<T>(),
            Box::new(deliver),
        );
        Receiver::new(id, qualified)
    }

    /// Create a producer owned by the component under construction.
    pub fn producer<T: Clone + Send + 'static>(&mut self, name: &str) -> Producer<T> {
        let id = self.pipeline.alloc_port();
        let qualified = format!("{}.{}", self.name, name);
        let subscribers: SubscriberList<T> = Arc::new(Mutex::new(SmallVec::new()));

        let attach: AttachFn = {
            let subscribers = Arc::clone(&subscribers);
            Box::new(move |delivery: &(dyn Any + Send)| {
                match delivery.downcast_ref::<DeliveryFn<T>>() {
                    Some(delivery) => {
                        subscribers
                            .lock()
                            .expect("subscriber list poisoned")
                            .push(Arc::clone(delivery));
                        true
                    }
                    None => false,
                }
            })
        };

        self.pipeline.register_producer(
            id,
            self.id,
            qualified.clone(),
            TypeId::of::<T>(),
            type_name::<T>(),
            attach,
        );
        Producer::new(id, qualified, subscribers, self.pipeline.stop_flag())
    }

    /// Give the component a periodic cadence.
    ///
    /// `on_tick` runs on the component's task, serialized with its callbacks,
    /// once per `period`. Return `Ok(false)` to retire the cadence. At most
    /// one cadence per component; a later call replaces the earlier one.
    pub fn interval<F>(&mut self, period: Duration, on_tick: F)
    where
        F: FnMut(&mut C) -> Result<bool> + Send + 'static,
    {
        self.tick = Some(TickConfig {
            period,
            on_tick: Box::new(on_tick),
        });
    }

    /// Finish the component with its state. The state is owned by the
    /// component's task once the pipeline starts.
    pub fn build(self, state: C) {
        let ComponentBuilder {
            pipeline,
            id,
            name,
            mailbox_tx,
            mailbox_rx,
            tick,
        } = self;

        let barrier: BarrierFn = Box::new(move |done| {
            let job: Job<C> = Box::new(move |_state: &mut C| {
                let _ = done.send(());
                Ok(())
            });
            mailbox_tx.send(job).is_ok()
        });

        let runner = ComponentRunner {
            name,
            state,
            mailbox: mailbox_rx,
            tick,
        };
        pipeline.finish_component(id, Box::new(runner), barrier);
    }
}

// ============================================================================
// Role adapters
// ============================================================================

/// Host wiring a [`Source`] implementation onto a producer port.
struct SourceHost<S: Source> {
    inner: S,
    out: Producer<S::Out>,
}

impl<S: Source> Component for SourceHost<S> {}

/// Host wiring a [`Sink`] implementation onto a receiver port.
struct SinkHost<K: Sink> {
    inner: K,
}

impl<K: Sink> Component for SinkHost<K> {}

/// Host wiring a [`Transform`] implementation between its two ports.
struct TransformHost<X: Transform> {
    inner: X,
    out: Producer<X::Out>,
}

impl<X: Transform> Component for TransformHost<X> {}

impl Pipeline {
    /// Register a producer-only component driven at `period`.
    ///
    /// The source's `produce` runs once per cadence tick; each produced
    /// sample is posted on the returned port. `Ok(None)` retires the cadence.
    pub fn add_source<S: Source>(
        &mut self,
        name: impl Into<String>,
        source: S,
        period: Duration,
    ) -> ProducerPort {
        let mut builder = self.component::<SourceHost<S>>(name);
        let out = builder.producer::<S::Out>("out");
        let port = out.port();
        builder.interval(period, |host: &mut SourceHost<S>| {
            match host.inner.produce()? {
                Some((value, time)) => {
                    host.out.post(value, time)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        });
        builder.build(SourceHost { inner: source, out });
        port
    }

    /// Register a consumer-only component.
    pub fn add_sink<K: Sink>(&mut self, name: impl Into<String>, sink: K) -> ReceiverPort {
        let mut builder = self.component::<SinkHost<K>>(name);
        let input = builder.receiver::<K::In, _>("in", |host: &mut SinkHost<K>, message| {
            host.inner.consume(message)
        });
        let port = input.port();
        builder.build(SinkHost { inner: sink });
        port
    }

    /// Register a consumer-producer component; returns its
    /// (input, output) ports.
    pub fn add_transform<X: Transform>(
        &mut self,
        name: impl Into<String>,
        transform: X,
    ) -> (ReceiverPort, ProducerPort) {
        let mut builder = self.component::<TransformHost<X>>(name);
        let out = builder.producer::<X::Out>("out");
        let out_port = out.port();
        let input = builder.receiver::<X::In, _>("in", |host: &mut TransformHost<X>, message| {
            match host.inner.transform(message)? {
                Output::None => {}
                Output::Single(value, time) => host.out.post(value, time)?,
                Output::Multiple(items) => {
                    for (value, time) in items {
                        host.out.post(value, time)?;
                    }
                }
            }
            Ok(())
        });
        let in_port = input.port();
        builder.build(TransformHost {
            inner: transform,
            out,
        });
        (in_port, out_port)
    }
}
