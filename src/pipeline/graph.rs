//! Pipeline container: component graph, port registry, and connection rules.

use super::events::EventSender;
use super::scheduler::Runner;
use crate::error::{Error, Result};
use crate::port::{PortId, ProducerPort, ReceiverPort};
use daggy::petgraph::visit::EdgeRef;
use daggy::{Dag, NodeIndex};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Unique identifier for a component in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) NodeIndex);

impl ComponentId {
    /// Get the underlying index.
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

/// State of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    /// Graph is under construction; nothing runs yet.
    #[default]
    Created,
    /// Components are active and messages flow.
    Running,
    /// Shut down; no further deliveries. Pipelines are not reusable.
    Stopped,
}

/// Enqueues a completion barrier on a component's mailbox. Returns false if
/// the component's task has already ended.
pub(crate) type BarrierFn = Box<dyn Fn(oneshot::Sender<()>) -> bool + Send>;

/// Splices a receiver's delivery function into a producer's subscriber list.
/// Returns false if the payload types disagree (guarded by the `TypeId`
/// check in [`Pipeline::connect`]).
pub(crate) type AttachFn = Box<dyn Fn(&(dyn Any + Send)) -> bool + Send>;

/// A node in the pipeline graph.
pub(crate) struct ComponentNode {
    pub(crate) name: String,
    /// Taken out of the node when the component's task spawns.
    pub(crate) runner: Option<Box<dyn Runner>>,
    pub(crate) barrier: Option<BarrierFn>,
}

/// A typed connection recorded on a graph edge.
pub(crate) struct Connection {
    pub(crate) producer: String,
    pub(crate) receiver: String,
    pub(crate) payload: &'static str,
}

pub(crate) struct ProducerEntry {
    name: String,
    owner: ComponentId,
    payload_type: TypeId,
    payload_name: &'static str,
    attach: AttachFn,
}

pub(crate) struct ReceiverEntry {
    name: String,
    owner: ComponentId,
    payload_type: TypeId,
    payload_name: &'static str,
    delivery: Box<dyn Any + Send>,
    connected: bool,
}

/// The pipeline: owns the component graph, creates and connects ports, and
/// drives delivery through one task per component.
///
/// # Lifecycle
///
/// Build the graph ([`component`](Pipeline::component),
/// [`connect`](Pipeline::connect)), then [`start`](Pipeline::start) it.
/// [`stop`](Pipeline::stop) lets in-flight callbacks finish, starts no new
/// ones, and fails any later post with
/// [`Error::PipelineStopped`]. A stopped pipeline cannot be restarted.
pub struct Pipeline {
    pub(crate) graph: Dag<ComponentNode, Connection>,
    pub(crate) components_by_name: HashMap<String, ComponentId>,
    pub(crate) producers: HashMap<PortId, ProducerEntry>,
    pub(crate) receivers: HashMap<PortId, ReceiverEntry>,
    pub(crate) next_port: u64,
    pub(crate) stopped: Arc<AtomicBool>,
    pub(crate) state: PipelineState,
    pub(crate) events: EventSender,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) tasks: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            graph: Dag::new(),
            components_by_name: HashMap::new(),
            producers: HashMap::new(),
            receivers: HashMap::new(),
            next_port: 0,
            stopped: Arc::new(AtomicBool::new(false)),
            state: PipelineState::default(),
            events: EventSender::default(),
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The pipeline's event sender.
    pub fn events(&self) -> &EventSender {
        &self.events
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> super::events::EventReceiver {
        self.events.subscribe()
    }

    /// Look up a component by name.
    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.components_by_name.get(name).copied()
    }

    /// The name of a component.
    pub fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.graph.node_weight(id.0).map(|node| node.name.as_str())
    }

    /// Bind a producer to a receiver.
    ///
    /// Exactly one producer may feed a receiver. Fails with
    /// [`Error::TypeMismatch`] if the payload types differ,
    /// [`Error::AlreadyConnected`] if the receiver already has an upstream
    /// binding, [`Error::UnknownPort`] for handles from another pipeline, and
    /// [`Error::Cycle`] if the edge would close a cycle in the component
    /// graph. A failed connect leaves the graph untouched.
    pub fn connect(&mut self, producer: ProducerPort, receiver: ReceiverPort) -> Result<()> {
        let (from, to, edge) = {
            let p = self
                .producers
                .get(&producer.0)
                .ok_or_else(|| Error::UnknownPort(format!("producer {}", producer.0)))?;
            let r = self
                .receivers
                .get(&receiver.0)
                .ok_or_else(|| Error::UnknownPort(format!("receiver {}", receiver.0)))?;

            if p.payload_type != r.payload_type {
                return Err(Error::TypeMismatch {
                    producer: p.name.clone(),
                    receiver: r.name.clone(),
                    produced: p.payload_name,
                    expected: r.payload_name,
                });
            }
            if r.connected {
                return Err(Error::AlreadyConnected(r.name.clone()));
            }

            let edge = Connection {
                producer: p.name.clone(),
                receiver: r.name.clone(),
                payload: r.payload_name,
            };
            (p.owner, r.owner, edge)
        };

        let from_name = self.component_name(from).unwrap_or_default().to_string();
        let to_name = self.component_name(to).unwrap_or_default().to_string();
        self.graph
            .add_edge(from.0, to.0, edge)
            .map_err(|_| Error::Cycle {
                from: from_name,
                to: to_name,
            })?;

        let delivery = &self
            .receivers
            .get(&receiver.0)
            .expect("receiver checked above")
            .delivery;
        let _attached = (self
            .producers
            .get(&producer.0)
            .expect("producer checked above")
            .attach)(delivery.as_ref());
        debug_assert!(_attached, "attach after TypeId check cannot fail");

        self.receivers
            .get_mut(&receiver.0)
            .expect("receiver checked above")
            .connected = true;

        tracing::debug!(producer = %producer.0, receiver = %receiver.0, "connected");
        Ok(())
    }

    /// Render the component graph in GraphViz DOT format.
    ///
    /// Intended for external inspector tooling; node labels are component
    /// names, edge labels carry the connected port names and payload type.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        for idx in self.graph.graph().node_indices() {
            if let Some(node) = self.graph.node_weight(idx) {
                let _ = writeln!(out, "    c{} [label=\"{}\"];", idx.index(), node.name);
            }
        }
        for edge in self.graph.graph().edge_references() {
            let connection = edge.weight();
            let _ = writeln!(
                out,
                "    c{} -> c{} [label=\"{} -> {} ({})\"];",
                edge.source().index(),
                edge.target().index(),
                connection.producer,
                connection.receiver,
                connection.payload,
            );
        }
        out.push_str("}\n");
        out
    }

    // ------------------------------------------------------------------
    // Construction internals used by ComponentBuilder
    // ------------------------------------------------------------------

    pub(crate) fn alloc_port(&mut self) -> PortId {
        self.next_port += 1;
        PortId(self.next_port)
    }

    pub(crate) fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    pub(crate) fn add_component_node(&mut self, name: String) -> ComponentId {
        let idx = self.graph.add_node(ComponentNode {
            name: name.clone(),
            runner: None,
            barrier: None,
        });
        let id = ComponentId(idx);
        self.components_by_name.insert(name, id);
        id
    }

    pub(crate) fn register_producer(
        &mut self,
        id: PortId,
        owner: ComponentId,
        name: String,
        payload_type: TypeId,
        payload_name: &'static str,
        attach: AttachFn,
    ) {
        self.producers.insert(
            id,
            ProducerEntry {
                name,
                owner,
                payload_type,
                payload_name,
                attach,
            },
        );
    }

    pub(crate) fn register_receiver(
        &mut self,
        id: PortId,
        owner: ComponentId,
        name: String,
        payload_type: TypeId,
        payload_name: &'static str,
        delivery: Box<dyn Any + Send>,
    ) {
        self.receivers.insert(
            id,
            ReceiverEntry {
                name,
                owner,
                payload_type,
                payload_name,
                delivery,
                connected: false,
            },
        );
    }

    pub(crate) fn finish_component(
        &mut self,
        id: ComponentId,
        runner: Box<dyn Runner>,
        barrier: BarrierFn,
    ) {
        let node = self.graph.node_weight_mut(id.0).expect("component node");
        debug_assert!(node.runner.is_none(), "component built twice");
        node.runner = Some(runner);
        node.barrier = Some(barrier);
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
