//! The tree node and its execution state machine.
//!
//! # Activation lifecycle
//!
//! Each call to [`TreeNode::execute`]:
//! 1. evaluates every decorator guard; a failed guard aborts the node and
//!    yields `Failure`
//! 2. starts a new activation if none is live (debugger enter,
//!    [`NodeBehavior::on_initialize`], services attached)
//! 3. ticks every service whose interval elapsed
//! 4. runs [`NodeBehavior::on_tick`]
//! 5. applies result modifiers in attachment order
//! 6. on a terminal result, ends the activation (terminate hook, services
//!    detached, debugger exit, decorators notified)

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::{
    BehaviorTreeContext, BehaviorTreeError, Decorator, NodeBehavior, NodeState, Result, Service,
};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-unique node identifier.
///
/// Decorators and services that are shared between nodes key their private
/// state by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A behavior tree node.
///
/// Nodes own their children. Decorators and services are shared through
/// `Arc` and may be attached to any number of nodes. The structure is meant
/// to be assembled up front; the fallible `add_*` methods refuse to modify a
/// node while it is active.
pub struct TreeNode {
    id: NodeId,
    name: String,
    children: Vec<TreeNode>,
    decorators: Vec<Arc<dyn Decorator>>,
    services: Vec<Arc<dyn Service>>,
    // Time since each service last fired, parallel to `services`.
    service_timers: Vec<f32>,
    behavior: Box<dyn NodeBehavior>,
    initialized: bool,
    time_in_state: f32,
}

impl TreeNode {
    /// Creates an idle node running `behavior`, with a fresh [`NodeId`].
    pub fn new(name: impl Into<String>, behavior: impl NodeBehavior + 'static) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            children: Vec::new(),
            decorators: Vec::new(),
            services: Vec::new(),
            service_timers: Vec::new(),
            behavior: Box::new(behavior),
            initialized: false,
            time_in_state: 0.0,
        }
    }

    /// Identifier used by shared decorators and services.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name for logs and debuggers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Builder-style [`TreeNode::set_name`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    /// Owned children in evaluation order.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Attached decorators in attachment order.
    pub fn decorators(&self) -> &[Arc<dyn Decorator>] {
        &self.decorators
    }

    pub fn services(&self) -> &[Arc<dyn Service>] {
        &self.services
    }

    /// Returns `true` while an activation is live.
    pub fn is_active(&self) -> bool {
        self.initialized
    }

    /// Time accumulated during the current activation.
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Appends a child. Intended for assembly before the first tick.
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TreeNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attaches a decorator. Guards run in attachment order, and so do
    /// result modifiers.
    pub fn with_decorator(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Attaches a service, ticked while the node is active.
    pub fn with_service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self.service_timers.push(0.0);
        self
    }

    /// Fallible [`TreeNode::with_child`] for nodes that may be running.
    ///
    /// # Errors
    ///
    /// [`BehaviorTreeError::InvalidState`] if the node is active.
    pub fn add_child(&mut self, child: TreeNode) -> Result<()> {
        self.ensure_idle()?;
        self.children.push(child);
        Ok(())
    }

    /// # Errors
    ///
    /// [`BehaviorTreeError::InvalidState`] if the node is active.
    pub fn add_decorator(&mut self, decorator: Arc<dyn Decorator>) -> Result<()> {
        self.ensure_idle()?;
        self.decorators.push(decorator);
        Ok(())
    }

    /// # Errors
    ///
    /// [`BehaviorTreeError::InvalidState`] if the node is active.
    pub fn add_service(&mut self, service: Arc<dyn Service>) -> Result<()> {
        self.ensure_idle()?;
        self.services.push(service);
        self.service_timers.push(0.0);
        Ok(())
    }

    /// Runs one tick of this node.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by user callbacks in this node or any
    /// descendant. The tree is left mid-activation; call
    /// [`TreeNode::abort`] to clean up.
    pub fn execute(&mut self, ctx: &mut BehaviorTreeContext, delta_time: f32) -> Result<NodeState> {
        if !self.guards_pass(ctx) {
            trace!(target: "behavior_tree::node", node = %self.name, id = %self.id, "guarded out");
            self.abort(ctx);
            return Ok(NodeState::Failure);
        }

        if !self.initialized {
            self.initialized = true;
            self.time_in_state = 0.0;
            if let Some(debugger) = ctx.debugger() {
                debugger.on_node_enter(self, ctx);
            }
            self.behavior.on_initialize(ctx, &mut self.children);
            self.attach_services(ctx);
        }

        self.tick_services(ctx, delta_time);

        let raw = self.behavior.on_tick(ctx, delta_time, &mut self.children)?;
        let result = self.apply_result_modifiers(ctx, delta_time, raw);
        self.time_in_state += delta_time;

        if result.is_terminal() {
            self.behavior.on_terminate(ctx, result, &mut self.children);
            // A forced result (e.g. a timeout) can leave a child mid-activation.
            for child in &mut self.children {
                child.abort(ctx);
            }
            self.end_activation(ctx, result);
            for decorator in &self.decorators {
                decorator.on_node_finished(self, ctx, result);
            }
        }

        Ok(result)
    }

    /// Forcibly ends the current activation, children first.
    ///
    /// No-op when the node is not active, so it is safe to call repeatedly.
    pub fn abort(&mut self, ctx: &mut BehaviorTreeContext) {
        if !self.initialized {
            return;
        }

        for child in &mut self.children {
            child.abort(ctx);
        }

        for decorator in &self.decorators {
            decorator.on_node_aborted(self, ctx);
        }

        self.end_activation(ctx, NodeState::Failure);
        if let Some(debugger) = ctx.debugger() {
            debugger.on_node_aborted(self, ctx);
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.initialized {
            return Err(BehaviorTreeError::InvalidState {
                reason: "cannot modify the structure of an active node",
            });
        }
        Ok(())
    }

    fn guards_pass(&self, ctx: &BehaviorTreeContext) -> bool {
        self.decorators
            .iter()
            .all(|decorator| decorator.should_execute(self, ctx))
    }

    fn apply_result_modifiers(
        &self,
        ctx: &BehaviorTreeContext,
        delta_time: f32,
        raw: NodeState,
    ) -> NodeState {
        self.decorators
            .iter()
            .filter_map(|decorator| decorator.as_result_modifier())
            .fold(raw, |state, modifier| {
                modifier.modify_result(self, ctx, delta_time, state)
            })
    }

    fn attach_services(&mut self, ctx: &mut BehaviorTreeContext) {
        for index in 0..self.services.len() {
            self.service_timers[index] = 0.0;
            self.services[index].on_attached(self, ctx);
        }
    }

    fn tick_services(&mut self, ctx: &mut BehaviorTreeContext, delta_time: f32) {
        for index in 0..self.services.len() {
            let interval = self.services[index].update_interval().max(f32::EPSILON);
            let elapsed = self.service_timers[index] + delta_time;
            if elapsed >= interval {
                self.service_timers[index] = 0.0;
                self.services[index].tick_service(self, ctx, delta_time);
            } else {
                self.service_timers[index] = elapsed;
            }
        }
    }

    fn detach_services(&mut self, ctx: &mut BehaviorTreeContext) {
        for index in 0..self.services.len() {
            self.services[index].on_detached(self, ctx);
            self.service_timers[index] = 0.0;
        }
    }

    /// Shared cleanup for natural termination and abort.
    fn end_activation(&mut self, ctx: &mut BehaviorTreeContext, result: NodeState) {
        self.detach_services(ctx);
        self.initialized = false;
        if let Some(debugger) = ctx.debugger() {
            debugger.on_node_exit(self, ctx, result, self.time_in_state);
        }
        self.time_in_state = 0.0;
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decorators: Vec<&str> = self.decorators.iter().map(|d| d.name()).collect();
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.initialized)
            .field("decorators", &decorators)
            .field("services", &self.services.len())
            .field("children", &self.children)
            .finish()
    }
}
