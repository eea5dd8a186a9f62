//! Decorators: guards and result transforms attached to nodes.
//!
//! A decorator is consulted before a node runs ([`Decorator::should_execute`])
//! and notified when the node's activation ends. Decorators that also
//! transform the node's result expose a [`ResultModifier`] through
//! [`Decorator::as_result_modifier`].
//!
//! One decorator instance may be attached to many nodes across many trees,
//! so any per-node state lives in a table keyed by [`NodeId`] inside the
//! decorator, never on the node.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{BehaviorTreeContext, BehaviorTreeError, NodeId, NodeState, Result, TreeNode};

pub trait Decorator: Send + Sync {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Guard evaluated on every execution before any node logic runs.
    /// Guards of all attached decorators are AND-combined.
    fn should_execute(&self, _node: &TreeNode, _ctx: &BehaviorTreeContext) -> bool {
        true
    }

    /// Called once when the node's activation ends with a terminal result.
    /// Not called when the node is guarded out or aborted.
    fn on_node_finished(&self, _node: &TreeNode, _ctx: &BehaviorTreeContext, _result: NodeState) {}

    /// Called when the node's activation is forcibly ended.
    fn on_node_aborted(&self, _node: &TreeNode, _ctx: &BehaviorTreeContext) {}

    fn as_result_modifier(&self) -> Option<&dyn ResultModifier> {
        None
    }
}

/// Transforms a node's raw tick result.
///
/// Modifiers run in attachment order, only on ticks where the node actually
/// executed. `Running` must pass through unchanged unless the modifier
/// deliberately converts it.
pub trait ResultModifier: Send + Sync {
    fn modify_result(
        &self,
        node: &TreeNode,
        ctx: &BehaviorTreeContext,
        delta_time: f32,
        current: NodeState,
    ) -> NodeState;
}

/// Per-node state table shared by decorator implementations.
#[derive(Debug, Default)]
struct NodeTable<V> {
    entries: Mutex<HashMap<NodeId, V>>,
}

impl<V: Copy> NodeTable<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<NodeId, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, id: NodeId) -> Option<V> {
        self.lock().get(&id).copied()
    }

    fn insert(&self, id: NodeId, value: V) {
        self.lock().insert(id, value);
    }

    fn remove(&self, id: NodeId) {
        self.lock().remove(&id);
    }
}

/// Blocks re-entry into a node for a fixed time after its activation ends.
///
/// The cooldown is measured against [`BehaviorTreeContext::elapsed_time`]
/// and is stamped both on natural finish and on abort.
#[derive(Debug)]
pub struct Cooldown {
    seconds: f32,
    next_available: NodeTable<f32>,
}

impl Cooldown {
    /// # Errors
    ///
    /// [`BehaviorTreeError::OutOfRange`] if `seconds` is negative or not finite.
    pub fn new(seconds: f32) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(BehaviorTreeError::out_of_range(
                "seconds",
                seconds,
                "cooldown must be a finite, non-negative duration",
            ));
        }
        Ok(Self {
            seconds,
            next_available: NodeTable::default(),
        })
    }

    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    /// Elapsed time at which `node` becomes available again, if it is
    /// cooling down or has cooled down before.
    pub fn next_available(&self, node: NodeId) -> Option<f32> {
        self.next_available.get(node)
    }

    fn stamp(&self, node: &TreeNode, ctx: &BehaviorTreeContext) {
        self.next_available
            .insert(node.id(), ctx.elapsed_time() + self.seconds);
    }
}

impl Decorator for Cooldown {
    fn name(&self) -> &str {
        "Cooldown"
    }

    fn should_execute(&self, node: &TreeNode, ctx: &BehaviorTreeContext) -> bool {
        self.next_available
            .get(node.id())
            .is_none_or(|next| ctx.elapsed_time() >= next)
    }

    fn on_node_finished(&self, node: &TreeNode, ctx: &BehaviorTreeContext, result: NodeState) {
        if result.is_terminal() {
            self.stamp(node, ctx);
        }
    }

    fn on_node_aborted(&self, node: &TreeNode, ctx: &BehaviorTreeContext) {
        self.stamp(node, ctx);
    }
}

/// Swaps Success and Failure; Running is untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inverter;

impl Decorator for Inverter {
    fn name(&self) -> &str {
        "Inverter"
    }

    fn as_result_modifier(&self) -> Option<&dyn ResultModifier> {
        Some(self)
    }
}

impl ResultModifier for Inverter {
    fn modify_result(
        &self,
        _node: &TreeNode,
        _ctx: &BehaviorTreeContext,
        _delta_time: f32,
        current: NodeState,
    ) -> NodeState {
        current.invert()
    }
}

/// Forces `Failure` once a node has been `Running` for too long.
///
/// Running time is accumulated per node from the tick deltas. When it
/// reaches the limit the accumulator resets and that tick reports `Failure`.
#[derive(Debug)]
pub struct Timeout {
    seconds: f32,
    running_time: NodeTable<f32>,
}

impl Timeout {
    /// # Errors
    ///
    /// [`BehaviorTreeError::OutOfRange`] if `seconds <= 0` (or NaN).
    pub fn new(seconds: f32) -> Result<Self> {
        if !(seconds > 0.0) {
            return Err(BehaviorTreeError::out_of_range(
                "seconds",
                seconds,
                "timeout must be positive",
            ));
        }
        Ok(Self {
            seconds,
            running_time: NodeTable::default(),
        })
    }

    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    /// Running time accumulated so far for `node`.
    pub fn elapsed(&self, node: NodeId) -> Option<f32> {
        self.running_time.get(node)
    }
}

impl Decorator for Timeout {
    fn name(&self) -> &str {
        "Timeout"
    }

    fn on_node_finished(&self, node: &TreeNode, _ctx: &BehaviorTreeContext, _result: NodeState) {
        self.running_time.remove(node.id());
    }

    fn on_node_aborted(&self, node: &TreeNode, _ctx: &BehaviorTreeContext) {
        self.running_time.remove(node.id());
    }

    fn as_result_modifier(&self) -> Option<&dyn ResultModifier> {
        Some(self)
    }
}

impl ResultModifier for Timeout {
    fn modify_result(
        &self,
        node: &TreeNode,
        _ctx: &BehaviorTreeContext,
        delta_time: f32,
        current: NodeState,
    ) -> NodeState {
        if !current.is_running() {
            self.running_time.remove(node.id());
            return current;
        }

        let elapsed = self.running_time.get(node.id()).unwrap_or(0.0) + delta_time;
        if elapsed >= self.seconds {
            self.running_time.insert(node.id(), 0.0);
            return NodeState::Failure;
        }

        self.running_time.insert(node.id(), elapsed);
        NodeState::Running
    }
}
