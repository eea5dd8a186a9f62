//! Observability hooks.
//!
//! A [`BehaviorTreeDebugger`] is a pure sink: it sees node and tree
//! lifecycle events but cannot influence evaluation. Every hook has an empty
//! default so implementors only override what they record.

use tracing::{debug, trace};

use crate::{BehaviorTreeContext, BehaviorTreeInstance, NodeState, TreeNode};

pub trait BehaviorTreeDebugger: Send + Sync {
    /// A node started a new activation.
    fn on_node_enter(&self, _node: &TreeNode, _ctx: &BehaviorTreeContext) {}

    /// A node's activation ended, naturally or through an abort (reported
    /// as `Failure`). `duration` is the accumulated time-in-state.
    fn on_node_exit(
        &self,
        _node: &TreeNode,
        _ctx: &BehaviorTreeContext,
        _result: NodeState,
        _duration: f32,
    ) {
    }

    /// A node's activation was forcibly ended.
    fn on_node_aborted(&self, _node: &TreeNode, _ctx: &BehaviorTreeContext) {}

    /// The instance stopped being active.
    fn on_tree_completed(&self, _instance: &BehaviorTreeInstance, _result: NodeState) {}

    fn on_tree_restarted(&self, _instance: &BehaviorTreeInstance) {}
}

/// Debugger that forwards every hook to `tracing`.
///
/// Node events are emitted at `trace` level under `behavior_tree::debug`,
/// tree events at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDebugger;

impl BehaviorTreeDebugger for TracingDebugger {
    fn on_node_enter(&self, node: &TreeNode, ctx: &BehaviorTreeContext) {
        trace!(
            target: "behavior_tree::debug",
            node = node.name(),
            id = %node.id(),
            elapsed = ctx.elapsed_time(),
            "enter"
        );
    }

    fn on_node_exit(
        &self,
        node: &TreeNode,
        _ctx: &BehaviorTreeContext,
        result: NodeState,
        duration: f32,
    ) {
        trace!(
            target: "behavior_tree::debug",
            node = node.name(),
            id = %node.id(),
            %result,
            duration,
            "exit"
        );
    }

    fn on_node_aborted(&self, node: &TreeNode, _ctx: &BehaviorTreeContext) {
        trace!(
            target: "behavior_tree::debug",
            node = node.name(),
            id = %node.id(),
            "aborted"
        );
    }

    fn on_tree_completed(&self, instance: &BehaviorTreeInstance, result: NodeState) {
        debug!(
            target: "behavior_tree::debug",
            root = instance.root().name(),
            %result,
            elapsed = instance.context().elapsed_time(),
            "tree completed"
        );
    }

    fn on_tree_restarted(&self, instance: &BehaviorTreeInstance) {
        debug!(
            target: "behavior_tree::debug",
            root = instance.root().name(),
            "tree restarted"
        );
    }
}
