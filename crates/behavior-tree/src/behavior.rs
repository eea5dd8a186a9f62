//! Per-kind node hooks.
//!
//! This module defines the [`NodeBehavior`] trait, which is what makes a
//! [`TreeNode`] a selector, a wait, an action and so on. The node itself
//! owns the generic lifecycle (guards, services, result modifiers,
//! termination); a behavior only supplies the three kind-specific hooks.

use crate::{BehaviorTreeContext, NodeState, Result, TreeNode};

/// Kind-specific logic plugged into a [`TreeNode`].
///
/// Every hook receives the node's children so composites can drive them.
pub trait NodeBehavior: Send {
    /// Called once at the start of every activation, after the guards passed.
    fn on_initialize(&mut self, _ctx: &mut BehaviorTreeContext, _children: &mut [TreeNode]) {}

    /// Advances the activation by one tick.
    ///
    /// # Errors
    ///
    /// Errors from user callbacks are propagated as-is; the node is left
    /// active and the caller is expected to abort the tree.
    fn on_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
    ) -> Result<NodeState>;

    /// Called once when the activation ends with a terminal result. Not
    /// called on abort.
    fn on_terminate(
        &mut self,
        _ctx: &mut BehaviorTreeContext,
        _result: NodeState,
        _children: &mut [TreeNode],
    ) {
    }
}
