//! Builder utilities for ergonomic behavior tree construction.
//!
//! This module provides helper functions to reduce boilerplate when building
//! behavior trees. Instead of writing
//! `TreeNode::new("Selector", Composite::new(Selector)).with_children(...)`,
//! you can use shorter functions like `selector(vec![...])`.
//!
//! ```rust
//! use std::sync::Arc;
//! use behavior_tree::builder::{action, condition, selector, wait};
//! use behavior_tree::{Cooldown, NodeState};
//!
//! let tree = selector(vec![
//!     condition(|ctx| ctx.is_cancelled()),
//!     action(|_, _| Ok(NodeState::Running))
//!         .with_decorator(Arc::new(Cooldown::new(2.0)?)),
//!     wait(1.0, 0.5)?,
//! ]);
//! assert_eq!(tree.children().len(), 3);
//! # Ok::<(), behavior_tree::BehaviorTreeError>(())
//! ```

use crate::{
    ActionNode, BehaviorTreeContext, Composite, ConditionNode, NodeState, Parallel,
    ParallelPolicy, RandomSelector, Repeater, Result, Selector, TreeNode, WaitNode,
};

/// Creates a selector node.
#[inline]
pub fn selector(children: Vec<TreeNode>) -> TreeNode {
    TreeNode::new("Selector", Composite::new(Selector)).with_children(children)
}

/// Creates a random selector node.
#[inline]
pub fn random_selector(children: Vec<TreeNode>) -> TreeNode {
    TreeNode::new("RandomSelector", Composite::new(RandomSelector::new())).with_children(children)
}

/// Creates a parallel node with the given success and failure policies.
#[inline]
pub fn parallel(
    success_policy: ParallelPolicy,
    failure_policy: ParallelPolicy,
    children: Vec<TreeNode>,
) -> TreeNode {
    TreeNode::new(
        "Parallel",
        Composite::new(Parallel::new(success_policy, failure_policy)),
    )
    .with_children(children)
}

/// Creates a repeater around `child`.
///
/// # Errors
///
/// Fails if `count` is zero; see [`Repeater::new`].
pub fn repeater(count: i32, continue_on_failure: bool, child: TreeNode) -> Result<TreeNode> {
    let behavior = Repeater::new(count, continue_on_failure)?;
    Ok(TreeNode::new(repeater_name(behavior.limit()), behavior).with_child(child))
}

/// Creates a repeater that never completes on its own.
pub fn repeat_forever(continue_on_failure: bool, child: TreeNode) -> TreeNode {
    TreeNode::new(repeater_name(None), Repeater::forever(continue_on_failure)).with_child(child)
}

fn repeater_name(limit: Option<u32>) -> String {
    match limit {
        Some(count) => format!("Repeat x{count}"),
        None => "Repeat Infinite".to_owned(),
    }
}

/// Creates an action node from a tick callback.
///
/// Use [`ActionNode`] with [`TreeNode::new`] to attach initialize or
/// terminate callbacks.
#[inline]
pub fn action(
    on_tick: impl FnMut(&mut BehaviorTreeContext, f32) -> Result<NodeState> + Send + 'static,
) -> TreeNode {
    TreeNode::new("Action", ActionNode::new(on_tick))
}

/// Creates a condition node.
#[inline]
pub fn condition(predicate: impl FnMut(&BehaviorTreeContext) -> bool + Send + 'static) -> TreeNode {
    TreeNode::new("Condition", ConditionNode::new(predicate))
}

/// Creates a wait node.
///
/// # Errors
///
/// Fails on negative or non-finite arguments; see [`WaitNode::new`].
pub fn wait(duration: f32, variance: f32) -> Result<TreeNode> {
    Ok(TreeNode::new("Wait", WaitNode::new(duration, variance)?))
}
