//! Composite behavior nodes.
//!
//! Composite nodes control the evaluation of several children within a
//! single tick. Cursor-driven composites are built from a
//! [`CompositeBehavior`] wrapped in [`Composite`], which owns the child
//! cursor and resets it at the start of every activation.
//!
//! - [`Selector`]: left-to-right priority fallback (logical OR)
//! - [`RandomSelector`]: a selector over a per-activation shuffled order
//! - [`Parallel`]: ticks every child each tick and votes with policies
//! - [`Repeater`]: re-runs its single child a fixed or unbounded number of times

use rand::Rng;

use crate::{BehaviorTreeContext, BehaviorTreeError, NodeBehavior, NodeState, Result, TreeNode};

/// Hooks for composites that walk their children with a cursor.
pub trait CompositeBehavior: Send {
    fn on_composite_initialize(&mut self, _ctx: &mut BehaviorTreeContext, _children: &mut [TreeNode]) {
    }

    /// Advances the composite. `cursor` persists across `Running` ticks of
    /// one activation.
    fn on_composite_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
        cursor: &mut usize,
    ) -> Result<NodeState>;

    fn on_composite_terminate(
        &mut self,
        _ctx: &mut BehaviorTreeContext,
        _result: NodeState,
        _children: &mut [TreeNode],
    ) {
    }
}

/// Adapts a [`CompositeBehavior`] into a [`NodeBehavior`].
#[derive(Debug, Default)]
pub struct Composite<B> {
    cursor: usize,
    behavior: B,
}

impl<B: CompositeBehavior> Composite<B> {
    /// Wraps `behavior` with a cursor starting at the first child.
    pub fn new(behavior: B) -> Self {
        Self {
            cursor: 0,
            behavior,
        }
    }
}

impl<B: CompositeBehavior> NodeBehavior for Composite<B> {
    fn on_initialize(&mut self, ctx: &mut BehaviorTreeContext, children: &mut [TreeNode]) {
        self.cursor = 0;
        self.behavior.on_composite_initialize(ctx, children);
    }

    fn on_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
    ) -> Result<NodeState> {
        self.behavior
            .on_composite_tick(ctx, delta_time, children, &mut self.cursor)
    }

    fn on_terminate(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        result: NodeState,
        children: &mut [TreeNode],
    ) {
        self.behavior.on_composite_terminate(ctx, result, children);
        self.cursor = 0;
    }
}

/// Runs children in the order produced by `child_at` until one does not fail.
fn select(
    ctx: &mut BehaviorTreeContext,
    delta_time: f32,
    children: &mut [TreeNode],
    cursor: &mut usize,
    len: usize,
    child_at: impl Fn(usize) -> usize,
) -> Result<NodeState> {
    while *cursor < len {
        match children[child_at(*cursor)].execute(ctx, delta_time)? {
            NodeState::Failure => *cursor += 1,
            // Running keeps the cursor so the same child resumes next tick.
            state => return Ok(state),
        }
    }
    Ok(NodeState::Failure)
}

/// Tries children left to right until one succeeds.
///
/// # Semantics
///
/// - `Running` from a child stops the tick; the same child resumes next tick
/// - `Success` from a child ends the selector with `Success`
/// - `Failure` moves on to the next child within the same tick
/// - all children failing (or no children) yields `Failure`
#[derive(Debug, Default, Clone, Copy)]
pub struct Selector;

impl CompositeBehavior for Selector {
    fn on_composite_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
        cursor: &mut usize,
    ) -> Result<NodeState> {
        let len = children.len();
        select(ctx, delta_time, children, cursor, len, |index| index)
    }
}

/// A [`Selector`] whose child order is shuffled once per activation.
///
/// The order is drawn with a Fisher–Yates shuffle from the context's random
/// source when the activation starts and is kept for its `Running` ticks.
#[derive(Debug, Default, Clone)]
pub struct RandomSelector {
    order: Vec<usize>,
}

impl RandomSelector {
    /// The order is drawn when the first activation starts.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompositeBehavior for RandomSelector {
    fn on_composite_initialize(&mut self, ctx: &mut BehaviorTreeContext, children: &mut [TreeNode]) {
        self.order.clear();
        self.order.extend(0..children.len());

        let rng = ctx.rng();
        for i in (1..self.order.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.order.swap(i, j);
        }
    }

    fn on_composite_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
        cursor: &mut usize,
    ) -> Result<NodeState> {
        let order = &self.order;
        select(ctx, delta_time, children, cursor, order.len(), |index| order[index])
    }

    fn on_composite_terminate(
        &mut self,
        _ctx: &mut BehaviorTreeContext,
        _result: NodeState,
        _children: &mut [TreeNode],
    ) {
        self.order.clear();
    }
}

/// Voting rule used by [`Parallel`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParallelPolicy {
    /// At least one child.
    #[default]
    Any,
    /// Every child.
    All,
    /// At least this many children (a threshold of zero counts as one).
    Threshold(usize),
}

impl ParallelPolicy {
    fn is_satisfied(self, achieved: usize, total: usize) -> bool {
        match self {
            ParallelPolicy::Any => achieved > 0,
            ParallelPolicy::All => achieved == total,
            ParallelPolicy::Threshold(threshold) => achieved >= threshold.max(1),
        }
    }
}

/// Ticks every child on every tick and decides by policy.
///
/// # Semantics
///
/// All children run each tick, without short-circuiting. The success policy
/// is checked first against this tick's success count, then the failure
/// policy against the failure count. If neither holds the node is `Running`
/// while any child is running, otherwise `Failure`.
///
/// A child that finished on an earlier tick is re-initialized and run again
/// while the parallel stays active, so children act as continuous monitors
/// rather than latching their first result. Children still running when the
/// parallel terminates are aborted by [`TreeNode::execute`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Parallel {
    success_policy: ParallelPolicy,
    failure_policy: ParallelPolicy,
}

impl Parallel {
    pub fn new(success_policy: ParallelPolicy, failure_policy: ParallelPolicy) -> Self {
        Self {
            success_policy,
            failure_policy,
        }
    }

    /// Rule checked against this tick's successes.
    pub fn success_policy(&self) -> ParallelPolicy {
        self.success_policy
    }

    /// Rule checked against this tick's failures, after the success policy.
    pub fn failure_policy(&self) -> ParallelPolicy {
        self.failure_policy
    }
}

impl CompositeBehavior for Parallel {
    fn on_composite_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
        _cursor: &mut usize,
    ) -> Result<NodeState> {
        if children.is_empty() {
            return Ok(NodeState::Success);
        }

        let (mut succeeded, mut failed, mut running) = (0, 0, 0);
        for child in children.iter_mut() {
            match child.execute(ctx, delta_time)? {
                NodeState::Success => succeeded += 1,
                NodeState::Failure => failed += 1,
                NodeState::Running => running += 1,
            }
        }

        let total = children.len();
        if self.success_policy.is_satisfied(succeeded, total) {
            return Ok(NodeState::Success);
        }
        if self.failure_policy.is_satisfied(failed, total) {
            return Ok(NodeState::Failure);
        }
        Ok(if running > 0 {
            NodeState::Running
        } else {
            NodeState::Failure
        })
    }
}

/// Re-runs its first child a fixed number of times, or forever.
///
/// # Semantics
///
/// - `Running` from the child passes through
/// - a child `Success` (or `Failure` with `continue_on_failure`) counts as a
///   completed iteration; the repeater reports `Success` once the configured
///   count is reached and `Running` otherwise
/// - a child `Failure` without `continue_on_failure` fails the repeater
/// - no child yields `Failure`
#[derive(Debug, Clone)]
pub struct Repeater {
    limit: Option<u32>,
    continue_on_failure: bool,
    completed: u32,
}

impl Repeater {
    /// Count sentinel meaning "repeat forever".
    pub const INFINITE: i32 = -1;

    /// Creates a repeater. Positive counts are finite, any negative count
    /// repeats forever.
    ///
    /// # Errors
    ///
    /// [`BehaviorTreeError::OutOfRange`] if `count` is zero.
    pub fn new(count: i32, continue_on_failure: bool) -> Result<Self> {
        if count == 0 {
            return Err(BehaviorTreeError::out_of_range(
                "count",
                count,
                "repeat count must be positive or negative for infinite",
            ));
        }
        Ok(Self {
            limit: u32::try_from(count).ok(),
            continue_on_failure,
            completed: 0,
        })
    }

    /// Repeater with no iteration limit.
    pub fn forever(continue_on_failure: bool) -> Self {
        Self {
            limit: None,
            continue_on_failure,
            completed: 0,
        }
    }

    /// Iteration limit, `None` when repeating forever.
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Iterations completed in the current activation.
    pub fn completed(&self) -> u32 {
        self.completed
    }
}

impl NodeBehavior for Repeater {
    fn on_initialize(&mut self, _ctx: &mut BehaviorTreeContext, _children: &mut [TreeNode]) {
        self.completed = 0;
    }

    fn on_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        children: &mut [TreeNode],
    ) -> Result<NodeState> {
        let Some(child) = children.first_mut() else {
            return Ok(NodeState::Failure);
        };

        match child.execute(ctx, delta_time)? {
            NodeState::Running => return Ok(NodeState::Running),
            NodeState::Failure if !self.continue_on_failure => return Ok(NodeState::Failure),
            _ => {}
        }

        self.completed = self.completed.saturating_add(1);
        match self.limit {
            Some(limit) if self.completed >= limit => Ok(NodeState::Success),
            _ => Ok(NodeState::Running),
        }
    }
}
