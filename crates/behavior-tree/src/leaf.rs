//! Leaf nodes: actions, conditions and waits.

use std::fmt;

use rand::Rng;

use crate::{BehaviorTreeContext, BehaviorTreeError, NodeBehavior, NodeState, Result, TreeNode};

type TickFn = Box<dyn FnMut(&mut BehaviorTreeContext, f32) -> Result<NodeState> + Send>;
type InitFn = Box<dyn FnMut(&mut BehaviorTreeContext) + Send>;
type TerminateFn = Box<dyn FnMut(&mut BehaviorTreeContext, NodeState) + Send>;
type PredicateFn = Box<dyn FnMut(&BehaviorTreeContext) -> bool + Send>;

/// Adapter turning closures into a node.
///
/// The tick callback is required and its result is returned as-is, so it
/// may report `Running` to span several ticks. Initialize and terminate
/// callbacks are optional and run at the edges of each activation.
pub struct ActionNode {
    on_tick: TickFn,
    on_initialize: Option<InitFn>,
    on_terminate: Option<TerminateFn>,
}

impl ActionNode {
    pub fn new(
        on_tick: impl FnMut(&mut BehaviorTreeContext, f32) -> Result<NodeState> + Send + 'static,
    ) -> Self {
        Self {
            on_tick: Box::new(on_tick),
            on_initialize: None,
            on_terminate: None,
        }
    }

    pub fn with_initialize(
        mut self,
        callback: impl FnMut(&mut BehaviorTreeContext) + Send + 'static,
    ) -> Self {
        self.on_initialize = Some(Box::new(callback));
        self
    }

    pub fn with_terminate(
        mut self,
        callback: impl FnMut(&mut BehaviorTreeContext, NodeState) + Send + 'static,
    ) -> Self {
        self.on_terminate = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionNode")
            .field("on_initialize", &self.on_initialize.is_some())
            .field("on_terminate", &self.on_terminate.is_some())
            .finish_non_exhaustive()
    }
}

impl NodeBehavior for ActionNode {
    fn on_initialize(&mut self, ctx: &mut BehaviorTreeContext, _children: &mut [TreeNode]) {
        if let Some(callback) = self.on_initialize.as_mut() {
            callback(ctx);
        }
    }

    fn on_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        _children: &mut [TreeNode],
    ) -> Result<NodeState> {
        (self.on_tick)(ctx, delta_time)
    }

    fn on_terminate(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        result: NodeState,
        _children: &mut [TreeNode],
    ) {
        if let Some(callback) = self.on_terminate.as_mut() {
            callback(ctx, result);
        }
    }
}

/// Maps a predicate to `Success`/`Failure`, re-evaluated on every tick.
/// Never reports `Running`.
pub struct ConditionNode {
    predicate: PredicateFn,
}

impl ConditionNode {
    pub fn new(predicate: impl FnMut(&BehaviorTreeContext) -> bool + Send + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionNode").finish_non_exhaustive()
    }
}

impl NodeBehavior for ConditionNode {
    fn on_tick(
        &mut self,
        ctx: &mut BehaviorTreeContext,
        _delta_time: f32,
        _children: &mut [TreeNode],
    ) -> Result<NodeState> {
        Ok(NodeState::from((self.predicate)(&*ctx)))
    }
}

/// Reports `Running` until a target duration has elapsed, then `Success`.
///
/// The target is drawn once per activation as
/// `duration + uniform(0, variance)` from the context's random source, which
/// spreads out otherwise synchronized agents.
#[derive(Debug, Clone)]
pub struct WaitNode {
    duration: f32,
    variance: f32,
    target: f32,
    elapsed: f32,
}

impl WaitNode {
    /// # Errors
    ///
    /// [`BehaviorTreeError::OutOfRange`] if either argument is negative or
    /// not finite.
    pub fn new(duration: f32, variance: f32) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(BehaviorTreeError::out_of_range(
                "duration",
                duration,
                "wait duration must be finite and non-negative",
            ));
        }
        if !variance.is_finite() || variance < 0.0 {
            return Err(BehaviorTreeError::out_of_range(
                "variance",
                variance,
                "wait variance must be finite and non-negative",
            ));
        }
        Ok(Self {
            duration,
            variance,
            target: duration,
            elapsed: 0.0,
        })
    }

    /// Duration the current activation waits for.
    pub fn target(&self) -> f32 {
        self.target
    }
}

impl NodeBehavior for WaitNode {
    fn on_initialize(&mut self, ctx: &mut BehaviorTreeContext, _children: &mut [TreeNode]) {
        self.elapsed = 0.0;
        self.target = self.duration;
        if self.variance > 0.0 {
            self.target += ctx.rng().gen_range(0.0..=self.variance);
        }
    }

    fn on_tick(
        &mut self,
        _ctx: &mut BehaviorTreeContext,
        delta_time: f32,
        _children: &mut [TreeNode],
    ) -> Result<NodeState> {
        self.elapsed += delta_time;
        Ok(if self.elapsed >= self.target {
            NodeState::Success
        } else {
            NodeState::Running
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::BlackboardKey;
    use crate::builder::{condition, wait};

    const ARMED: BlackboardKey = BlackboardKey::new(1);

    #[test]
    fn action_runs_edge_callbacks_once_per_activation() {
        let inits = Arc::new(AtomicUsize::new(0));
        let terms = Arc::new(AtomicUsize::new(0));
        let (i, t) = (Arc::clone(&inits), Arc::clone(&terms));

        let mut ticks = 0;
        let behavior = ActionNode::new(move |_, _| {
            ticks += 1;
            Ok(if ticks % 2 == 0 {
                NodeState::Success
            } else {
                NodeState::Running
            })
        })
        .with_initialize(move |_| {
            i.fetch_add(1, Ordering::SeqCst);
        })
        .with_terminate(move |_, result| {
            assert_eq!(result, NodeState::Success);
            t.fetch_add(1, Ordering::SeqCst);
        });
        let mut node = TreeNode::new("Action", behavior);
        let mut ctx = BehaviorTreeContext::default();

        for _ in 0..4 {
            node.execute(&mut ctx, 0.1).unwrap();
        }
        assert_eq!(inits.load(Ordering::SeqCst), 2);
        assert_eq!(terms.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn condition_reads_blackboard_each_tick() {
        let mut node = condition(|ctx| ctx.instance_blackboard().get_or(ARMED, false));
        let mut ctx = BehaviorTreeContext::default();

        assert_eq!(node.execute(&mut ctx, 0.1).unwrap(), NodeState::Failure);
        ctx.instance_blackboard().set(ARMED, true).unwrap();
        assert_eq!(node.execute(&mut ctx, 0.1).unwrap(), NodeState::Success);
    }

    #[test]
    fn wait_succeeds_on_the_tick_reaching_duration() {
        let mut node = wait(1.0, 0.0).unwrap();
        let mut ctx = BehaviorTreeContext::default();

        for _ in 0..3 {
            assert_eq!(node.execute(&mut ctx, 0.25).unwrap(), NodeState::Running);
        }
        assert_eq!(node.execute(&mut ctx, 0.25).unwrap(), NodeState::Success);
        // Next activation starts counting from zero.
        assert_eq!(node.execute(&mut ctx, 0.25).unwrap(), NodeState::Running);
    }

    #[test]
    fn wait_variance_stays_in_range() {
        let mut ctx = BehaviorTreeContext::builder().with_seed(11).build();
        for _ in 0..32 {
            let mut behavior = WaitNode::new(1.0, 0.5).unwrap();
            behavior.on_initialize(&mut ctx, &mut []);
            assert!((1.0..=1.5).contains(&behavior.target()));
        }
    }

    #[test]
    fn wait_rejects_negative_arguments() {
        assert!(WaitNode::new(-1.0, 0.0).is_err());
        assert!(WaitNode::new(1.0, -0.1).is_err());
        assert!(WaitNode::new(f32::NAN, 0.0).is_err());
    }
}
