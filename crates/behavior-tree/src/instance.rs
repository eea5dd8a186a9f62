//! A running tree: root node, context and activity flag.

use tracing::debug;

use crate::{BehaviorTreeContext, NodeState, Result, TreeNode};

/// Drives one tree through repeated ticks.
///
/// The instance becomes inactive when the root reports a terminal result or
/// when it is aborted; inactive instances answer every tick with `Failure`
/// until [`BehaviorTreeInstance::restart`] is called.
#[derive(Debug)]
pub struct BehaviorTreeInstance {
    root: TreeNode,
    context: BehaviorTreeContext,
    active: bool,
}

impl BehaviorTreeInstance {
    /// Wraps `root` in a new, active instance.
    pub fn new(root: TreeNode, context: BehaviorTreeContext) -> Self {
        Self {
            root,
            context,
            active: true,
        }
    }

    /// The root node, for inspection between ticks.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// The context shared by every node of this tree.
    pub fn context(&self) -> &BehaviorTreeContext {
        &self.context
    }

    /// Mutable context access between ticks, e.g. to seed blackboards.
    pub fn context_mut(&mut self) -> &mut BehaviorTreeContext {
        &mut self.context
    }

    /// `false` once the root completed or the instance was aborted.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advances the clock and executes the root once.
    ///
    /// # Errors
    ///
    /// Propagates callback errors from the tree. The instance stays active
    /// and nodes keep their activations; call [`BehaviorTreeInstance::abort`]
    /// to release them.
    pub fn tick(&mut self, delta_time: f32) -> Result<NodeState> {
        if !self.active {
            return Ok(NodeState::Failure);
        }

        self.context.begin_tick(delta_time);
        let result = self.root.execute(&mut self.context, delta_time)?;
        if result.is_terminal() {
            self.active = false;
            debug!(
                target: "behavior_tree::instance",
                root = self.root.name(),
                %result,
                "tree completed"
            );
            if let Some(debugger) = self.context.debugger() {
                debugger.on_tree_completed(self, result);
            }
        }

        Ok(result)
    }

    /// Aborts the whole tree and reactivates the instance.
    ///
    /// Elapsed time keeps accumulating; it is not reset.
    pub fn restart(&mut self) {
        self.root.abort(&mut self.context);
        self.active = true;
        debug!(target: "behavior_tree::instance", root = self.root.name(), "tree restarted");
        if let Some(debugger) = self.context.debugger() {
            debugger.on_tree_restarted(self);
        }
    }

    /// Aborts the tree and deactivates the instance. No-op when inactive.
    pub fn abort(&mut self) {
        if !self.active {
            return;
        }

        self.root.abort(&mut self.context);
        self.active = false;
        debug!(target: "behavior_tree::instance", root = self.root.name(), "tree aborted");
        if let Some(debugger) = self.context.debugger() {
            debugger.on_tree_completed(self, NodeState::Failure);
        }
    }

    /// Aborts if still active and hands back the root and context.
    pub fn into_parts(mut self) -> (TreeNode, BehaviorTreeContext) {
        self.abort();
        (self.root, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{action, wait};

    #[test]
    fn inactive_instance_fails_without_ticking() {
        let mut instance = BehaviorTreeInstance::new(wait(0.0, 0.0).unwrap(), Default::default());

        assert_eq!(instance.tick(0.5).unwrap(), NodeState::Success);
        assert!(!instance.is_active());
        assert_eq!(instance.tick(0.5).unwrap(), NodeState::Failure);
        // The second tick never reached the context clock.
        assert_eq!(instance.context().elapsed_time(), 0.5);
    }

    #[test]
    fn restart_keeps_elapsed_time() {
        let mut instance =
            BehaviorTreeInstance::new(action(|_, _| Ok(NodeState::Running)), Default::default());

        instance.tick(1.0).unwrap();
        instance.restart();
        assert!(instance.is_active());
        assert!(!instance.root().is_active());
        instance.tick(1.0).unwrap();
        assert_eq!(instance.context().elapsed_time(), 2.0);
    }

    #[test]
    fn abort_deactivates_and_cleans_up() {
        let mut instance =
            BehaviorTreeInstance::new(action(|_, _| Ok(NodeState::Running)), Default::default());

        assert_eq!(instance.tick(0.1).unwrap(), NodeState::Running);
        instance.abort();
        assert!(!instance.is_active());
        assert!(!instance.root().is_active());

        let (root, _) = instance.into_parts();
        assert!(!root.is_active());
    }
}
