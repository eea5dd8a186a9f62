//! Host-side driver owning a tree across start/stop cycles.

use tracing::{debug, info, warn};

use crate::{
    BehaviorTreeContext, BehaviorTreeError, BehaviorTreeInstance, Blackboard, NodeState, Result,
    TreeNode,
};

/// Runner behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Start an instance as soon as a root is set.
    pub auto_start: bool,
    /// Restart the instance whenever it reports a terminal result.
    pub restart_on_complete: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            restart_on_complete: false,
        }
    }
}

/// Owns a root node and the instance currently running it.
///
/// Hosts call [`BehaviorTreeRunner::update`] once per frame. Stopping hands
/// the root back to the runner so it can be started again; dropping the
/// runner aborts whatever is running.
#[derive(Debug)]
pub struct BehaviorTreeRunner {
    config: RunnerConfig,
    root: Option<TreeNode>,
    global_blackboard: Option<Blackboard>,
    instance: Option<BehaviorTreeInstance>,
}

impl BehaviorTreeRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            root: None,
            global_blackboard: None,
            instance: None,
        }
    }

    pub fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Sets the root used by the next start.
    ///
    /// With `auto_start`, the tree starts immediately unless an instance is
    /// already running, in which case the new root waits for the next
    /// [`BehaviorTreeRunner::start`].
    pub fn set_root(&mut self, root: TreeNode) {
        self.root = Some(root);
        if self.config.auto_start
            && !self.is_running()
            && let Err(err) = self.start()
        {
            warn!(target: "behavior_tree::runner", error = %err, "auto start failed");
        }
    }

    /// Blackboard shared as the global scope of every context this runner
    /// builds.
    pub fn set_global_blackboard(&mut self, blackboard: Blackboard) {
        self.global_blackboard = Some(blackboard);
    }

    /// Starts a fresh instance with a runner-built context.
    ///
    /// # Errors
    ///
    /// [`BehaviorTreeError::MissingArgument`] if no root is available.
    pub fn start(&mut self) -> Result<()> {
        let mut builder = BehaviorTreeContext::builder();
        if let Some(global) = &self.global_blackboard {
            builder = builder.with_global_blackboard(global.clone());
        }
        self.start_with_context(builder.build())
    }

    /// Starts a fresh instance, aborting the previous one first.
    ///
    /// # Errors
    ///
    /// [`BehaviorTreeError::MissingArgument`] if no root is available.
    pub fn start_with_context(&mut self, context: BehaviorTreeContext) -> Result<()> {
        self.reclaim_root();
        let root = self
            .root
            .take()
            .ok_or(BehaviorTreeError::MissingArgument { name: "root" })?;

        info!(target: "behavior_tree::runner", root = root.name(), "starting tree");
        self.instance = Some(BehaviorTreeInstance::new(root, context));
        Ok(())
    }

    /// Ticks the running instance. Returns `None` when nothing was started.
    ///
    /// # Errors
    ///
    /// Propagates callback errors from the tree; see
    /// [`BehaviorTreeInstance::tick`].
    pub fn update(&mut self, delta_time: f32) -> Result<Option<NodeState>> {
        let Some(instance) = self.instance.as_mut() else {
            return Ok(None);
        };

        let result = instance.tick(delta_time)?;
        if self.config.restart_on_complete && result.is_terminal() {
            instance.restart();
        }
        Ok(Some(result))
    }

    /// Aborts and discards the running instance, keeping its root.
    pub fn stop(&mut self) {
        if self.instance.is_some() {
            self.reclaim_root();
            info!(target: "behavior_tree::runner", "tree stopped");
        }
    }

    /// Returns `true` while an instance exists, even if it has completed.
    pub fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<&BehaviorTreeInstance> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut BehaviorTreeInstance> {
        self.instance.as_mut()
    }

    /// Ends the current instance. Its root comes back unless a newer root
    /// was set meanwhile.
    fn reclaim_root(&mut self) {
        if let Some(instance) = self.instance.take() {
            let (root, _) = instance.into_parts();
            if self.root.is_none() {
                self.root = Some(root);
            } else {
                debug!(target: "behavior_tree::runner", old_root = root.name(), "root replaced");
            }
        }
    }
}

impl Default for BehaviorTreeRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl Drop for BehaviorTreeRunner {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.as_mut() {
            instance.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{action, condition};

    fn manual() -> RunnerConfig {
        RunnerConfig {
            auto_start: false,
            restart_on_complete: false,
        }
    }

    #[test]
    fn start_without_root_fails() {
        let mut runner = BehaviorTreeRunner::new(manual());
        assert!(matches!(
            runner.start(),
            Err(BehaviorTreeError::MissingArgument { name: "root" })
        ));
        assert_eq!(runner.update(0.1).unwrap(), None);
    }

    #[test]
    fn auto_start_on_set_root() {
        let mut runner = BehaviorTreeRunner::new(RunnerConfig::default());
        runner.set_root(condition(|_| true));
        assert!(runner.is_running());
        assert_eq!(runner.update(0.1).unwrap(), Some(NodeState::Success));
        // Completed without restart: the instance stays inactive.
        assert_eq!(runner.update(0.1).unwrap(), Some(NodeState::Failure));
    }

    #[test]
    fn restart_on_complete_keeps_ticking() {
        let mut runner = BehaviorTreeRunner::new(RunnerConfig {
            auto_start: true,
            restart_on_complete: true,
        });
        runner.set_root(condition(|_| true));

        for _ in 0..3 {
            assert_eq!(runner.update(0.1).unwrap(), Some(NodeState::Success));
        }
        assert!(runner.instance().unwrap().is_active());
    }

    #[test]
    fn stop_returns_root_for_restart() {
        let mut runner = BehaviorTreeRunner::new(manual());
        runner.set_root(action(|_, _| Ok(NodeState::Running)));
        assert!(!runner.is_running());

        runner.start().unwrap();
        runner.update(0.1).unwrap();
        runner.stop();
        assert!(!runner.is_running());

        runner.start().unwrap();
        assert!(!runner.instance().unwrap().root().is_active());
    }

    #[test]
    fn global_blackboard_reaches_context() {
        let global = Blackboard::new();
        let mut runner = BehaviorTreeRunner::new(manual());
        runner.set_global_blackboard(global.clone());
        runner.set_root(condition(|_| true));
        runner.start().unwrap();

        let ctx = runner.instance().unwrap().context();
        assert!(ctx.global_blackboard().ptr_eq(&global));
    }
}
