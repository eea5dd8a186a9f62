//! Per-instance execution context.
//!
//! [`BehaviorTreeContext`] bundles everything a node may consult while it
//! ticks: three scoped blackboards, the random source, an optional debugger,
//! a cooperative cancellation signal and the tick clock.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{BehaviorTreeDebugger, Blackboard};

/// Cooperative cancellation flag.
///
/// Cloning shares the flag. The engine never reacts to it on its own: leaf
/// logic observes [`CancellationSignal::is_cancelled`], and whoever owns the
/// signal is expected to call `abort()` on the instance.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runtime context for one behavior tree instance.
///
/// The blackboards differ only in how widely they are shared:
/// - **global**: typically one handle shared by every tree in the host
/// - **tree**: shared by instances of the same tree asset
/// - **instance**: private to this instance
pub struct BehaviorTreeContext {
    global_blackboard: Blackboard,
    tree_blackboard: Blackboard,
    instance_blackboard: Blackboard,
    debugger: Option<Arc<dyn BehaviorTreeDebugger>>,
    cancellation: CancellationSignal,
    rng: StdRng,
    delta_time: f32,
    elapsed_time: f32,
}

impl BehaviorTreeContext {
    /// Starts a builder; parts left unset get defaults in `build`.
    pub fn builder() -> BehaviorTreeContextBuilder {
        BehaviorTreeContextBuilder::default()
    }

    /// Scope shared by every tree the host runs.
    pub fn global_blackboard(&self) -> &Blackboard {
        &self.global_blackboard
    }

    /// Scope shared by instances of the same tree.
    pub fn tree_blackboard(&self) -> &Blackboard {
        &self.tree_blackboard
    }

    /// Scope private to this instance.
    pub fn instance_blackboard(&self) -> &Blackboard {
        &self.instance_blackboard
    }

    /// Observer notified of node and tree lifecycle events, if any.
    pub fn debugger(&self) -> Option<&Arc<dyn BehaviorTreeDebugger>> {
        self.debugger.as_ref()
    }

    /// Cooperative stop flag for leaf logic to poll.
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }

    /// Shorthand for `self.cancellation().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Random source used for shuffles and wait variance.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Delta passed to the most recent [`BehaviorTreeContext::begin_tick`].
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Sum of every delta since the context was built.
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Advances the tick clock.
    ///
    /// [`crate::BehaviorTreeInstance::tick`] calls this once before executing
    /// the root; hosts driving bare nodes call it themselves.
    pub fn begin_tick(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
        self.elapsed_time += delta_time;
    }
}

impl Default for BehaviorTreeContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for BehaviorTreeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorTreeContext")
            .field("global_blackboard", &self.global_blackboard)
            .field("tree_blackboard", &self.tree_blackboard)
            .field("instance_blackboard", &self.instance_blackboard)
            .field("has_debugger", &self.debugger.is_some())
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("delta_time", &self.delta_time)
            .field("elapsed_time", &self.elapsed_time)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BehaviorTreeContext`]. Every unset part is defaulted.
#[derive(Default)]
pub struct BehaviorTreeContextBuilder {
    global_blackboard: Option<Blackboard>,
    tree_blackboard: Option<Blackboard>,
    instance_blackboard: Option<Blackboard>,
    debugger: Option<Arc<dyn BehaviorTreeDebugger>>,
    cancellation: Option<CancellationSignal>,
    rng: Option<StdRng>,
}

impl BehaviorTreeContextBuilder {
    pub fn with_global_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.global_blackboard = Some(blackboard);
        self
    }

    pub fn with_tree_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.tree_blackboard = Some(blackboard);
        self
    }

    pub fn with_instance_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.instance_blackboard = Some(blackboard);
        self
    }

    pub fn with_debugger(mut self, debugger: Arc<dyn BehaviorTreeDebugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Seeds the random source for reproducible shuffles and waits.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn build(self) -> BehaviorTreeContext {
        BehaviorTreeContext {
            global_blackboard: self.global_blackboard.unwrap_or_default(),
            tree_blackboard: self.tree_blackboard.unwrap_or_default(),
            instance_blackboard: self.instance_blackboard.unwrap_or_default(),
            debugger: self.debugger,
            cancellation: self.cancellation.unwrap_or_default(),
            rng: self.rng.unwrap_or_else(StdRng::from_entropy),
            delta_time: 0.0,
            elapsed_time: 0.0,
        }
    }
}
