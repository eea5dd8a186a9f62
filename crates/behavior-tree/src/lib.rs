//! Tick-driven behavior tree engine.
//!
//! Trees are assembled from [`TreeNode`]s and driven by a host that calls
//! [`BehaviorTreeInstance::tick`] once per logical step with the elapsed
//! delta. Nodes that need more time report [`NodeState::Running`] and resume
//! on the next tick; all state lives in nodes, decorators and services, not
//! on a suspended call stack.
//!
//! - **Single-threaded**: a tick evaluates synchronously, `Parallel` included
//! - **Cooperative cancellation**: leaf logic observes the context's
//!   [`CancellationSignal`]; the owner aborts the instance
//! - **Shared cross-cutting behavior**: one [`Decorator`] or [`Service`] may
//!   be attached to many nodes and keeps per-node state keyed by [`NodeId`]
//!
//! # Architecture
//!
//! - [`TreeNode`]: lifecycle state machine hosting a [`NodeBehavior`]
//! - [`NodeState`]: Success, Failure or Running
//! - Composite nodes: [`Selector`], [`RandomSelector`], [`Parallel`], [`Repeater`]
//! - Leaf nodes: [`ActionNode`], [`ConditionNode`], [`WaitNode`]
//! - Decorators: [`Cooldown`], [`Inverter`], [`Timeout`]
//! - Services: [`HeartbeatService`]
//! - [`BehaviorTreeContext`]: scoped [`Blackboard`]s, RNG, clock, debugger
//! - [`BehaviorTreeInstance`] and [`BehaviorTreeRunner`]: tick drivers

pub mod behavior;
pub mod blackboard;
pub mod builder;
pub mod composite;
pub mod context;
pub mod debugger;
pub mod decorator;
pub mod error;
pub mod instance;
pub mod leaf;
pub mod node;
pub mod runner;
pub mod service;
pub mod status;

// Re-export core types for ergonomic API
pub use behavior::NodeBehavior;
pub use blackboard::{Blackboard, BlackboardKey};
pub use composite::{
    Composite, CompositeBehavior, Parallel, ParallelPolicy, RandomSelector, Repeater, Selector,
};
pub use context::{BehaviorTreeContext, BehaviorTreeContextBuilder, CancellationSignal};
pub use debugger::{BehaviorTreeDebugger, TracingDebugger};
pub use decorator::{Cooldown, Decorator, Inverter, ResultModifier, Timeout};
pub use error::{BehaviorTreeError, Result};
pub use instance::BehaviorTreeInstance;
pub use leaf::{ActionNode, ConditionNode, WaitNode};
pub use node::{NodeId, TreeNode};
pub use runner::{BehaviorTreeRunner, RunnerConfig};
pub use service::{HeartbeatService, Service};
pub use status::NodeState;
