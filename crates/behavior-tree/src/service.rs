//! Services: periodic side effects that run while a node is active.
//!
//! A service is attached when its node starts an activation, ticked at its
//! own [`Service::update_interval`] cadence on every execution of the node
//! (whatever the node's result), and detached when the activation ends.
//! The interval bookkeeping is done by the node, so a single service
//! instance can be shared by many nodes.

use std::fmt;

use crate::{BehaviorTreeContext, TreeNode};

pub trait Service: Send + Sync {
    /// Seconds between two [`Service::tick_service`] calls. Values at or
    /// below zero fire on every tick that advances time.
    fn update_interval(&self) -> f32;

    fn on_attached(&self, _node: &TreeNode, _ctx: &mut BehaviorTreeContext) {}

    fn tick_service(&self, node: &TreeNode, ctx: &mut BehaviorTreeContext, delta_time: f32);

    fn on_detached(&self, _node: &TreeNode, _ctx: &mut BehaviorTreeContext) {}
}

type HeartbeatFn = Box<dyn Fn(&TreeNode, &mut BehaviorTreeContext) + Send + Sync>;

/// Service invoking a callback at a fixed interval.
pub struct HeartbeatService {
    interval: f32,
    heartbeat: HeartbeatFn,
}

impl HeartbeatService {
    pub fn new(
        interval: f32,
        heartbeat: impl Fn(&TreeNode, &mut BehaviorTreeContext) + Send + Sync + 'static,
    ) -> Self {
        Self {
            interval,
            heartbeat: Box::new(heartbeat),
        }
    }
}

impl fmt::Debug for HeartbeatService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeartbeatService")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Service for HeartbeatService {
    fn update_interval(&self) -> f32 {
        self.interval
    }

    fn tick_service(&self, node: &TreeNode, ctx: &mut BehaviorTreeContext, _delta_time: f32) {
        (self.heartbeat)(node, ctx);
    }
}
