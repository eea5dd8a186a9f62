//! Sample NPC tree: flee when hurt, fight what it sees, otherwise wander.

use std::sync::Arc;

use behavior_tree::builder::{action, condition, parallel, random_selector, repeater, selector, wait};
use behavior_tree::{
    BehaviorTreeContext, Blackboard, BlackboardKey, Cooldown, Decorator, HeartbeatService,
    Inverter, NodeState, ParallelPolicy, Result, Timeout, TreeNode,
};
use tracing::info;

/// `bool`: an enemy is in sight. Global scope, written by the world.
pub const ENEMY_VISIBLE: BlackboardKey = BlackboardKey::new(1);
/// `f32`: current health. Global scope, shared by the world and the tree.
pub const HEALTH: BlackboardKey = BlackboardKey::new(2);
/// `u32`: heartbeats emitted while in combat. Instance scope.
pub const AGGRO: BlackboardKey = BlackboardKey::new(3);

pub const MAX_HEALTH: f32 = 100.0;
const LOW_HEALTH: f32 = 30.0;
const SAFE_HEALTH: f32 = 60.0;
const REGEN_PER_SEC: f32 = 20.0;

/// Guard reading the world state from the global blackboard.
struct WorldGuard {
    name: &'static str,
    check: fn(&Blackboard) -> bool,
}

impl Decorator for WorldGuard {
    fn name(&self) -> &str {
        self.name
    }

    fn should_execute(&self, _node: &TreeNode, ctx: &BehaviorTreeContext) -> bool {
        (self.check)(ctx.global_blackboard())
    }
}

fn enemy_visible(board: &Blackboard) -> bool {
    board.get_or(ENEMY_VISIBLE, false)
}

fn badly_hurt(board: &Blackboard) -> bool {
    board.get_or(HEALTH, MAX_HEALTH) < LOW_HEALTH
}

/// Builds the NPC tree.
///
/// # Errors
///
/// Only fails if one of the hard-coded durations is rejected.
pub fn npc() -> Result<TreeNode> {
    Ok(selector(vec![flee(), combat()?, wander()?]).with_name("Npc"))
}

fn flee() -> TreeNode {
    action(|ctx, delta_time| {
        if ctx.is_cancelled() {
            return Ok(NodeState::Failure);
        }
        let board = ctx.global_blackboard();
        let health = (board.get_or(HEALTH, MAX_HEALTH) + REGEN_PER_SEC * delta_time).min(MAX_HEALTH);
        board.set(HEALTH, health)?;
        Ok(if health >= SAFE_HEALTH {
            NodeState::Success
        } else {
            NodeState::Running
        })
    })
    .with_name("Flee")
    .with_decorator(Arc::new(WorldGuard {
        name: "BadlyHurt",
        check: badly_hurt,
    }))
}

fn combat() -> Result<TreeNode> {
    let monitor = condition(|ctx| enemy_visible(ctx.global_blackboard())).with_name("EnemyInSight");
    let swings = repeater(3, false, wait(0.3, 0.0)?.with_name("Swing"))?;

    let heartbeat = HeartbeatService::new(0.5, |node, ctx| {
        let aggro = ctx.instance_blackboard().get_or(AGGRO, 0_u32) + 1;
        if ctx.instance_blackboard().set(AGGRO, aggro).is_ok() {
            info!(node = node.name(), aggro, "growl");
        }
    });

    Ok(
        parallel(ParallelPolicy::All, ParallelPolicy::Any, vec![monitor, swings])
            .with_name("Combat")
            .with_decorator(Arc::new(WorldGuard {
                name: "EnemyVisible",
                check: enemy_visible,
            }))
            .with_decorator(Arc::new(Cooldown::new(2.0)?))
            .with_decorator(Arc::new(Timeout::new(3.0)?))
            .with_service(Arc::new(heartbeat)),
    )
}

fn wander() -> Result<TreeNode> {
    let rest = condition(|ctx| enemy_visible(ctx.global_blackboard()))
        .with_name("Rest")
        .with_decorator(Arc::new(Inverter));

    Ok(random_selector(vec![
        wait(1.0, 0.5)?.with_name("Patrol"),
        wait(0.5, 0.25)?.with_name("LookAround"),
        rest,
    ])
    .with_name("Wander"))
}
