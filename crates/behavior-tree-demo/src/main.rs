//! Behavior tree demo binary.
//!
//! Drives the sample NPC tree from [`tree::npc`] against a tiny simulated
//! world on a fixed tick period. Enemies come and go at random and hurt the
//! NPC while visible; the tree decides whether to flee, fight or wander.
//!
//! # Examples
//!
//! ```bash
//! # Reproducible run with node-level tracing
//! BT_DEMO_SEED=7 RUST_LOG=behavior_tree=trace cargo run -p behavior-tree-demo
//! ```

mod config;
mod tree;

use std::sync::Arc;

use anyhow::Result;
use behavior_tree::{
    BehaviorTreeContext, BehaviorTreeRunner, Blackboard, CancellationSignal, RunnerConfig,
    TracingDebugger,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::MissedTickBehavior;

use crate::config::DemoConfig;
use crate::tree::{ENEMY_VISIBLE, HEALTH, MAX_HEALTH};

/// Chance per tick that enemy visibility flips.
const VISIBILITY_FLIP_CHANCE: f64 = 0.05;
const DAMAGE_PER_SEC: f32 = 15.0;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DemoConfig::from_env();
    tracing::info!("Starting behavior tree demo");
    tracing::info!("Tick interval: {:?}", config.tick_interval);
    tracing::info!("Seed: {:?}", config.seed);

    let world = Blackboard::new();
    world.set(ENEMY_VISIBLE, false)?;
    world.set(HEALTH, MAX_HEALTH)?;

    let signal = CancellationSignal::new();
    let mut context = BehaviorTreeContext::builder()
        .with_global_blackboard(world.clone())
        .with_debugger(Arc::new(TracingDebugger))
        .with_cancellation(signal.clone());
    if let Some(seed) = config.seed {
        context = context.with_seed(seed);
    }

    let mut runner = BehaviorTreeRunner::new(RunnerConfig {
        auto_start: false,
        restart_on_complete: config.restart_on_complete,
    });
    runner.set_root(tree::npc()?);
    runner.start_with_context(context.build())?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let delta_time = config.delta_time();
    let mut ticks = 0_u64;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Interrupted, cancelling tree");
                signal.cancel();
                // One last tick lets running leaves observe the signal.
                runner.update(delta_time)?;
                break;
            }
        }

        step_world(&world, &mut rng, delta_time)?;
        if let Some(result) = runner.update(delta_time)?
            && result.is_terminal()
        {
            tracing::info!(%result, tick = ticks, "tree completed");
        }

        ticks += 1;
        if config.max_ticks != 0 && ticks >= config.max_ticks {
            tracing::info!("Reached {} ticks", ticks);
            break;
        }
    }

    runner.stop();
    tracing::info!(
        health = world.get_or(HEALTH, 0.0_f32),
        "Demo finished"
    );
    Ok(())
}

/// Advances the simulated world by one tick.
fn step_world(world: &Blackboard, rng: &mut StdRng, delta_time: f32) -> Result<()> {
    let mut visible = world.get_or(ENEMY_VISIBLE, false);
    if rng.gen_bool(VISIBILITY_FLIP_CHANCE) {
        visible = !visible;
        world.set(ENEMY_VISIBLE, visible)?;
        tracing::info!(visible, "enemy visibility changed");
    }

    if visible {
        let health = (world.get_or(HEALTH, MAX_HEALTH) - DAMAGE_PER_SEC * delta_time).max(0.0);
        world.set(HEALTH, health)?;
    }
    Ok(())
}
