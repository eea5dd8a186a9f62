//! Demo settings read from the environment.
use std::env;
use std::time::Duration;

/// Runtime knobs for the demo loop.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    /// Wall-clock period between ticks.
    pub tick_interval: Duration,
    /// Ticks to run before exiting. Zero runs until interrupted.
    pub max_ticks: u64,
    /// Fixed seed for the tree's random source.
    pub seed: Option<u64>,
    /// Restart the tree whenever it completes.
    pub restart_on_complete: bool,
}

impl DemoConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BT_DEMO_TICK_MS` - Tick period in milliseconds (default: 100, minimum: 1)
    /// - `BT_DEMO_MAX_TICKS` - Ticks before exit, 0 for unlimited (default: 300)
    /// - `BT_DEMO_SEED` - Seed for reproducible runs (default: entropy)
    /// - `BT_DEMO_RESTART` - Restart the tree on completion (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("BT_DEMO_TICK_MS") {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ticks) = read_env::<u64>("BT_DEMO_MAX_TICKS") {
            config.max_ticks = ticks;
        }
        config.seed = read_env::<u64>("BT_DEMO_SEED");
        if let Some(restart) = read_env_bool("BT_DEMO_RESTART") {
            config.restart_on_complete = restart;
        }

        config
    }

    /// Seconds fed to the tree on every tick.
    pub fn delta_time(&self) -> f32 {
        self.tick_interval.as_secs_f32()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            max_ticks: 300,
            seed: None,
            restart_on_complete: true,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    parse_bool(&env::var(key).ok()?)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
