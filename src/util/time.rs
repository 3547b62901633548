//! Time utilities for the simulation and the relay

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // physics steps per second
pub const SNAPSHOT_TPS: u32 = 25; // snapshots per second
pub const RENDER_FPS: u32 = 60; // headless display refresh

/// Interval between physics steps
pub fn step_interval() -> Duration {
    Duration::from_micros(1_000_000 / SIMULATION_TPS as u64)
}

/// Interval between state broadcasts
pub fn snapshot_interval() -> Duration {
    Duration::from_micros(1_000_000 / SNAPSHOT_TPS as u64)
}

/// Interval between render frames
pub fn frame_interval() -> Duration {
    Duration::from_micros(1_000_000 / RENDER_FPS as u64)
}

/// Convert a wall-clock duration into a whole number of physics steps (rounded up)
pub fn steps_for(duration: Duration) -> u64 {
    let scaled = duration.as_micros() as u64 * SIMULATION_TPS as u64;
    (scaled + 999_999) / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shoot_cooldown_is_eighteen_steps() {
        assert_eq!(steps_for(Duration::from_millis(300)), 18);
    }

    #[test]
    fn broadcast_runs_slower_than_physics() {
        assert!(snapshot_interval() > step_interval());
        assert_eq!(snapshot_interval(), Duration::from_millis(40));
    }
}
