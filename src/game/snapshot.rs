//! Snapshot building for network transmission

use std::collections::BTreeMap;

use crate::ws::protocol::{BallSnapshot, PlayerSnapshot, StateSnapshot};

use super::simulation::Simulation;

/// Builds full-state snapshots from the authoritative simulation
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    stats: SnapshotStats,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot of every player, the ball and the scores
    pub fn build(&mut self, sim: &Simulation) -> StateSnapshot {
        let players: BTreeMap<String, PlayerSnapshot> = sim
            .players
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    PlayerSnapshot {
                        id: p.id.clone(),
                        name: p.name.clone(),
                        x: p.x,
                        y: p.y,
                        color: p.team,
                        inputs: p.input,
                        can_shoot: sim.can_shoot(p),
                    },
                )
            })
            .collect();

        self.stats.record(players.len(), sim.current_step());

        StateSnapshot {
            players,
            ball: BallSnapshot {
                x: sim.ball.x,
                y: sim.ball.y,
                vx: sim.ball.vx,
                vy: sim.ball.vy,
                radius: sim.ball.radius,
            },
            scores: sim.scores,
        }
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }
}

/// Snapshot stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    /// Simulation step captured by the latest snapshot
    pub last_step: u64,
    /// Largest number of physics steps between two consecutive snapshots
    pub max_step_gap: u64,
    pub avg_players_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize, step: u64) {
        if self.total_snapshots > 0 {
            self.max_step_gap = self.max_step_gap.max(step.saturating_sub(self.last_step));
        }
        self.total_snapshots += 1;
        self.last_step = step;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f32 / n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::simulation::{HOST_PLAYER_ID, REMOTE_PLAYER_ID};
    use crate::ws::protocol::{InputFlags, Team};

    #[test]
    fn snapshot_mirrors_simulation() {
        let mut sim = Simulation::default();
        sim.add_player(HOST_PLAYER_ID, "Host", Team::Red);
        sim.add_player(REMOTE_PLAYER_ID, "Guest", Team::Blue);
        sim.set_input(
            REMOTE_PLAYER_ID,
            InputFlags {
                a: true,
                ..Default::default()
            },
        );
        sim.step();

        let mut builder = SnapshotBuilder::new();
        let snapshot = builder.build(&sim);

        assert_eq!(snapshot.players.len(), 2);
        let blue = &snapshot.players[REMOTE_PLAYER_ID];
        assert_eq!(blue.x, 693.0);
        assert_eq!(blue.color, Team::Blue);
        assert!(blue.inputs.a);
        assert!(blue.can_shoot);
        assert_eq!(snapshot.ball.radius, 10.0);
        assert_eq!(builder.stats().total_snapshots, 1);
    }

    #[test]
    fn stats_track_step_gaps() {
        let mut stats = SnapshotStats::default();
        stats.record(2, 2);
        stats.record(2, 5);
        stats.record(2, 7);
        assert_eq!(stats.total_snapshots, 3);
        assert_eq!(stats.max_step_gap, 3);
        assert!((stats.avg_players_per_snapshot - 2.0).abs() < 1e-6);
    }
}
