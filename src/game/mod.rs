//! Game simulation modules

pub mod interpolation;
pub mod kick;
pub mod physics;
pub mod simulation;
pub mod snapshot;

pub use interpolation::{ClientWorld, InterpolationConfig};
pub use physics::PhysicsConfig;
pub use simulation::{Simulation, HOST_PLAYER_ID, REMOTE_PLAYER_ID};
pub use snapshot::SnapshotBuilder;
