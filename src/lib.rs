//! Dash Goal - two-player soccer with host-authoritative networking
//!
//! - `game`: deterministic simulation, snapshots and client interpolation
//! - `rooms`, `ws`, `http`: the relay that pairs a host with one client
//! - `peer`: host and client sessions, their relay transport and rendering

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod peer;
pub mod rooms;
pub mod telemetry;
pub mod util;
pub mod ws;
