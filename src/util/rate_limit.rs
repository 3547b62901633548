//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Room operation rate limit (create, join, list)
pub const ROOM_OP_RATE_LIMIT: u32 = 5; // Max 5 room operations per second

/// Per-connection rate limiter state.
///
/// Only room operations are limited; input and state forwarding must stay
/// lossless because the transport is assumed reliable.
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    room_ops: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self {
            room_ops: create_limiter(ROOM_OP_RATE_LIMIT),
        }
    }

    /// Check if a room operation is allowed (returns true if allowed)
    pub fn check_room_op(&self) -> bool {
        self.room_ops.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
