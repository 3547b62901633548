//! HTTP surface of the relay

mod routes;

pub use routes::build_router;
