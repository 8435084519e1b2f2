//! Gateway HTTP surface tests
//!
//! Drives the full router over real sockets: verb mapping, status mapping,
//! liveness, and isolation from store failures.

mod handlers;
mod liveness;
