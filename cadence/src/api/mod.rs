//! Local HTTP API.
//!
//! The stand-in for the presentation layer: front ends arm, disarm and
//! acknowledge the reminder here, and poll its state to render a
//! countdown. OpenAPI docs are served under `/swagger-ui`.

mod server;
mod v0;

pub use server::{SharedState, router, serve};
