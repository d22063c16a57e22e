//! Replay controller service library.
//!
//! Exposes the building blocks (config, controller, source, sender, routes)
//! so integration tests and the binary entrypoint can both access them.

pub mod config;
pub mod controller;
pub mod error;
pub mod handlers;
mod replay;
pub mod router;
pub mod routes;
pub mod sender;
pub mod source;
pub mod state;
