//! Window classifier service library.
//!
//! Exposes the building blocks (config, state, classifier, storage, routes)
//! so integration tests and the binary entrypoint can both access them.

pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
