//! Shared contract for the motorwatch services.
//!
//! Pure logic only: readings and their validation, per-key windows,
//! aggregate statistics, threshold classification, diagnoses, replay control
//! primitives, CSV record parsing and environment config helpers. Nothing
//! here touches the network or the filesystem, so every piece can be tested
//! in isolation.

pub mod classify;
pub mod config;
pub mod csv;
pub mod diagnosis;
pub mod error;
pub mod reading;
pub mod replay;
pub mod response;
pub mod stats;
pub mod types;
pub mod window;
