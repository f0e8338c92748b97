//! Domain model for the golf analyzer job trigger.
//!
//! Holds the inbound request model and its validation policy, the job
//! resource naming rules, and the domain error type. Nothing here does I/O.

pub mod error;
pub mod job;
pub mod trigger;
