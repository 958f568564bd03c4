//! Job execution engine.
//!
//! Contains the bounded worker pool that runs tracked workflow jobs.

pub mod dispatcher;
