//! Domain types and the in-memory job state store for inkwell.
//!
//! This crate has no internal dependencies. The generation pipeline, the
//! provider client and the HTTP control surface all build on the types and
//! seams defined here.

pub mod context;
pub mod error;
pub mod generation;
pub mod job;
pub mod job_store;
pub mod progress;
pub mod types;
