//! # trawl-core
//!
//! Core types, status machine, and error types for Trawl.
//!
//! This crate provides the foundational types shared across all Trawl crates:
//! - Entity structs for tasks and scraped results
//! - Platform and task status enums, including the task state machine
//! - Job request packaging and validation
//! - Backend snapshot types exchanged between the API client and the stores
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod request;
pub mod snapshot;

pub use errors::CoreError;
