//! Core use-case services.
//!
//! # Responsibility
//! - Translate component state transitions into repository calls.
//! - Keep callers decoupled from record and XML storage details.

pub mod object_store;
