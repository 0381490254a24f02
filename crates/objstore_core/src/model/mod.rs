//! Object store component model.
//!
//! # Responsibility
//! - Define the keyed, stateful records exchanged between the CMS server and
//!   its clients.
//! - Enforce collection-level uniqueness rules before anything is persisted.
//!
//! # Invariants
//! - Every component is identified by a `Key`; generated keys are assigned by
//!   the store on first save.
//! - Equality is content-only: `DbState` and version never participate.

pub mod action;
pub mod component;
pub mod dependent_set;
pub mod display_format;
pub mod key;
pub mod menu_context;
pub mod names;
pub mod property;
pub mod search;
pub mod versioned;
pub mod visibility;
