//! Repository contracts for serialized components.
//!
//! # Responsibility
//! - Define the storage boundary the object store writes component XML to.
//! - Keep row versioning and id generation behind one trait.
//!
//! # Invariants
//! - Updates with an expected version fail with `VersionConflict` unless the
//!   stored version matches.
//! - Repository APIs return semantic errors (`NotFound`, `KeyConflict`) in
//!   addition to transport errors.

pub mod component_repo;
