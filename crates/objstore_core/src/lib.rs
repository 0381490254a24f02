//! Object store components for CMS server/client transport.
//! This crate is the single source of truth for component invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod xml;

pub use config::{ConfigError, LoggingConfig, StoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::action::{Action, ActionKind};
pub use model::component::{ComponentBase, ComponentError, DbComponent, DbState};
pub use model::dependent_set::DependentSet;
pub use model::display_format::{DfColumns, DisplayColumn, DisplayFormat, RenderType, SortOrder};
pub use model::key::Key;
pub use model::menu_context::MenuContext;
pub use model::property::{Property, PropertySet};
pub use model::search::{FieldType, Operator, Search, SearchCollection, SearchField, SearchKind};
pub use model::versioned::{VersionStamp, VersionableDbComponent};
pub use model::visibility::{VisibilityContextEntry, VisibilityContexts};
pub use repo::component_repo::{
    ComponentRecord, ComponentRepository, InMemoryComponentRepository, RepoError, RepoResult,
};
pub use service::object_store::ObjectStore;
pub use xml::{TreeWalker, XmlElement, XmlError, XmlFormat, XmlResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
