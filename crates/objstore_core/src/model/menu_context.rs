//! UI contexts in which menu actions can appear.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::key::Key;
use super::names::{require_label, validate_name};
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

const MENU_CONTEXT_KEY: &[&str] = &["UICONTEXTID"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuContext {
    base: ComponentBase,
    name: String,
    label: String,
    description: Option<String>,
}

impl MenuContext {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Result<Self, ComponentError> {
        let name = name.into();
        let label = label.into();
        validate_name("menu context", &name)?;
        require_label("menu context label", &label)?;
        Ok(Self {
            base: ComponentBase::new(Key::new(MENU_CONTEXT_KEY.iter().copied())),
            name,
            label,
            description: None,
        })
    }

    /// Builds a context that already has a store id, e.g. when an action
    /// refers to a context loaded elsewhere.
    pub fn with_id(
        id: i64,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, ComponentError> {
        let mut context = Self::new(name, label)?;
        context.base.key_mut().assign([id.to_string()])?;
        Ok(context)
    }

    pub fn id(&self) -> Option<i64> {
        self.base.key().numeric_value()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), ComponentError> {
        let label = label.into();
        require_label("menu context label", &label)?;
        self.label = label;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }
}

impl DbComponent for MenuContext {
    const NODE_NAME: &'static str = "PSXMenuContext";
    const GENERATED_KEY: bool = true;

    fn key_names() -> &'static [&'static str] {
        MENU_CONTEXT_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ComponentError> {
        validate_name("menu context", &self.name)?;
        require_label("menu context label", &self.label)
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.push_text_child("Name", self.name.as_str());
        element.push_text_child("Label", self.label.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
    }

    fn read_content(base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        Ok(Self {
            base,
            name: walker.required_text("Name")?.to_string(),
            label: walker.required_text("Label")?.to_string(),
            description: walker.optional_text("Description").map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MenuContext;
    use crate::model::component::{DbComponent, DbState};
    use crate::xml::XmlFormat;

    #[test]
    fn xml_round_trip_keeps_identity_and_state() {
        let mut context = MenuContext::with_id(12, "ui_ctx_folder", "Folder").expect("valid");
        context.set_description(Some("Folder tree <right click>".to_string()));
        context.mark_persisted();

        let xml = context
            .to_xml_string(&XmlFormat::default())
            .expect("serialize");
        assert!(xml.contains("<UICONTEXTID>12</UICONTEXTID>"));
        assert!(xml.contains("state=\"unmodified\""));

        let read = MenuContext::from_xml_str(&xml).expect("deserialize");
        assert_eq!(read, context);
        assert_eq!(read.id(), Some(12));
        assert_eq!(read.state(), DbState::Unmodified);
        assert!(read.key().is_persisted());
    }

    #[test]
    fn duplicate_drops_generated_id() {
        let mut context = MenuContext::with_id(12, "ui_ctx_folder", "Folder").expect("valid");
        context.mark_persisted();

        let copy = context.duplicate();
        assert_eq!(copy.id(), None);
        assert_eq!(copy.state(), DbState::New);
        assert_eq!(copy.name(), "ui_ctx_folder");
        assert_ne!(copy, context);
    }
}
