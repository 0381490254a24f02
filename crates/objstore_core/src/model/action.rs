//! Menu actions with their UI contexts and visibility rules.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::dependent_set::DependentSet;
use super::key::Key;
use super::menu_context::MenuContext;
use super::names::{require_label, validate_name};
use super::property::PropertySet;
use super::versioned::{VersionStamp, VersionableDbComponent};
use super::visibility::VisibilityContexts;
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

const ACTION_KEY: &[&str] = &["ACTIONID"];
const MENU_CONTEXT_SET_NODE: &str = "PSXMenuContextSet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Leaf entry that invokes a URL.
    MenuItem,
    /// Sub-menu whose children are other actions.
    Cascading,
    /// Sub-menu built at runtime by the URL it points to.
    Dynamic,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MenuItem => "menuItem",
            Self::Cascading => "cascading",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "menuItem" => Some(Self::MenuItem),
            "cascading" => Some(Self::Cascading),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    base: ComponentBase,
    version: VersionStamp,
    name: String,
    label: String,
    kind: ActionKind,
    url: Option<String>,
    description: Option<String>,
    properties: PropertySet,
    menu_contexts: DependentSet<MenuContext>,
    visibility: VisibilityContexts,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: ActionKind,
    ) -> Result<Self, ComponentError> {
        let name = name.into();
        let label = label.into();
        validate_name("action", &name)?;
        require_label("action label", &label)?;
        Ok(Self {
            base: ComponentBase::new(Key::new(ACTION_KEY.iter().copied())),
            version: VersionStamp::default(),
            name,
            label,
            kind,
            url: None,
            description: None,
            properties: PropertySet::new(),
            menu_contexts: DependentSet::new(),
            visibility: VisibilityContexts::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), ComponentError> {
        let label = label.into();
        require_label("action label", &label)?;
        self.label = label;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_kind(&mut self, kind: ActionKind) {
        self.kind = kind;
        self.base.set_modified();
    }

    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url.filter(|url| !url.trim().is_empty());
        self.base.set_modified();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.base.set_modified();
        &mut self.properties
    }

    pub fn menu_contexts(&self) -> &DependentSet<MenuContext> {
        &self.menu_contexts
    }

    /// Attaches the action to a stored UI context.
    ///
    /// # Errors
    /// - `KeyNotAssigned` when the context has no store id yet.
    /// - `Duplicate` when a context with the same name is already attached.
    pub fn add_menu_context(&mut self, context: MenuContext) -> Result<(), ComponentError> {
        attach_menu_context(&mut self.menu_contexts, context)?;
        self.base.set_modified();
        Ok(())
    }

    pub fn remove_menu_context(&mut self, name: &str) -> Option<MenuContext> {
        let removed = self
            .menu_contexts
            .remove_where(|context| context.name().eq_ignore_ascii_case(name))?;
        self.base.set_modified();
        Some(removed)
    }

    pub fn visibility(&self) -> &VisibilityContexts {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut VisibilityContexts {
        self.base.set_modified();
        &mut self.visibility
    }

    /// Whether the action shows up for `value` in `context`.
    pub fn is_visible_in(&self, context: &str, value: &str) -> bool {
        self.visibility.is_visible(context, value)
    }
}

impl DbComponent for Action {
    const NODE_NAME: &'static str = "PSXAction";
    const GENERATED_KEY: bool = true;

    fn key_names() -> &'static [&'static str] {
        ACTION_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn version_stamp(&self) -> Option<&VersionStamp> {
        Some(&self.version)
    }

    fn version_stamp_mut(&mut self) -> Option<&mut VersionStamp> {
        Some(&mut self.version)
    }

    fn validate(&self) -> Result<(), ComponentError> {
        validate_name("action", &self.name)?;
        require_label("action label", &self.label)?;
        match (self.kind, self.url.is_some()) {
            (ActionKind::MenuItem, false) => Err(ComponentError::InvalidValue {
                field: "action url",
                message: format!("menu item `{}` needs a url", self.name),
            }),
            (ActionKind::Cascading, true) => Err(ComponentError::InvalidValue {
                field: "action url",
                message: format!("cascading action `{}` must not have a url", self.name),
            }),
            _ => Ok(()),
        }
    }

    fn mark_persisted(&mut self) {
        self.base.mark_persisted();
        self.properties.mark_persisted();
        self.menu_contexts.mark_persisted();
        self.visibility.mark_persisted();
    }

    /// Menu contexts are shared references: the copy keeps them as they
    /// are and only drops pending detachments.
    fn reset_children_as_new(&mut self) {
        self.properties.reset_as_new();
        self.visibility.reset_as_new();
        self.menu_contexts.clear_deleted();
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("type", self.kind.as_str());
        element.push_text_child("Name", self.name.as_str());
        element.push_text_child("Label", self.label.as_str());
        if let Some(url) = &self.url {
            element.push_text_child("Url", url.as_str());
        }
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
        element.push_child(self.properties.to_xml());
        element.push_child(self.menu_contexts.to_xml(MENU_CONTEXT_SET_NODE));
        element.push_child(self.visibility.to_xml());
    }

    fn read_content(base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let raw_kind = walker.required_attr("type")?;
        let kind = ActionKind::parse(raw_kind).ok_or_else(|| walker.invalid("type", raw_kind))?;

        let properties = match walker.optional_child(PropertySet::NODE_NAME) {
            Some(child) => PropertySet::from_xml(&child)?,
            None => PropertySet::new(),
        };
        let mut menu_contexts = DependentSet::new();
        if let Some(child) = walker.optional_child(MENU_CONTEXT_SET_NODE) {
            let read = DependentSet::<MenuContext>::from_xml(&child)?;
            for context in read.iter() {
                attach_menu_context(&mut menu_contexts, context.clone())?;
            }
            for gone in read.deleted() {
                menu_contexts.push_deleted(gone.clone());
            }
        }
        let visibility = match walker.optional_child(VisibilityContexts::NODE_NAME) {
            Some(child) => VisibilityContexts::from_xml(&child)?,
            None => VisibilityContexts::new(),
        };

        Ok(Self {
            base,
            version: VersionStamp::default(),
            name: walker.required_text("Name")?.to_string(),
            label: walker.required_text("Label")?.to_string(),
            kind,
            url: walker.optional_text("Url").map(str::to_string),
            description: walker.optional_text("Description").map(str::to_string),
            properties,
            menu_contexts,
            visibility,
        })
    }
}

fn attach_menu_context(
    contexts: &mut DependentSet<MenuContext>,
    context: MenuContext,
) -> Result<(), ComponentError> {
    if !context.key().is_assigned() {
        return Err(ComponentError::KeyNotAssigned(format!(
            "{} `{}`",
            MenuContext::NODE_NAME,
            context.name()
        )));
    }
    if contexts
        .find(|existing| existing.name().eq_ignore_ascii_case(context.name()))
        .is_some()
    {
        return Err(ComponentError::Duplicate {
            kind: "menu context",
            name: context.name().to_string(),
        });
    }
    contexts.add(context)
}

impl VersionableDbComponent for Action {
    fn stamp(&self) -> &VersionStamp {
        &self.version
    }

    fn stamp_mut(&mut self) -> &mut VersionStamp {
        &mut self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, ActionKind, MENU_CONTEXT_SET_NODE};
    use crate::model::component::{ComponentError, DbComponent, DbState};
    use crate::model::menu_context::MenuContext;
    use crate::xml::{XmlElement, XmlError};

    fn menu_item() -> Action {
        let mut action = Action::new("rx_preview", "Preview", ActionKind::MenuItem)
            .expect("valid action");
        action.set_url(Some("../sys_preview".to_string()));
        action
    }

    fn context(id: i64, name: &str) -> MenuContext {
        MenuContext::with_id(id, name, "Label").expect("valid context")
    }

    #[test]
    fn contexts_without_store_id_are_rejected() {
        let mut action = menu_item();
        let unsaved = MenuContext::new("ui_ctx_folder", "Folder").expect("valid context");
        assert!(matches!(
            action.add_menu_context(unsaved),
            Err(ComponentError::KeyNotAssigned(_))
        ));
        assert!(action.menu_contexts().is_empty());

        action
            .add_menu_context(context(3, "ui_ctx_folder"))
            .expect("stored context attaches");
        assert!(matches!(
            action.add_menu_context(context(4, "UI_CTX_FOLDER")),
            Err(ComponentError::Duplicate { .. })
        ));
    }

    #[test]
    fn duplicate_keeps_references_and_drops_pending_detachments() {
        let mut action = menu_item();
        action
            .add_menu_context(context(1, "ui_ctx_item"))
            .expect("attach");
        action
            .add_menu_context(context(2, "ui_ctx_folder"))
            .expect("attach");
        action.base_mut().rekey(["9"]).expect("single-part key");
        action.mark_persisted();
        action.remove_menu_context("ui_ctx_folder").expect("attached");
        assert_eq!(action.menu_contexts().deleted().len(), 1);

        let copy = action.duplicate();
        assert!(copy.menu_contexts().deleted().is_empty());
        let kept = copy.menu_contexts().iter().next().expect("one reference");
        assert_eq!(kept.id(), Some(1));
        assert_eq!(kept.state(), DbState::Unmodified);
        assert!(kept.key().is_persisted());
    }

    #[test]
    fn read_rejects_context_names_differing_only_in_case() {
        let written = menu_item().to_xml();
        let mut contexts = XmlElement::new(MENU_CONTEXT_SET_NODE);
        contexts.push_child(context(1, "ui_ctx_item").to_xml());
        contexts.push_child(context(2, "UI_CTX_ITEM").to_xml());

        let mut element = XmlElement::new(Action::NODE_NAME);
        for (name, value) in written.attributes() {
            element.set_attr(name.as_str(), value.as_str());
        }
        for child in written.children() {
            if child.name() == MENU_CONTEXT_SET_NODE {
                element.push_child(contexts.clone());
            } else {
                element.push_child(child.clone());
            }
        }

        assert!(matches!(
            Action::from_xml(&element),
            Err(XmlError::Component(ComponentError::Duplicate { .. }))
        ));
    }
}
