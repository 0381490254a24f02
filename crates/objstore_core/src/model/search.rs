//! Searches, views and their criteria fields.
//!
//! # Responsibility
//! - Model one search/view definition with its properties and field
//!   criteria.
//! - Keep a named collection of searches free of case-insensitive name
//!   collisions.
//!
//! # Invariants
//! - Field names are unique within a search, ignoring ASCII case.
//! - Search internal names are unique within a collection, ignoring ASCII case.
//! - Field values always satisfy the arity of the field's operator.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::dependent_set::DependentSet;
use super::key::Key;
use super::names::{require_label, validate_name};
use super::property::PropertySet;
use super::versioned::{VersionStamp, VersionableDbComponent};
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

const SEARCH_FIELD_KEY: &[&str] = &["FIELDNAME"];
const SEARCH_KEY: &[&str] = &["SEARCHID"];
const FIELD_SET_NODE: &str = "PSXSearchFieldSet";

/// Value type of a search field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Number,
    Date,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// Comparison applied between a field and its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Like,
    NotLike,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::LessThan => "lessThan",
            Self::LessThanEqual => "lessThanEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanEqual => "greaterThanEqual",
            Self::Like => "like",
            Self::NotLike => "notLike",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::IsNull => "isNull",
            Self::IsNotNull => "isNotNull",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "equal" => Some(Self::Equal),
            "notEqual" => Some(Self::NotEqual),
            "lessThan" => Some(Self::LessThan),
            "lessThanEqual" => Some(Self::LessThanEqual),
            "greaterThan" => Some(Self::GreaterThan),
            "greaterThanEqual" => Some(Self::GreaterThanEqual),
            "like" => Some(Self::Like),
            "notLike" => Some(Self::NotLike),
            "between" => Some(Self::Between),
            "in" => Some(Self::In),
            "notIn" => Some(Self::NotIn),
            "isNull" => Some(Self::IsNull),
            "isNotNull" => Some(Self::IsNotNull),
            _ => None,
        }
    }

    fn accepts_value_count(self, count: usize) -> bool {
        match self {
            Self::Between => count == 2,
            Self::In | Self::NotIn => count >= 1,
            Self::IsNull | Self::IsNotNull => count == 0,
            _ => count <= 1,
        }
    }
}

/// One criterion of a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchField {
    base: ComponentBase,
    name: String,
    display_name: String,
    field_type: FieldType,
    operator: Operator,
    values: Vec<String>,
    description: Option<String>,
}

impl SearchField {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        field_type: FieldType,
    ) -> Result<Self, ComponentError> {
        let name = name.into();
        let display_name = display_name.into();
        validate_name("search field", &name)?;
        require_label("search field display name", &display_name)?;
        let key = Key::assigned(SEARCH_FIELD_KEY.iter().copied(), [name.as_str()])?;
        Ok(Self {
            base: ComponentBase::new(key),
            name,
            display_name,
            field_type,
            operator: Operator::Equal,
            values: Vec::new(),
            description: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), ComponentError> {
        let display_name = display_name.into();
        require_label("search field display name", &display_name)?;
        self.display_name = display_name;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }

    /// Replaces operator and values together.
    ///
    /// # Errors
    /// - Value count does not fit the operator.
    /// - Non-numeric values on a `Number` field.
    pub fn set_criteria<I, S>(&mut self, operator: Operator, values: I) -> Result<(), ComponentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        check_criteria(self.field_type, operator, &values)?;
        self.operator = operator;
        self.values = values;
        self.base.set_modified();
        Ok(())
    }
}

fn check_criteria(
    field_type: FieldType,
    operator: Operator,
    values: &[String],
) -> Result<(), ComponentError> {
    if !operator.accepts_value_count(values.len()) {
        return Err(ComponentError::InvalidValue {
            field: "search field values",
            message: format!(
                "operator `{}` does not accept {} value(s)",
                operator.as_str(),
                values.len()
            ),
        });
    }
    if field_type == FieldType::Number {
        if let Some(bad) = values.iter().find(|value| value.trim().parse::<f64>().is_err()) {
            return Err(ComponentError::InvalidValue {
                field: "search field values",
                message: format!("`{bad}` is not a number"),
            });
        }
    }
    Ok(())
}

impl DbComponent for SearchField {
    const NODE_NAME: &'static str = "PSXSearchField";

    fn key_names() -> &'static [&'static str] {
        SEARCH_FIELD_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ComponentError> {
        validate_name("search field", &self.name)?;
        require_label("search field display name", &self.display_name)?;
        check_criteria(self.field_type, self.operator, &self.values)
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("name", self.name.as_str());
        element.set_attr("type", self.field_type.as_str());
        element.set_attr("operator", self.operator.as_str());
        element.push_text_child("DisplayName", self.display_name.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
        for value in &self.values {
            element.push_text_child("Value", value.as_str());
        }
    }

    fn read_content(mut base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let name = walker.required_attr("name")?.to_string();
        base.rekey([name.as_str()])?;

        let raw_type = walker.required_attr("type")?;
        let field_type = FieldType::parse(raw_type).ok_or_else(|| walker.invalid("type", raw_type))?;
        let operator = match walker.optional_attr("operator") {
            None => Operator::Equal,
            Some(raw) => Operator::parse(raw).ok_or_else(|| walker.invalid("operator", raw))?,
        };

        Ok(Self {
            base,
            name,
            display_name: walker.required_text("DisplayName")?.to_string(),
            field_type,
            operator,
            values: walker
                .children("Value")
                .map(|value| value.text().to_string())
                .collect(),
            description: walker.optional_text("Description").map(str::to_string),
        })
    }
}

/// Kind of a search definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchKind {
    UserSearch,
    StandardSearch,
    CustomSearch,
    UserView,
    StandardView,
    CustomView,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserSearch => "userSearch",
            Self::StandardSearch => "standardSearch",
            Self::CustomSearch => "customSearch",
            Self::UserView => "userView",
            Self::StandardView => "standardView",
            Self::CustomView => "customView",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "userSearch" => Some(Self::UserSearch),
            "standardSearch" => Some(Self::StandardSearch),
            "customSearch" => Some(Self::CustomSearch),
            "userView" => Some(Self::UserView),
            "standardView" => Some(Self::StandardView),
            "customView" => Some(Self::CustomView),
            _ => None,
        }
    }

    pub fn is_view(self) -> bool {
        matches!(self, Self::UserView | Self::StandardView | Self::CustomView)
    }
}

/// A stored search or view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    base: ComponentBase,
    version: VersionStamp,
    internal_name: String,
    display_name: String,
    description: Option<String>,
    kind: SearchKind,
    display_format_id: Option<i64>,
    properties: PropertySet,
    fields: DependentSet<SearchField>,
}

impl Search {
    pub fn new(
        internal_name: impl Into<String>,
        display_name: impl Into<String>,
        kind: SearchKind,
    ) -> Result<Self, ComponentError> {
        let internal_name = internal_name.into();
        let display_name = display_name.into();
        validate_name("search", &internal_name)?;
        require_label("search display name", &display_name)?;
        Ok(Self {
            base: ComponentBase::new(Key::new(SEARCH_KEY.iter().copied())),
            version: VersionStamp::default(),
            internal_name,
            display_name,
            description: None,
            kind,
            display_format_id: None,
            properties: PropertySet::new(),
            fields: DependentSet::new(),
        })
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn is_view(&self) -> bool {
        self.kind.is_view()
    }

    pub fn display_format_id(&self) -> Option<i64> {
        self.display_format_id
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), ComponentError> {
        let display_name = display_name.into();
        require_label("search display name", &display_name)?;
        self.display_name = display_name;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }

    pub fn set_kind(&mut self, kind: SearchKind) {
        self.kind = kind;
        self.base.set_modified();
    }

    pub fn set_display_format_id(&mut self, display_format_id: Option<i64>) {
        self.display_format_id = display_format_id;
        self.base.set_modified();
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Mutable properties; the search is marked modified.
    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.base.set_modified();
        &mut self.properties
    }

    pub fn fields(&self) -> &DependentSet<SearchField> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Mutable field access; both field and search are marked modified.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut SearchField> {
        let field = self
            .fields
            .find_mut(|field| field.name.eq_ignore_ascii_case(name))?;
        self.base.set_modified();
        Some(field)
    }

    /// Adds a field.
    ///
    /// # Errors
    /// - `Duplicate` when a field with the same name (ignoring case) exists.
    pub fn add_field(&mut self, field: SearchField) -> Result<(), ComponentError> {
        if self.field(&field.name).is_some() {
            return Err(ComponentError::Duplicate {
                kind: "search field",
                name: field.name,
            });
        }
        self.fields.add(field)?;
        self.base.set_modified();
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) -> Option<SearchField> {
        let removed = self
            .fields
            .remove_where(|field| field.name.eq_ignore_ascii_case(name))?;
        self.base.set_modified();
        Some(removed)
    }
}

impl DbComponent for Search {
    const NODE_NAME: &'static str = "PSXSearch";
    const GENERATED_KEY: bool = true;

    fn key_names() -> &'static [&'static str] {
        SEARCH_KEY
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
        validate_name("search", &self.internal_name)?;
        require_label("search display name", &self.display_name)?;
        for field in &self.fields {
            field.validate()?;
        }
        Ok(())
    }

    fn mark_persisted(&mut self) {
        self.base.mark_persisted();
        self.properties.mark_persisted();
        self.fields.mark_persisted();
    }

    fn reset_children_as_new(&mut self) {
        self.properties.reset_as_new();
        self.fields.reset_as_new();
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("type", self.kind.as_str());
        element.push_text_child("InternalName", self.internal_name.as_str());
        element.push_text_child("DisplayName", self.display_name.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
        if let Some(id) = self.display_format_id {
            element.push_text_child("DisplayFormatId", id.to_string());
        }
        element.push_child(self.properties.to_xml());
        element.push_child(self.fields.to_xml(FIELD_SET_NODE));
    }

    fn read_content(base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let raw_kind = walker.required_attr("type")?;
        let kind = SearchKind::parse(raw_kind).ok_or_else(|| walker.invalid("type", raw_kind))?;

        let properties = match walker.optional_child(PropertySet::NODE_NAME) {
            Some(child) => PropertySet::from_xml(&child)?,
            None => PropertySet::new(),
        };

        let mut search = Self {
            base,
            version: VersionStamp::default(),
            internal_name: walker.required_text("InternalName")?.to_string(),
            display_name: walker.required_text("DisplayName")?.to_string(),
            description: walker.optional_text("Description").map(str::to_string),
            kind,
            display_format_id: walker.text_parsed::<i64>("DisplayFormatId")?,
            properties,
            fields: DependentSet::new(),
        };

        if let Some(child) = walker.optional_child(FIELD_SET_NODE) {
            let fields = DependentSet::<SearchField>::from_xml(&child)?;
            for field in fields.iter() {
                if search.field(&field.name).is_some() {
                    return Err(ComponentError::Duplicate {
                        kind: "search field",
                        name: field.name.clone(),
                    }
                    .into());
                }
                search.fields.add(field.clone())?;
            }
            for gone in fields.deleted() {
                search.fields.push_deleted(gone.clone());
            }
        }

        Ok(search)
    }
}

impl VersionableDbComponent for Search {
    fn stamp(&self) -> &VersionStamp {
        &self.version
    }

    fn stamp_mut(&mut self) -> &mut VersionStamp {
        &mut self.version
    }
}

/// Named searches and views with case-insensitive name uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCollection {
    searches: DependentSet<Search>,
}

impl SearchCollection {
    pub const NODE_NAME: &'static str = "PSXSearchCollection";

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a search.
    ///
    /// # Errors
    /// - `Duplicate` when the internal name collides, ignoring ASCII case.
    pub fn add(&mut self, search: Search) -> Result<(), ComponentError> {
        if self.find(&search.internal_name).is_some() {
            return Err(ComponentError::Duplicate {
                kind: "search",
                name: search.internal_name,
            });
        }
        self.searches.add(search)
    }

    pub fn find(&self, name: &str) -> Option<&Search> {
        self.searches
            .find(|search| search.internal_name.eq_ignore_ascii_case(name))
    }

    /// Mutable lookup by name; the search is marked modified.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Search> {
        self.searches
            .find_mut(|search| search.internal_name.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Search> {
        self.searches
            .remove_where(|search| search.internal_name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.searches.iter().map(Search::internal_name).collect()
    }

    pub fn views(&self) -> Vec<&Search> {
        self.searches.iter().filter(|search| search.is_view()).collect()
    }

    pub fn searches(&self) -> Vec<&Search> {
        self.searches
            .iter()
            .filter(|search| !search.is_view())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Search> {
        self.searches.iter()
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    pub fn deleted(&self) -> &[Search] {
        self.searches.deleted()
    }

    pub fn mark_persisted(&mut self) {
        self.searches.mark_persisted();
    }

    pub fn to_xml(&self) -> XmlElement {
        self.searches.to_xml(Self::NODE_NAME)
    }

    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        walker.expect_name(Self::NODE_NAME)?;
        let read = DependentSet::<Search>::from_xml(walker)?;
        let mut collection = Self::new();
        for search in read.iter() {
            collection.add(search.clone())?;
        }
        for gone in read.deleted() {
            collection.searches.push_deleted(gone.clone());
        }
        Ok(collection)
    }
}
