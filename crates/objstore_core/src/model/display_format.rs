//! Display formats and their ordered column lists.
//!
//! # Invariants
//! - Column sources are unique within a format, ignoring ASCII case.
//! - Column sequences are contiguous from zero after every mutation.
//! - Category columns always precede non-category columns.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::dependent_set::DependentSet;
use super::key::Key;
use super::names::{require_label, validate_name};
use super::property::PropertySet;
use super::versioned::{VersionStamp, VersionableDbComponent};
use crate::xml::{yes_no, TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

const COLUMN_KEY: &[&str] = &["SOURCE"];
const DISPLAY_FORMAT_KEY: &[&str] = &["DISPLAYID"];

/// How a column value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderType {
    Text,
    Image,
}

impl RenderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// One column of a display format; `source` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayColumn {
    base: ComponentBase,
    source: String,
    display_name: String,
    description: Option<String>,
    sequence: usize,
    render_type: RenderType,
    /// `-1` lets the client size the column.
    width: i32,
    category: bool,
    sort_order: SortOrder,
}

impl DisplayColumn {
    pub fn new(
        source: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, ComponentError> {
        let source = source.into();
        let display_name = display_name.into();
        validate_name("display column", &source)?;
        require_label("display column name", &display_name)?;
        let key = Key::assigned(COLUMN_KEY.iter().copied(), [source.as_str()])?;
        Ok(Self {
            base: ComponentBase::new(key),
            source,
            display_name,
            description: None,
            sequence: 0,
            render_type: RenderType::Text,
            width: -1,
            category: false,
            sort_order: SortOrder::Ascending,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn render_type(&self) -> RenderType {
        self.render_type
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn is_category(&self) -> bool {
        self.category
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), ComponentError> {
        let display_name = display_name.into();
        require_label("display column name", &display_name)?;
        self.display_name = display_name;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }

    pub fn set_render_type(&mut self, render_type: RenderType) {
        self.render_type = render_type;
        self.base.set_modified();
    }

    /// Sets the width; values below `-1` are rejected.
    pub fn set_width(&mut self, width: i32) -> Result<(), ComponentError> {
        if width < -1 {
            return Err(ComponentError::InvalidValue {
                field: "display column width",
                message: format!("{width} is below -1"),
            });
        }
        self.width = width;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
        self.base.set_modified();
    }

    /// Category flag for columns not yet in a `DfColumns`.
    ///
    /// Changing it afterwards would break column ordering, so `DfColumns`
    /// exposes no mutable access to this flag.
    pub fn with_category(mut self, category: bool) -> Self {
        self.category = category;
        self
    }

    fn set_sequence(&mut self, sequence: usize) {
        if self.sequence != sequence {
            self.sequence = sequence;
            self.base.set_modified();
        }
    }
}

impl DbComponent for DisplayColumn {
    const NODE_NAME: &'static str = "PSXDisplayColumn";

    fn key_names() -> &'static [&'static str] {
        COLUMN_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ComponentError> {
        validate_name("display column", &self.source)?;
        require_label("display column name", &self.display_name)?;
        if self.width < -1 {
            return Err(ComponentError::InvalidValue {
                field: "display column width",
                message: format!("{} is below -1", self.width),
            });
        }
        Ok(())
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("source", self.source.as_str());
        element.set_attr("sequence", self.sequence.to_string());
        element.set_attr("renderType", self.render_type.as_str());
        element.set_attr("width", self.width.to_string());
        element.set_attr("category", yes_no(self.category));
        element.set_attr("sortOrder", self.sort_order.as_str());
        element.push_text_child("DisplayName", self.display_name.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
    }

    fn read_content(mut base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let source = walker.required_attr("source")?.to_string();
        base.rekey([source.as_str()])?;

        let render_type = match walker.optional_attr("renderType") {
            None => RenderType::Text,
            Some(raw) => RenderType::parse(raw).ok_or_else(|| walker.invalid("renderType", raw))?,
        };
        let sort_order = match walker.optional_attr("sortOrder") {
            None => SortOrder::Ascending,
            Some(raw) => SortOrder::parse(raw).ok_or_else(|| walker.invalid("sortOrder", raw))?,
        };

        Ok(Self {
            base,
            source,
            display_name: walker.required_text("DisplayName")?.to_string(),
            description: walker.optional_text("Description").map(str::to_string),
            sequence: walker.attr_parsed::<usize>("sequence")?.unwrap_or(0),
            render_type,
            width: walker.attr_parsed::<i32>("width")?.unwrap_or(-1),
            category: walker.attr_flag("category", false)?,
            sort_order,
        })
    }
}

/// Ordered columns of one display format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfColumns {
    columns: DependentSet<DisplayColumn>,
}

impl DfColumns {
    pub const NODE_NAME: &'static str = "PSXDFColumns";

    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column; category columns go after the last category column.
    pub fn add(&mut self, column: DisplayColumn) -> Result<(), ComponentError> {
        let index = if column.category {
            self.category_count()
        } else {
            self.columns.len()
        };
        self.insert_at(index, column)
    }

    /// Inserts a column at `index`.
    ///
    /// # Errors
    /// - `Duplicate` when the source is already present.
    /// - `InvalidValue` when `index` would break the category boundary.
    pub fn insert_at(&mut self, index: usize, column: DisplayColumn) -> Result<(), ComponentError> {
        if self.column(&column.source).is_some() {
            return Err(ComponentError::Duplicate {
                kind: "display column",
                name: column.source,
            });
        }

        let boundary = self.category_count();
        let allowed = if column.category {
            index <= boundary
        } else {
            index >= boundary && index <= self.columns.len()
        };
        if !allowed {
            return Err(ComponentError::InvalidValue {
                field: "display column position",
                message: format!(
                    "index {index} crosses the category boundary at {boundary}"
                ),
            });
        }

        self.columns.insert_at(index, column)?;
        self.resequence();
        Ok(())
    }

    pub fn remove(&mut self, source: &str) -> Option<DisplayColumn> {
        let removed = self
            .columns
            .remove_where(|column| column.source.eq_ignore_ascii_case(source))?;
        self.resequence();
        Some(removed)
    }

    /// Moves a column one slot earlier.
    ///
    /// Returns `Ok(false)` at the top or at the category boundary.
    pub fn move_up(&mut self, source: &str) -> Result<bool, ComponentError> {
        let index = self.index_of(source)?;
        if index == 0 {
            return Ok(false);
        }
        self.swap(index - 1, index)
    }

    /// Moves a column one slot later.
    ///
    /// Returns `Ok(false)` at the bottom or at the category boundary.
    pub fn move_down(&mut self, source: &str) -> Result<bool, ComponentError> {
        let index = self.index_of(source)?;
        if index + 1 >= self.columns.len() {
            return Ok(false);
        }
        self.swap(index, index + 1)
    }

    pub fn column(&self, source: &str) -> Option<&DisplayColumn> {
        self.columns
            .find(|column| column.source.eq_ignore_ascii_case(source))
    }

    /// Mutable column access; the column is marked modified.
    pub fn column_mut(&mut self, source: &str) -> Option<&mut DisplayColumn> {
        self.columns
            .find_mut(|column| column.source.eq_ignore_ascii_case(source))
    }

    pub fn category_columns(&self) -> Vec<&DisplayColumn> {
        self.columns.iter().filter(|column| column.category).collect()
    }

    pub fn is_categorized(&self) -> bool {
        self.category_count() > 0
    }

    pub fn sources(&self) -> Vec<&str> {
        self.columns.iter().map(DisplayColumn::source).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayColumn> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn deleted(&self) -> &[DisplayColumn] {
        self.columns.deleted()
    }

    pub fn is_modified(&self) -> bool {
        self.columns.is_modified()
    }

    pub fn mark_persisted(&mut self) {
        self.columns.mark_persisted();
    }

    pub fn reset_as_new(&mut self) {
        self.columns.reset_as_new();
    }

    pub fn to_xml(&self) -> XmlElement {
        self.columns.to_xml(Self::NODE_NAME)
    }

    /// Reads columns in sequence order.
    ///
    /// # Errors
    /// - Duplicate sources, or a category column after a non-category one.
    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        walker.expect_name(Self::NODE_NAME)?;
        let read = DependentSet::<DisplayColumn>::from_xml(walker)?;

        let mut ordered: Vec<DisplayColumn> = read.iter().cloned().collect();
        ordered.sort_by_key(|column| column.sequence);

        let mut columns = Self::new();
        for column in ordered {
            if column.category && columns.category_count() < columns.len() {
                return Err(ComponentError::InvalidValue {
                    field: "display column position",
                    message: format!(
                        "category column `{}` follows a non-category column",
                        column.source
                    ),
                }
                .into());
            }
            let index = columns.len();
            columns.insert_at(index, column)?;
        }
        for gone in read.deleted() {
            columns.columns.push_deleted(gone.clone());
        }
        Ok(columns)
    }

    fn category_count(&self) -> usize {
        self.columns.iter().take_while(|column| column.category).count()
    }

    fn index_of(&self, source: &str) -> Result<usize, ComponentError> {
        self.columns
            .iter()
            .position(|column| column.source.eq_ignore_ascii_case(source))
            .ok_or_else(|| ComponentError::NotFound {
                kind: "display column",
                name: source.to_string(),
            })
    }

    fn swap(&mut self, upper: usize, lower: usize) -> Result<bool, ComponentError> {
        let items = self.columns.items_mut();
        if items[upper].category != items[lower].category {
            return Ok(false);
        }
        items.swap(upper, lower);
        self.resequence();
        Ok(true)
    }

    fn resequence(&mut self) {
        for (index, column) in self.columns.items_mut().iter_mut().enumerate() {
            column.set_sequence(index);
        }
    }
}

/// A stored display format: the column layout applied to search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFormat {
    base: ComponentBase,
    version: VersionStamp,
    internal_name: String,
    display_name: String,
    description: Option<String>,
    columns: DfColumns,
    properties: PropertySet,
}

impl DisplayFormat {
    pub fn new(
        internal_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, ComponentError> {
        let internal_name = internal_name.into();
        let display_name = display_name.into();
        validate_name("display format", &internal_name)?;
        require_label("display format name", &display_name)?;
        Ok(Self {
            base: ComponentBase::new(Key::new(DISPLAY_FORMAT_KEY.iter().copied())),
            version: VersionStamp::default(),
            internal_name,
            display_name,
            description: None,
            columns: DfColumns::new(),
            properties: PropertySet::new(),
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

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), ComponentError> {
        let display_name = display_name.into();
        require_label("display format name", &display_name)?;
        self.display_name = display_name;
        self.base.set_modified();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }

    pub fn columns(&self) -> &DfColumns {
        &self.columns
    }

    /// Mutable columns; the format is marked modified.
    pub fn columns_mut(&mut self) -> &mut DfColumns {
        self.base.set_modified();
        &mut self.columns
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Mutable properties; the format is marked modified.
    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.base.set_modified();
        &mut self.properties
    }
}

impl DbComponent for DisplayFormat {
    const NODE_NAME: &'static str = "PSXDisplayFormat";
    const GENERATED_KEY: bool = true;

    fn key_names() -> &'static [&'static str] {
        DISPLAY_FORMAT_KEY
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
        validate_name("display format", &self.internal_name)?;
        require_label("display format name", &self.display_name)?;
        if self.columns.is_empty() {
            return Err(ComponentError::InvalidValue {
                field: "display format columns",
                message: "at least one column is required".to_string(),
            });
        }
        for column in self.columns.iter() {
            column.validate()?;
        }
        Ok(())
    }

    fn mark_persisted(&mut self) {
        self.base.mark_persisted();
        self.columns.mark_persisted();
        self.properties.mark_persisted();
    }

    fn reset_children_as_new(&mut self) {
        self.columns.reset_as_new();
        self.properties.reset_as_new();
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.push_text_child("InternalName", self.internal_name.as_str());
        element.push_text_child("DisplayName", self.display_name.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
        element.push_child(self.columns.to_xml());
        element.push_child(self.properties.to_xml());
    }

    fn read_content(base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let columns = DfColumns::from_xml(&walker.required_child(DfColumns::NODE_NAME)?)?;
        let properties = match walker.optional_child(PropertySet::NODE_NAME) {
            Some(child) => PropertySet::from_xml(&child)?,
            None => PropertySet::new(),
        };
        Ok(Self {
            base,
            version: VersionStamp::default(),
            internal_name: walker.required_text("InternalName")?.to_string(),
            display_name: walker.required_text("DisplayName")?.to_string(),
            description: walker.optional_text("Description").map(str::to_string),
            columns,
            properties,
        })
    }
}

impl VersionableDbComponent for DisplayFormat {
    fn stamp(&self) -> &VersionStamp {
        &self.version
    }

    fn stamp_mut(&mut self) -> &mut VersionStamp {
        &mut self.version
    }
}
