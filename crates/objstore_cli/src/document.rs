//! Root-node dispatch for component documents read from disk.

use objstore_core::{
    Action, DbComponent, DisplayFormat, MenuContext, Search, SearchCollection, TreeWalker,
    XmlElement, XmlError, XmlResult,
};
use serde::Serialize;

/// Any top-level document the CLI understands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Document {
    Search(Search),
    Searches(SearchCollection),
    DisplayFormat(DisplayFormat),
    Action(Action),
    MenuContext(MenuContext),
}

impl Document {
    /// Parses `element` with the component type named by its root node.
    pub fn read(element: &XmlElement) -> XmlResult<Self> {
        match element.name() {
            name if name == Search::NODE_NAME => Search::from_xml(element).map(Self::Search),
            name if name == SearchCollection::NODE_NAME => {
                SearchCollection::from_xml(&TreeWalker::new(element)).map(Self::Searches)
            }
            name if name == DisplayFormat::NODE_NAME => {
                DisplayFormat::from_xml(element).map(Self::DisplayFormat)
            }
            name if name == Action::NODE_NAME => Action::from_xml(element).map(Self::Action),
            name if name == MenuContext::NODE_NAME => {
                MenuContext::from_xml(element).map(Self::MenuContext)
            }
            other => Err(XmlError::UnexpectedElement {
                expected: SUPPORTED_ROOTS.join("|"),
                found: other.to_string(),
            }),
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        match self {
            Self::Search(search) => search.to_xml(),
            Self::Searches(collection) => collection.to_xml(),
            Self::DisplayFormat(format) => format.to_xml(),
            Self::Action(action) => action.to_xml(),
            Self::MenuContext(context) => context.to_xml(),
        }
    }

    /// One `key=value` line per fact worth showing.
    pub fn summary(&self) -> Vec<String> {
        match self {
            Self::Search(search) => search_summary(search),
            Self::Searches(collection) => {
                let mut lines = vec![
                    format!("component={}", SearchCollection::NODE_NAME),
                    format!("searches={}", collection.searches().len()),
                    format!("views={}", collection.views().len()),
                ];
                for search in collection.iter() {
                    lines.push(format!(
                        "entry={} type={}",
                        search.internal_name(),
                        search.kind().as_str()
                    ));
                }
                lines
            }
            Self::DisplayFormat(format) => {
                let mut lines = header(format);
                lines.push(format!("name={}", format.internal_name()));
                lines.push(format!("columns={}", format.columns().sources().join(",")));
                lines.push(format!("categorized={}", format.columns().is_categorized()));
                lines
            }
            Self::Action(action) => {
                let mut lines = header(action);
                lines.push(format!("name={}", action.name()));
                lines.push(format!("type={}", action.kind().as_str()));
                lines.push(format!("menu_contexts={}", action.menu_contexts().len()));
                lines.push(format!(
                    "visibility_contexts={}",
                    action.visibility().contexts().join(",")
                ));
                lines
            }
            Self::MenuContext(context) => {
                let mut lines = header(context);
                lines.push(format!("name={}", context.name()));
                lines.push(format!("label={}", context.label()));
                lines
            }
        }
    }
}

const SUPPORTED_ROOTS: &[&str] = &[
    "PSXSearch",
    "PSXSearchCollection",
    "PSXDisplayFormat",
    "PSXAction",
    "PSXMenuContext",
];

fn header<T: DbComponent>(component: &T) -> Vec<String> {
    let version = component
        .version_stamp()
        .and_then(|stamp| stamp.get())
        .map_or_else(|| "none".to_string(), |version| version.to_string());
    vec![
        format!("component={}", T::NODE_NAME),
        format!("key={}", component.key()),
        format!("state={}", component.state().as_str()),
        format!("version={version}"),
    ]
}

fn search_summary(search: &Search) -> Vec<String> {
    let mut lines = header(search);
    lines.push(format!("name={}", search.internal_name()));
    lines.push(format!("type={}", search.kind().as_str()));
    lines.push(format!("properties={}", search.properties().names().join(",")));
    for field in search.fields() {
        lines.push(format!(
            "field={} operator={} values={}",
            field.name(),
            field.operator().as_str(),
            field.values().join("|")
        ));
    }
    lines
}
