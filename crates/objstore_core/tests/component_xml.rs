use objstore_core::{
    Action, ActionKind, ComponentError, DbComponent, DbState, DisplayColumn, DisplayFormat,
    FieldType, MenuContext, Operator, Search, SearchField, SearchKind, VersionableDbComponent,
    XmlElement, XmlError, XmlFormat,
};

fn sample_search() -> Search {
    let mut search = Search::new("rx_content_by_title", "Content by title", SearchKind::StandardSearch)
        .unwrap();
    search.set_description(Some("Finds items <by> title & type".to_string()));
    search.set_display_format_id(Some(3));
    search.properties_mut().set("maxRows", "100").unwrap();

    let mut title = SearchField::new("sys_title", "Title", FieldType::Text).unwrap();
    title.set_criteria(Operator::Like, ["%news%"]).unwrap();
    search.add_field(title).unwrap();

    let mut type_id = SearchField::new("sys_contenttypeid", "Type", FieldType::Number).unwrap();
    type_id.set_criteria(Operator::In, ["301", "302"]).unwrap();
    search.add_field(type_id).unwrap();
    search
}

fn sample_display_format() -> DisplayFormat {
    let mut format = DisplayFormat::new("rx_default", "Default").unwrap();
    let columns = format.columns_mut();
    columns
        .add(DisplayColumn::new("sys_title", "Title").unwrap())
        .unwrap();
    columns
        .add(DisplayColumn::new("sys_contenttypeid", "Type").unwrap().with_category(true))
        .unwrap();
    format
}

#[test]
fn search_round_trips_through_xml_text() {
    let search = sample_search();
    let xml = search.to_xml_string(&XmlFormat::default()).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("&lt;by&gt;"));

    let parsed = Search::from_xml_str(&xml).unwrap();
    assert_eq!(parsed, search);
    assert_eq!(parsed.description(), Some("Finds items <by> title & type"));
    assert_eq!(parsed.display_format_id(), Some(3));
    assert_eq!(parsed.properties().get("MAXROWS"), Some("100"));

    let type_field = parsed.field("SYS_CONTENTTYPEID").unwrap();
    assert_eq!(type_field.operator(), Operator::In);
    assert_eq!(type_field.values(), ["301", "302"]);
}

#[test]
fn state_and_version_travel_in_attributes() {
    let mut search = sample_search();
    search.base_mut().rekey(["41"]).unwrap();
    search.mark_persisted();
    search.set_version(7).unwrap();
    search.set_kind(SearchKind::UserView);

    let element = search.to_xml();
    assert_eq!(element.attr("version"), Some("7"));
    assert_eq!(element.attr("state"), Some("modified"));
    assert_eq!(element.attr("type"), Some("userView"));

    let parsed = Search::from_xml(&element).unwrap();
    assert_eq!(parsed.version(), Some(7));
    assert_eq!(parsed.state(), DbState::Modified);
    assert!(parsed.is_view());
}

#[test]
fn version_is_not_part_of_equality() {
    let mut first = sample_search();
    let second = first.clone();
    first.set_version(4).unwrap();
    assert_eq!(first, second);
    assert!(matches!(
        first.set_version(5),
        Err(ComponentError::VersionAlreadySet(4))
    ));
    first.clear_version();
    first.set_version(5).unwrap();
    assert_eq!(first.version(), Some(5));
}

#[test]
fn duplicate_drops_generated_key_and_version() {
    let mut format = sample_display_format();
    format.base_mut().rekey(["12"]).unwrap();
    format.mark_persisted();
    format.set_version(2).unwrap();

    let copy = format.duplicate();
    assert_eq!(copy.state(), DbState::New);
    assert!(!copy.key().is_assigned());
    assert_eq!(copy.version(), None);
    assert!(copy.columns().iter().all(|column| column.state() == DbState::New));
    assert_eq!(copy.columns().sources(), format.columns().sources());
}

#[test]
fn display_format_keeps_category_columns_first() {
    let format = sample_display_format();
    assert_eq!(
        format.columns().sources(),
        ["sys_contenttypeid", "sys_title"]
    );

    let parsed = DisplayFormat::from_xml_str(&format.to_xml_string(&XmlFormat::compact()).unwrap())
        .unwrap();
    assert!(parsed.columns().is_categorized());
    assert_eq!(parsed.columns().column("sys_title").unwrap().sequence(), 1);
}

#[test]
fn display_format_without_columns_is_rejected() {
    let empty = DisplayFormat::new("rx_empty", "Empty").unwrap();
    let xml = empty.to_xml_string(&XmlFormat::compact()).unwrap();
    assert!(matches!(
        DisplayFormat::from_xml_str(&xml),
        Err(XmlError::Component(ComponentError::InvalidValue { .. }))
    ));
}

#[test]
fn action_round_trip_keeps_contexts_and_visibility() {
    let mut action = Action::new("rx_edit", "Edit", ActionKind::MenuItem).unwrap();
    action.set_url(Some("../sys_cxSupport/edit.html".to_string()));
    action
        .add_menu_context(MenuContext::with_id(4, "ui_ctx_item", "Item").unwrap())
        .unwrap();
    action.visibility_mut().add("ContentType", "311").unwrap();

    let parsed = Action::from_xml_str(&action.to_xml_string(&XmlFormat::default()).unwrap())
        .unwrap();
    assert_eq!(parsed, action);
    assert_eq!(parsed.menu_contexts().iter().next().unwrap().id(), Some(4));
    assert!(!parsed.is_visible_in("ContentType", "311"));
    assert!(parsed.is_visible_in("ContentType", "312"));
}

#[test]
fn action_url_rules_are_checked_on_read() {
    let mut action = Action::new("rx_more", "More", ActionKind::Cascading).unwrap();
    assert!(action.validate().is_ok());

    action.set_kind(ActionKind::MenuItem);
    let xml = action.to_xml_string(&XmlFormat::compact()).unwrap();
    assert!(matches!(
        Action::from_xml_str(&xml),
        Err(XmlError::Component(ComponentError::InvalidValue { field: "action url", .. }))
    ));
}

#[test]
fn wrong_root_and_broken_keys_are_reported() {
    let element = XmlElement::new("PSXAction");
    assert!(matches!(
        Search::from_xml(&element),
        Err(XmlError::UnexpectedElement { .. })
    ));

    let mut search = sample_search().to_xml();
    search.set_attr("state", "gone");
    assert!(Search::from_xml(&search).is_err());

    let malformed = "<PSXSearch state=\"new\" type=\"userSearch\"><InternalName>a</InternalName>";
    assert!(matches!(
        Search::from_xml_str(malformed),
        Err(XmlError::Parse { .. })
    ));
}

#[test]
fn number_fields_reject_text_criteria() {
    let mut field = SearchField::new("sys_contentid", "Id", FieldType::Number).unwrap();
    assert!(field.set_criteria(Operator::Equal, ["abc"]).is_err());
    assert!(field.set_criteria(Operator::Between, ["1"]).is_err());
    assert!(field.set_criteria(Operator::IsNull, ["1"]).is_err());
    assert!(field.set_criteria(Operator::IsNotNull, ["1"]).is_err());
    assert!(field.set_criteria(Operator::In, Vec::<String>::new()).is_err());
    assert!(field.set_criteria(Operator::NotIn, Vec::<String>::new()).is_err());
    field.set_criteria(Operator::IsNotNull, Vec::<String>::new()).unwrap();
    assert!(field.values().is_empty());
    field.set_criteria(Operator::Between, ["1", "10"]).unwrap();
    assert_eq!(field.values(), ["1", "10"]);
}
