use objstore_core::{
    Action, ActionKind, ComponentError, ComponentRepository, DbComponent, DbState, FieldType,
    InMemoryComponentRepository, Key, MenuContext, ObjectStore, Property, RepoError, Search,
    SearchField, SearchKind, VersionableDbComponent,
};

fn new_search(name: &str) -> Search {
    let mut search = Search::new(name, "Recent items", SearchKind::UserSearch).unwrap();
    search
        .add_field(SearchField::new("sys_title", "Title", FieldType::Text).unwrap())
        .unwrap();
    search
}

#[test]
fn first_save_assigns_key_and_version_zero() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut first = new_search("rx_recent");
    let mut second = new_search("rx_recent_docs");

    store.save(&mut first).unwrap();
    store.save(&mut second).unwrap();

    assert_eq!(first.key().numeric_value(), Some(1));
    assert_eq!(second.key().numeric_value(), Some(2));
    assert!(first.key().is_persisted());
    assert_eq!(first.version(), Some(0));
    assert_eq!(first.state(), DbState::Unmodified);
    assert!(first
        .fields()
        .iter()
        .all(|field| field.state() == DbState::Unmodified));
}

#[test]
fn load_returns_stored_component_and_version() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut search = new_search("rx_recent");
    store.save(&mut search).unwrap();

    let mut loaded: Search = store.load(search.key()).unwrap().unwrap();
    assert_eq!(loaded, search);
    assert_eq!(loaded.version(), Some(0));
    assert_eq!(loaded.state(), DbState::Unmodified);

    loaded.set_description(Some("updated".to_string()));
    store.save(&mut loaded).unwrap();
    assert_eq!(loaded.version(), Some(1));

    let reloaded: Search = store.load(search.key()).unwrap().unwrap();
    assert_eq!(reloaded.description(), Some("updated"));
    assert_eq!(reloaded.version(), Some(1));
}

#[test]
fn stale_update_fails_and_leaves_component_untouched() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut search = new_search("rx_recent");
    store.save(&mut search).unwrap();

    let mut first: Search = store.load(search.key()).unwrap().unwrap();
    let mut second: Search = store.load(search.key()).unwrap().unwrap();

    first.set_description(Some("first".to_string()));
    store.save(&mut first).unwrap();

    second.set_description(Some("second".to_string()));
    let err = store.save(&mut second).unwrap_err();
    assert!(matches!(
        err,
        RepoError::VersionConflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));
    assert_eq!(second.state(), DbState::Modified);
    assert_eq!(second.version(), Some(0));
}

#[test]
fn update_without_version_is_rejected() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut search = new_search("rx_recent");
    store.save(&mut search).unwrap();

    search.clear_version();
    search.set_description(Some("lost version".to_string()));
    assert!(matches!(
        store.save(&mut search),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn unmodified_components_are_not_written() {
    let repo = InMemoryComponentRepository::new();
    let store = ObjectStore::new(&repo);
    let mut search = new_search("rx_recent");
    store.save(&mut search).unwrap();
    store.save(&mut search).unwrap();

    let record = repo.get(Search::NODE_NAME, search.key()).unwrap().unwrap();
    assert_eq!(record.version, 0);
}

#[test]
fn invalid_components_are_not_stored() {
    let repo = InMemoryComponentRepository::new();
    let store = ObjectStore::new(&repo);
    let mut action = Action::new("rx_edit", "Edit", ActionKind::MenuItem).unwrap();

    assert!(matches!(
        store.save(&mut action),
        Err(RepoError::Component(ComponentError::InvalidValue { .. }))
    ));
    assert_eq!(action.state(), DbState::New);
    assert!(!action.key().is_assigned());
    assert!(repo.is_empty().unwrap());
}

#[test]
fn natural_keys_must_be_assigned_before_insert() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut property = Property::new("maxRows", "100").unwrap();
    store.save(&mut property).unwrap();
    assert_eq!(property.key().value("PROPERTYNAME"), Some("maxRows"));

    let mut again = Property::new("maxRows", "200").unwrap();
    assert!(matches!(
        store.save(&mut again),
        Err(RepoError::KeyConflict { .. })
    ));
}

#[test]
fn marked_for_delete_removes_the_record() {
    let repo = InMemoryComponentRepository::new();
    let store = ObjectStore::new(&repo);
    let mut context = MenuContext::new("ui_ctx_folder", "Folder").unwrap();
    store.save(&mut context).unwrap();
    let key = context.key().clone();

    context.mark_for_delete();
    store.save(&mut context).unwrap();
    assert!(!context.key().is_persisted());
    assert!(store.load::<MenuContext>(&key).unwrap().is_none());

    assert!(matches!(
        store.delete::<MenuContext>(&key),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn list_returns_components_of_one_type_in_insert_order() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    for name in ["rx_a", "rx_b", "rx_c"] {
        store.save(&mut new_search(name)).unwrap();
    }
    store
        .save(&mut MenuContext::new("ui_ctx_item", "Item").unwrap())
        .unwrap();

    let searches: Vec<Search> = store.list().unwrap();
    let names: Vec<&str> = searches.iter().map(Search::internal_name).collect();
    assert_eq!(names, ["rx_a", "rx_b", "rx_c"]);
    assert_eq!(store.list::<MenuContext>().unwrap().len(), 1);
}

#[test]
fn duplicate_saves_as_a_separate_record() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut original = new_search("rx_recent");
    store.save(&mut original).unwrap();

    let mut copy = original.duplicate();
    assert!(!copy.key().is_assigned());
    store.save(&mut copy).unwrap();

    assert_ne!(copy.key(), original.key());
    assert_eq!(store.list::<Search>().unwrap().len(), 2);
}

#[test]
fn loading_a_missing_key_returns_none() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let key = Key::assigned(Search::key_names().iter().copied(), ["99"]).unwrap();
    assert!(store.load::<Search>(&key).unwrap().is_none());
}

#[test]
fn saved_actions_reference_stored_menu_contexts() {
    let store = ObjectStore::new(InMemoryComponentRepository::new());
    let mut context = MenuContext::new("ui_ctx_item", "Item").unwrap();
    store.save(&mut context).unwrap();

    let mut action = Action::new("rx_edit", "Edit", ActionKind::MenuItem).unwrap();
    action.set_url(Some("../sys_cxSupport/edit.html".to_string()));
    assert!(matches!(
        action.add_menu_context(MenuContext::new("ui_ctx_folder", "Folder").unwrap()),
        Err(ComponentError::KeyNotAssigned(_))
    ));
    action.add_menu_context(context.clone()).unwrap();
    store.save(&mut action).unwrap();

    let loaded: Action = store.load(action.key()).unwrap().unwrap();
    let reference = loaded.menu_contexts().iter().next().unwrap();
    assert_eq!(reference.id(), context.id());
    assert!(reference.key().is_persisted());
    let target: MenuContext = store.load(reference.key()).unwrap().unwrap();
    assert_eq!(target.name(), "ui_ctx_item");
}
