//! End-to-end scenarios driving the public surface the way a hosting
//! application would.

use taxonomic_core::{Error, ItemSeed, Subject, TagDraft, Taxonomic};

const SEED_JSON: &str = r#"[
    { "name": "widget", "content": "a widget", "description": "small round part", "tags": ["round", "metal"] },
    { "name": "gadget", "content": "a gadget", "description": "clever contraption", "tags": ["metal"] },
    { "name": "gizmo",  "content": "a gizmo",  "description": "mystery device", "tags": [] }
]"#;

fn fresh_store() -> Taxonomic {
    let mut tax = Taxonomic::new();
    tax.seed_users(&["Finn", "Jake", "Marcelene", "Fiona"]);
    let finn = tax.user_by_name("Finn").unwrap();
    tax.login(finn.id).unwrap();
    tax.load_items(taxonomic_core::parse_item_seeds(SEED_JSON).unwrap())
        .unwrap();
    tax
}

#[test]
fn tag_creation_is_gated_on_login() {
    let mut tax = Taxonomic::new();
    tax.seed_users(&["Finn"]);
    assert!(matches!(
        tax.create_tag(TagDraft::named("test")),
        Err(Error::NotAuthenticated)
    ));

    let finn = tax.user_by_name("Finn").unwrap();
    tax.login(finn.id).unwrap();
    assert!(tax.create_tag(TagDraft::named("test")).is_ok());
}

#[test]
fn tag_lifecycle_end_to_end() {
    let mut tax = Taxonomic::new();
    let u1 = tax.add_user("U1");
    tax.login(u1.id).unwrap();

    let item = tax.add_item("widget", "", "small round part");
    let red = tax.create_tag(TagDraft::named("red")).unwrap();

    tax.attach_tag(red.id, item.id).unwrap();
    assert!(tax.attached(red.id, item.id).unwrap());

    // Closing is illegal while the item carries the tag.
    assert!(matches!(tax.close_tag(red.id), Err(Error::TagHasItems(_))));

    tax.detach_tag(red.id, item.id).unwrap();
    assert!(!tax.close_tag(red.id).unwrap().open);

    assert!(tax.reopen_tag(red.id).unwrap().open);
    assert!(matches!(tax.reopen_tag(red.id), Err(Error::AlreadyOpen(_))));
}

#[test]
fn seeded_catalog_is_searchable_by_field() {
    let tax = fresh_store();

    let by_name = tax.search_items("wid");
    assert_eq!(by_name[0].field, "name");
    assert_eq!(by_name[0].record.name, "widget");

    let by_description = tax.search_items("contraption");
    assert_eq!(by_description[0].field, "description");
    assert_eq!(by_description[0].record.name, "gadget");
}

#[test]
fn searching_items_through_their_tags() {
    let tax = fresh_store();
    let matches = tax.search_items_by_tag("met");

    let names: Vec<&str> = matches.iter().map(|m| m.item.name.as_str()).collect();
    assert_eq!(names, vec!["widget", "gadget"]);
    assert!(matches.iter().all(|m| m.tag.name == "metal"));
}

#[test]
fn mapping_a_set_of_tags_merges_their_items() {
    let mut tax = fresh_store();
    let round = tax.tag_by_name("round").unwrap();
    let metal = tax.tag_by_name("metal").unwrap();

    let alloy = tax
        .map_tags(&[round.id, metal.id], TagDraft::named("alloy"))
        .unwrap();

    let moved: Vec<String> = tax
        .items_for_tags(&[alloy.id])
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(moved, vec!["widget", "gadget"]);
    assert!(tax.items_for_tags(&[round.id]).is_empty());
    assert!(tax.items_for_tags(&[metal.id]).is_empty());

    // Both sources now carry a mapping event.
    assert!(tax
        .tag_history(round.id)
        .iter()
        .any(|e| e.payload == "Mapped round to alloy"));
    assert!(tax
        .tag_history(metal.id)
        .iter()
        .any(|e| e.payload == "Mapped metal to alloy"));
}

#[test]
fn cotags_surface_related_tags_once_per_shared_item() {
    let mut tax = fresh_store();
    let widget = tax.items()[0].clone();
    let tags_on_widget = tax.tags_for_item(widget.id).len();

    let test = tax.create_tag(TagDraft::named("test")).unwrap();
    tax.attach_tag(test.id, widget.id).unwrap();

    let cotags = tax.cotags(test.id).unwrap();
    assert_eq!(cotags.len(), tags_on_widget);
    assert!(cotags.values().all(|cotag| cotag.count == 1));
}

#[test]
fn ownership_transfer_between_users() {
    let mut tax = fresh_store();
    let finn = tax.user_by_name("Finn").unwrap();
    let jake = tax.user_by_name("Jake").unwrap();
    let tag = tax.create_tag(TagDraft::named("music")).unwrap();

    tax.become_tag_owner(jake.id, tag.id).unwrap();
    assert_eq!(tax.users_for_tags(&[tag.id]).len(), 2);

    tax.disown_tag(finn.id, tag.id).unwrap();
    let owners = tax.users_for_tags(&[tag.id]);
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, jake.id);

    // Edit rights moved with the ownership.
    assert!(!tax.can_edit_tag(tag.id));
    tax.login(jake.id).unwrap();
    assert!(tax.can_edit_tag(tag.id));
}

#[test]
fn owners_of_an_item_follow_its_tags() {
    let mut tax = fresh_store();
    let jake = tax.user_by_name("Jake").unwrap();
    let widget = tax.items()[0].clone();
    let metal = tax.tag_by_name("metal").unwrap();
    tax.set_owners_by_names(metal.id, &["Jake"]).unwrap();

    let owners = tax.users_for_item(widget.id);
    assert!(owners.iter().any(|owner| owner.id == jake.id));
}

#[test]
fn persistence_round_trip_preserves_behavior() {
    let mut tax = fresh_store();
    let tag = tax.create_tag(TagDraft::named("archival")).unwrap();

    let mut revived = Taxonomic::new();
    revived.restore(tax.snapshot());

    // The revived store keeps enforcing the same rules.
    assert!(matches!(
        revived.create_tag(TagDraft::named("archival")),
        Err(Error::DuplicateTagName(_))
    ));
    assert_eq!(revived.tag_history(tag.id).len(), 2);
    let item = revived.items()[0].clone();
    revived.attach_tag(tag.id, item.id).unwrap();
    assert!(revived.attached(tag.id, item.id).unwrap());
}

#[test]
fn reloading_seeds_replaces_items_but_keeps_users_and_events() {
    let mut tax = fresh_store();
    let finn = tax.user_by_name("Finn").unwrap();
    let users_before = tax.users().len();
    let finn_events = tax.history_of(Subject::User(finn.id)).len();

    let seeds = vec![ItemSeed {
        name: "replacement".to_string(),
        tags: vec!["round".to_string()],
        ..ItemSeed::default()
    }];
    tax.load_items(seeds).unwrap();

    assert_eq!(tax.items().len(), 1);
    assert_eq!(tax.users().len(), users_before);
    assert_eq!(tax.history_of(Subject::User(finn.id)).len(), finn_events);

    let round = tax.tag_by_name("round").unwrap();
    assert_eq!(tax.items_for_tags(&[round.id]).len(), 1);
}

#[test]
fn full_update_cycle_is_audited() {
    let mut tax = fresh_store();
    let mut widget = tax.items()[0].clone();
    widget.description = "small square part".to_string();
    tax.update_item(&widget).unwrap();

    let mut metal = tax.tag_by_name("metal").unwrap();
    metal.description = "anything metallic".to_string();
    tax.update_tag(&metal).unwrap();

    assert!(tax
        .history_of(Subject::Item(widget.id))
        .iter()
        .any(|e| e.payload == "Updated widget"));
    assert!(tax
        .tag_history(metal.id)
        .iter()
        .any(|e| e.payload == "Updated tag metal"));

    // Audit entries carry the acting user.
    let last = tax.events().pop().unwrap();
    assert_eq!(last.creator.unwrap().name, "Finn");
}
