use card_scanner_lib::{
    db::Database,
    commands::cards,
    models::{Card, CardField, CardPatch},
    AppState,
    store::{CollectionStore, STORAGE_KEY},
};
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

fn card(id: &str, name: &str) -> Card {
    Card {
        id: id.to_string(),
        name: name.to_string(),
        power: None,
        cost: None,
        attribute: None,
        card_type: None,
        color: None,
        effect_text: None,
        set_code: None,
        rarity: None,
        counter: None,
        life: None,
        tags: None,
        timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap(),
        image_url: None,
    }
}

#[tokio::test]
async fn collection_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");

    let deck_id = {
        let store = CollectionStore::load(Database::new(path.clone()).unwrap()).await;
        store.set_api_key("secret-key").await.unwrap();
        store.add_card(card("a", "Luffy")).await.unwrap();
        store.add_card(card("b", "Zoro")).await.unwrap();
        store.set_scan_interval(5000).await.unwrap();
        store.toggle_auto_scan().await.unwrap();

        let deck = store.create_deck("Straw Hats").await.unwrap();
        store.add_card_to_deck(&deck.id, "a").await.unwrap();
        store.add_card_to_deck(&deck.id, "b").await.unwrap();
        deck.id
    };

    let store = CollectionStore::load(Database::new(path).unwrap()).await;
    let names: Vec<String> = store.cards().await.into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["Zoro", "Luffy"]);
    assert_eq!(store.api_key().await, "secret-key");

    let settings = store.settings().await;
    assert!(settings.auto_scan);
    assert_eq!(settings.scan_interval, 5000);

    let deck = store.deck(&deck_id).await.unwrap();
    assert_eq!(deck.name, "Straw Hats");
    assert_eq!(deck.cards, ["a", "b"]);
}

#[tokio::test]
async fn corrupt_slot_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
    db.write_slot(STORAGE_KEY, "{\"scannedCards\": [".to_string())
        .await
        .unwrap();

    let store = CollectionStore::load(db.clone()).await;
    assert!(store.cards().await.is_empty());
    assert!(store.decks().await.is_empty());
    assert_eq!(store.settings().await.scan_interval, 3000);

    // The store stays usable and overwrites the broken slot on the next mutation.
    store.add_card(card("x", "Nami")).await.unwrap();
    let reloaded = CollectionStore::load(db).await;
    assert_eq!(reloaded.cards().await.len(), 1);
}

#[tokio::test]
async fn partial_snapshot_keeps_known_fields() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
    db.write_slot(STORAGE_KEY, r#"{"apiKey":"k","settings":{"autoScan":true}}"#.to_string())
        .await
        .unwrap();

    let store = CollectionStore::load(db).await;
    assert_eq!(store.api_key().await, "k");
    let settings = store.settings().await;
    assert!(settings.auto_scan);
    assert_eq!(settings.scan_interval, 3000);
}

#[tokio::test]
async fn removing_a_card_cascades_across_decks() {
    let dir = tempdir().unwrap();
    let store = CollectionStore::load(Database::new(dir.path().join("s.sqlite3")).unwrap()).await;

    for (id, name) in [("a", "Luffy"), ("b", "Zoro"), ("c", "Sanji")] {
        store.add_card(card(id, name)).await.unwrap();
    }
    let red = store.create_deck("Red").await.unwrap();
    let green = store.create_deck("Green").await.unwrap();
    for card_id in ["a", "b", "a", "c"] {
        store.add_card_to_deck(&red.id, card_id).await.unwrap();
    }
    for card_id in ["c", "a"] {
        store.add_card_to_deck(&green.id, card_id).await.unwrap();
    }

    assert!(store.remove_card("a").await.unwrap());

    assert_eq!(store.deck(&red.id).await.unwrap().cards, ["b", "c"]);
    assert_eq!(store.deck(&green.id).await.unwrap().cards, ["c"]);
    assert!(store.card("a").await.is_none());
    assert_eq!(store.cards().await.len(), 2);
}

#[tokio::test]
async fn deleting_a_deck_leaves_cards_alone() {
    let dir = tempdir().unwrap();
    let store = CollectionStore::load(Database::new(dir.path().join("s.sqlite3")).unwrap()).await;
    store.add_card(card("a", "Luffy")).await.unwrap();
    let deck = store.create_deck("Red").await.unwrap();
    store.add_card_to_deck(&deck.id, "a").await.unwrap();

    let before = store.cards().await;
    assert!(store.delete_deck(&deck.id).await.unwrap());
    assert_eq!(store.cards().await, before);
    assert!(store.decks().await.is_empty());
}

#[tokio::test]
async fn identifiers_stay_unique_and_edits_keep_them() {
    let dir = tempdir().unwrap();
    let store = CollectionStore::load(Database::new(dir.path().join("s.sqlite3")).unwrap()).await;

    assert!(store.add_card(card("a", "Luffy")).await.unwrap());
    assert!(!store.add_card(card("a", "Impostor")).await.unwrap());
    assert_eq!(store.cards().await.len(), 1);

    let patch = CardPatch {
        name: Some("Monkey D. Luffy".into()),
        power: Some(6000),
        ..Default::default()
    };
    assert!(store.update_card("a", patch.clone()).await.unwrap());
    assert!(!store.update_card("missing", patch).await.unwrap());

    let edited = store.card("a").await.unwrap();
    assert_eq!(edited.name, "Monkey D. Luffy");
    assert_eq!(edited.power, Some(6000));
    assert_eq!(edited.timestamp, card("a", "").timestamp);
}

#[tokio::test]
async fn dangling_deck_entries_are_skipped_when_resolving() {
    let dir = tempdir().unwrap();
    let store = CollectionStore::load(Database::new(dir.path().join("s.sqlite3")).unwrap()).await;
    store.add_card(card("a", "Luffy")).await.unwrap();
    let deck = store.create_deck("Red").await.unwrap();
    store.add_card_to_deck(&deck.id, "ghost").await.unwrap();
    store.add_card_to_deck(&deck.id, "a").await.unwrap();

    let resolved = store.deck_cards(&deck.id).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].name, "Luffy");
    assert!(store.deck_cards("nope").await.is_none());
}

#[tokio::test]
async fn failed_write_leaves_the_collection_untouched() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
    let store = CollectionStore::load(db.clone()).await;
    store.add_card(card("a", "Luffy")).await.unwrap();

    db.execute(|conn| Ok(conn.execute_batch("DROP TABLE kv_slots")?))
        .await
        .unwrap();

    assert!(store.add_card(card("b", "Zoro")).await.is_err());
    assert!(store.toggle_auto_scan().await.is_err());
    assert!(store.create_deck("Straw Hats").await.is_err());

    let ids: Vec<String> = store.cards().await.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, ["a"]);
    assert!(!store.settings().await.auto_scan);
    assert!(store.decks().await.is_empty());
}

#[tokio::test]
async fn edits_can_empty_optional_fields() {
    let dir = tempdir().unwrap();
    let state = AppState::open(dir.path(), None).await.unwrap();
    let mut luffy = card("a", "Luffy");
    luffy.power = Some(5000);
    luffy.life = Some(5);
    luffy.tags = Some(vec!["Straw Hat Crew".into()]);
    state.store.add_card(luffy).await.unwrap();

    let patch = CardPatch {
        cost: Some(3),
        clear: vec![CardField::Power, CardField::Tags],
        ..Default::default()
    };
    let edited = cards::edit_card(&state, "a", patch).await.unwrap();
    assert_eq!(edited.power, None);
    assert_eq!(edited.tags, None);
    assert_eq!(edited.cost, Some(3));
    assert_eq!(edited.life, Some(5));

    let conflicting = CardPatch {
        life: Some(4),
        clear: vec![CardField::Life],
        ..Default::default()
    };
    assert!(cards::edit_card(&state, "a", conflicting).await.is_err());
    assert_eq!(state.store.card("a").await.unwrap().life, Some(5));
}
