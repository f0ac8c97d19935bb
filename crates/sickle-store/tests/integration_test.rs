//! Integration tests for sickle-store crate.

use sickle_common::test_utils::create_temp_dir;
use sickle_common::{ChannelId, GuildId};
use sickle_store::{tables, BotChannel, DocumentStore, StoreError};

#[test]
fn test_store_round_trips_through_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("nested").join("db.json");

    {
        let store = DocumentStore::open(&path).unwrap();
        store.set_channel_enabled(ChannelId(11), false).unwrap();
        store.toggle_bot_channel(GuildId(1), ChannelId(12)).unwrap();
        store.set_custom_command(GuildId(1), "rules", "Be nice").unwrap();
    }

    let reopened = DocumentStore::open(&path).unwrap();
    assert!(!reopened.is_channel_enabled(ChannelId(11)).unwrap());
    assert_eq!(reopened.bot_channel(GuildId(1)).unwrap(), Some(ChannelId(12)));
    assert_eq!(
        reopened.custom_commands(GuildId(1)).unwrap().0.get("rules").map(String::as_str),
        Some("Be nice")
    );
}

#[test]
fn test_file_layout_matches_table_document_shape() {
    let dir = create_temp_dir();
    let path = dir.path().join("db.json");
    let store = DocumentStore::open(&path).unwrap();
    store.set_channel_enabled(ChannelId(42), true).unwrap();
    store.table(tables::BOT_CH).upsert(7, &BotChannel { channel: ChannelId(8) }).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["bot_en"]["42"]["chan_en"], serde_json::json!(true));
    assert_eq!(raw["bot_ch"]["7"]["channel"], serde_json::json!(8));
}

#[test]
fn test_rewrite_leaves_no_temp_files() {
    let dir = create_temp_dir();
    let path = dir.path().join("db.json");
    let store = DocumentStore::open(&path).unwrap();
    for i in 0..5 {
        store.set_channel_enabled(ChannelId(i), i % 2 == 0).unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(store.table::<serde_json::Value>(tables::BOT_EN).len(), 5);
}

#[test]
fn test_failed_insert_does_not_touch_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("db.json");
    let store = DocumentStore::open(&path).unwrap();
    let table = store.table::<u32>("numbers");
    table.insert("a", &1).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    assert!(matches!(
        table.insert("a", &2),
        Err(StoreError::DuplicateDocument { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(table.get("a").unwrap(), Some(1));
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = create_temp_dir();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        DocumentStore::open(&path),
        Err(StoreError::Serialization(_))
    ));
}
