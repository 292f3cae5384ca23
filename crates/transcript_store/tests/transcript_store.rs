use serde_json::json;
use tempfile::TempDir;
use transcript_store::{Role, TranscriptStore, TurnMetadata};

fn open_temp_store() -> (TempDir, TranscriptStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store =
        TranscriptStore::open(&dir.path().join("history.db")).expect("store should open");
    (dir, store)
}

fn seeded_conversation(store: &mut TranscriptStore, turns: &[(Role, &str)]) -> i64 {
    let conversation_id = store.create("sonar").expect("conversation should be created");
    for (role, content) in turns {
        store
            .append(conversation_id, *role, content, None)
            .expect("turn should append");
    }
    conversation_id
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let nested = dir.path().join("deep").join("nested").join("history.db");

    let store = TranscriptStore::open(&nested).expect("store should open");
    assert_eq!(store.path(), Some(nested.as_path()));
}

#[test]
fn read_back_reproduces_turns_in_commit_order() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(
        &mut store,
        &[
            (Role::System, "be concise"),
            (Role::User, "hello"),
            (Role::Assistant, "hi there"),
        ],
    );

    let conversation = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");

    let contents: Vec<&str> = conversation
        .turns
        .iter()
        .map(|turn| turn.content.as_str())
        .collect();
    assert_eq!(contents, vec!["be concise", "hello", "hi there"]);
    assert_eq!(conversation.turns[0].role, Role::System);
    assert_eq!(conversation.turns[2].role, Role::Assistant);
}

#[test]
fn delete_last_removes_exactly_one_turn_per_call() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(
        &mut store,
        &[
            (Role::User, "first"),
            (Role::User, "second"),
            (Role::User, "third"),
        ],
    );

    assert!(store.delete_last(conversation_id).expect("rollback should run"));
    assert!(store.delete_last(conversation_id).expect("rollback should run"));

    let conversation = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert_eq!(conversation.turns.len(), 1);
    assert_eq!(conversation.turns[0].content, "first");
}

#[test]
fn delete_last_on_empty_conversation_reports_nothing_removed() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(&mut store, &[]);

    assert!(!store
        .delete_last(conversation_id)
        .expect("rollback should run"));
}

#[test]
fn accumulate_cost_is_independent_of_append() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(&mut store, &[(Role::System, "prompt")]);

    let before = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert!((before.total_cost - 0.0).abs() < f64::EPSILON);
    assert_eq!(before.total_tokens, 0);

    store
        .accumulate_cost(conversation_id, 0.004, 120)
        .expect("totals should update");
    store
        .accumulate_cost(conversation_id, 0.001, 30)
        .expect("totals should update");

    let after = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert!((after.total_cost - 0.005).abs() < 1e-12);
    assert_eq!(after.total_tokens, 150);
}

#[test]
fn assistant_metadata_round_trips_usage_and_cost() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = store.create("sonar-pro").expect("conversation should be created");

    let metadata = TurnMetadata::new(
        vec!["https://example.test/source".to_string()],
        json!({"prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46}),
        json!({"input_tokens_cost": 0.001, "total_cost": 0.006}),
    );
    store
        .append(conversation_id, Role::Assistant, "answer", Some(&metadata))
        .expect("turn should append");

    let conversation = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    let stored = conversation.turns[0]
        .metadata
        .as_ref()
        .expect("assistant turn should carry metadata");
    assert_eq!(*stored, metadata);
}

#[test]
fn turns_without_metadata_read_back_as_none() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(&mut store, &[(Role::User, "plain")]);

    let conversation = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert!(conversation.turns[0].metadata.is_none());
}

#[test]
fn list_orders_by_recent_update_and_counts_turns() {
    let (_dir, mut store) = open_temp_store();
    let first = seeded_conversation(&mut store, &[(Role::User, "a")]);
    let second = seeded_conversation(&mut store, &[(Role::User, "b")]);

    // Touching the first conversation again moves it to the front.
    store
        .append(first, Role::Assistant, "reply", None)
        .expect("turn should append");

    let summaries = store.list(10).expect("listing should succeed");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, first);
    assert_eq!(summaries[0].turn_count, 2);
    assert_eq!(summaries[1].id, second);
    assert_eq!(summaries[1].turn_count, 1);

    let limited = store.list(1).expect("listing should succeed");
    assert_eq!(limited.len(), 1);
}

#[test]
fn delete_cascades_to_owned_turns() {
    let (_dir, mut store) = open_temp_store();
    let doomed = seeded_conversation(&mut store, &[(Role::User, "gone"), (Role::Assistant, "soon")]);
    let survivor = seeded_conversation(&mut store, &[(Role::User, "stays")]);

    assert!(store.delete(doomed).expect("delete should run"));
    assert!(store.get(doomed).expect("read should run").is_none());

    // The survivor's turns are untouched.
    let conversation = store
        .get(survivor)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert_eq!(conversation.turns.len(), 1);

    assert!(!store.delete(doomed).expect("repeat delete should run"));
}

#[test]
fn rename_updates_the_display_name() {
    let (_dir, mut store) = open_temp_store();
    let conversation_id = seeded_conversation(&mut store, &[]);

    store
        .rename(conversation_id, "research notes")
        .expect("rename should run");

    let conversation = store
        .get(conversation_id)
        .expect("conversation should read")
        .expect("conversation should exist");
    assert_eq!(conversation.name, "research notes");
}

#[test]
fn in_memory_store_supports_the_full_surface() {
    let mut store = TranscriptStore::open_in_memory().expect("store should open");
    let conversation_id = store.create("sonar").expect("conversation should be created");
    store
        .append(conversation_id, Role::User, "hi", None)
        .expect("turn should append");

    assert!(store.path().is_none());
    assert!(store.delete_last(conversation_id).expect("rollback should run"));
    assert!(!store.delete_last(conversation_id).expect("rollback should run"));
}
