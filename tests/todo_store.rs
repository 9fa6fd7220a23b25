use serde_json::Value;
use tempfile::TempDir;

use todo_app::error::TodoAppError;
use todo_app::todo::{IdSequence, Snapshot, TodoStats, TodoStore};

fn store_in(dir: &TempDir) -> TodoStore {
    TodoStore::new(dir.path().join("todos.json"))
}

fn ids_and_texts(items: &[todo_app::TodoItem]) -> Vec<(i64, String)> {
    items.iter().map(|i| (i.id, i.text.clone())).collect()
}

#[tokio::test]
async fn scenario_add_delete_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.load().await.unwrap(), Snapshot::Missing);
    assert!(store.list().await.unwrap().is_empty());

    store.add("Buy milk").await.unwrap();
    let items = store.list().await.unwrap();
    assert_eq!(ids_and_texts(&items), vec![(1, "Buy milk".to_string())]);
    assert!(!items[0].completed);

    store.add("Walk dog").await.unwrap();
    let items = store.list().await.unwrap();
    assert_eq!(
        ids_and_texts(&items),
        vec![(1, "Buy milk".to_string()), (2, "Walk dog".to_string())]
    );

    store.delete(1).await.unwrap();
    let items = store.list().await.unwrap();
    assert_eq!(ids_and_texts(&items), vec![(2, "Walk dog".to_string())]);

    store.toggle(2).await.unwrap();
    let items = store.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 2);
    assert!(items[0].completed);
}

#[tokio::test]
async fn add_round_trips_text_and_returns_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let added = store.add("Read *a book*").await.unwrap();
    assert_eq!(added.text, "Read *a book*");
    assert!(!added.completed);
    assert!(added.created_at.contains('T'));

    let items = store.list().await.unwrap();
    assert_eq!(items, vec![added]);
}

#[tokio::test]
async fn delete_is_idempotent_and_ignores_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.add("a").await.unwrap();
    store.add("b").await.unwrap();

    let before = store.list().await.unwrap();
    assert!(!store.delete(42).await.unwrap());
    assert_eq!(store.list().await.unwrap(), before);

    assert!(store.delete(1).await.unwrap());
    let once = store.list().await.unwrap();
    assert!(!store.delete(1).await.unwrap());
    assert_eq!(store.list().await.unwrap(), once);
}

#[tokio::test]
async fn toggle_twice_restores_completion() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.add("a").await.unwrap();

    let first = store.toggle(1).await.unwrap().unwrap();
    assert!(first.completed);
    let second = store.toggle(1).await.unwrap().unwrap();
    assert!(!second.completed);
    assert!(!store.list().await.unwrap()[0].completed);

    assert!(store.toggle(99).await.unwrap().is_none());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn corrupt_backing_file_reads_as_empty_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "{ this is not json").unwrap();

    assert_eq!(store.load().await.unwrap(), Snapshot::Corrupt);
    assert!(store.list().await.unwrap().is_empty());

    store.add("fresh start").await.unwrap();
    let items = store.list().await.unwrap();
    assert_eq!(ids_and_texts(&items), vec![(1, "fresh start".to_string())]);
}

#[tokio::test]
async fn non_utf8_backing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), [0xffu8, 0xfe, 0x00]).unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn ids_are_not_reused_after_deleting_the_newest_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.add("a").await.unwrap();
    store.add("b").await.unwrap();
    store.delete(2).await.unwrap();

    let added = store.add("c").await.unwrap();
    assert_eq!(added.id, 3);

    let sequence = IdSequence::for_backing_file(store.path());
    assert_eq!(sequence.peek().await.unwrap(), Some(4));
}

#[tokio::test]
async fn ids_survive_a_fresh_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = store_in(&dir);
        store.add("a").await.unwrap();
        store.delete(1).await.unwrap();
    }
    let store = store_in(&dir);
    assert_eq!(store.add("b").await.unwrap().id, 2);
}

#[tokio::test]
async fn legacy_file_with_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        r#"[
  {"id": 1, "text": "first", "completed": false, "created_at": "2024-01-01T10:00:00.000000"},
  {"id": 1, "text": "second", "completed": false, "created_at": "2024-01-01T11:00:00.000000"},
  {"id": 2, "text": "third", "completed": false, "created_at": "2024-01-01T12:00:00.000000"}
]"#,
    )
    .unwrap();

    store.toggle(1).await.unwrap();
    let items = store.list().await.unwrap();
    assert!(items[0].completed);
    assert!(!items[1].completed);
    assert_eq!(items[1].created_at, "2024-01-01T11:00:00.000000");

    assert!(store.delete(1).await.unwrap());
    let items = store.list().await.unwrap();
    assert_eq!(ids_and_texts(&items), vec![(2, "third".to_string())]);

    assert_eq!(store.add("fourth").await.unwrap().id, 3);
}

#[tokio::test]
async fn backing_file_is_a_pretty_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.add("Buy milk").await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.starts_with("[\n  {"));
    let value: Value = serde_json::from_str(&raw).unwrap();
    let entry = &value.as_array().unwrap()[0];
    assert_eq!(entry["id"], 1);
    assert_eq!(entry["text"], "Buy milk");
    assert_eq!(entry["completed"], false);
    assert!(entry["created_at"].is_string());
}

#[tokio::test]
async fn stats_reflect_completed_and_total() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.add("a").await.unwrap();
    store.add("b").await.unwrap();
    store.toggle(2).await.unwrap();
    assert_eq!(
        store.stats().await.unwrap(),
        TodoStats {
            completed: 1,
            total: 2
        }
    );
}

#[tokio::test]
async fn read_faults_other_than_missing_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let store = TodoStore::new(dir.path());
    let err = store.list().await.unwrap_err();
    assert!(matches!(err, TodoAppError::Storage(_)));
}

#[tokio::test]
async fn write_faults_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir(dir.path().join("todos.json.tmp")).unwrap();

    let err = store.add("a").await.unwrap_err();
    assert!(matches!(err, TodoAppError::Storage(_)));
    assert_eq!(store.load().await.unwrap(), Snapshot::Missing);
}

#[tokio::test]
async fn sequence_write_fault_keeps_the_committed_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir(dir.path().join("todos.json.seq.tmp")).unwrap();

    let item = store.add("Buy milk").await.unwrap();
    assert_eq!(item.id, 1);
    assert_eq!(ids_and_texts(&store.list().await.unwrap()), vec![(1, "Buy milk".into())]);

    let next = store.add("Walk dog").await.unwrap();
    assert_eq!(next.id, 2);
}

#[tokio::test]
async fn exhausted_id_space_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let last = format!(r#"[{{"id": {}, "text": "last", "completed": false}}]"#, i64::MAX);
    std::fs::write(store.path(), last).unwrap();

    let err = store.add("one more").await.unwrap_err();
    assert!(matches!(err, TodoAppError::Storage(_)));
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreadable_parent_path_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    let store = TodoStore::new(blocker.join("todos.json"));

    let err = store.add("a").await.unwrap_err();
    assert!(matches!(err, TodoAppError::Storage(_)));
}

#[tokio::test]
async fn concurrent_adds_in_one_process_keep_every_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(store_in(&dir));

    let mut handles = Vec::new();
    for n in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add(&format!("item {n}")).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let items = store.list().await.unwrap();
    assert_eq!(items.len(), 8);
    let mut ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}
