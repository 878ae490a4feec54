//! Write Atomicity Tests
//!
//! - Any refused field leaves every stored document unchanged
//! - Violations accumulate below open gates
//! - Submit mode falls back to `write` where no `submit` is declared
//! - Repeating a successful update is idempotent

use std::sync::Arc;

use fieldguard::engine::{Engine, EngineError, UpdateOptions};
use fieldguard::schema::{rules, CheckFailure, Node, Predicate, Requester, SchemaRegistry};
use fieldguard::store::{Filter, InMemoryStore};
use fieldguard::universe::StaticUniverse;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (Engine, Arc<InMemoryStore>) {
    let mut registry = SchemaRegistry::new();
    registry
        .define(
            "form",
            Node::group()
                .create(true)
                .read(true)
                .write(true)
                .field("_id", Node::leaf().read(true))
                .field("field1", Node::leaf().read(true).write(rules::max_length(50)).caption("Field 1"))
                .field("field2", Node::leaf().read(true).write(true))
                .field("frozen", Node::leaf().read(true))
                .field(
                    "details",
                    Node::group()
                        .read(true)
                        .write(true)
                        .field("note", Node::leaf().read(true).write(rules::max_length(10)))
                        .field("count", Node::leaf().read(true).write(true)),
                )
                .field(
                    "review",
                    Node::group()
                        .read(true)
                        .write(rules::privileged())
                        .field("score", Node::leaf().read(true).write(true)),
                ),
        )
        .unwrap();

    let store = Arc::new(InMemoryStore::new());
    store
        .seed(
            "form",
            json!({"_id": "f1", "field1": "short", "field2": 1, "details": {"note": "n", "count": 1}}),
        )
        .unwrap();
    store
        .seed("form", json!({"_id": "f2", "field1": "other", "field2": 2}))
        .unwrap();

    let engine = Engine::new(Arc::new(registry), store.clone(), Arc::new(StaticUniverse::default()));
    (engine, store)
}

// =============================================================================
// Refusals
// =============================================================================

/// A 200-character value against a 50-character limit refuses the write.
#[tokio::test]
async fn test_over_length_field_refused() {
    let (engine, store) = setup();
    let before = store.snapshot("form").unwrap();

    let err = engine
        .update(
            &Requester::hacker("h"),
            "form",
            Filter::eq("_id", json!("f1")),
            json!({"field1": "x".repeat(200), "field2": 99}),
            UpdateOptions::write(),
        )
        .await
        .unwrap_err();

    match &err {
        EngineError::WriteDenied { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].path, "field1");
            assert_eq!(violations[0].caption, "Field 1");
        }
        other => panic!("expected WriteDenied, got {:?}", other),
    }
    assert_eq!(store.snapshot("form").unwrap(), before);
}

/// Every refused leaf below open gates is reported together.
#[tokio::test]
async fn test_violations_accumulate_across_groups() {
    let (engine, store) = setup();
    let before = store.snapshot("form").unwrap();

    let err = engine
        .update(
            &Requester::hacker("h"),
            "form",
            Filter::all(),
            json!({
                "field1": "x".repeat(51),
                "frozen": true,
                "details": {"note": "far too long for this", "count": 3},
                "review": {"score": 5},
                "unknown": 1
            }),
            UpdateOptions::write(),
        )
        .await
        .unwrap_err();

    let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["field1", "frozen", "details.note", "review", "unknown"]);
    assert_eq!(store.snapshot("form").unwrap(), before);
}

/// Submit mode with no `submit` gate uses `write`.
#[tokio::test]
async fn test_submit_falls_back_to_write() {
    let (engine, store) = setup();

    let ids = engine
        .update(
            &Requester::hacker("h"),
            "form",
            Filter::eq("_id", json!("f2")),
            json!({"field2": 7}),
            UpdateOptions::submit(),
        )
        .await
        .unwrap();

    assert_eq!(ids.len(), 1);
    let f2 = &store.snapshot("form").unwrap()[1];
    assert_eq!(f2["field2"], json!(7));
}

/// A refusal in submit mode is reported as a submission refusal.
#[tokio::test]
async fn test_submit_refusal_kind() {
    let (engine, _) = setup();
    let err = engine
        .update(
            &Requester::hacker("h"),
            "form",
            Filter::all(),
            json!({"frozen": 1}),
            UpdateOptions::submit(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::SubmissionDenied { .. }));
    assert_eq!(engine.metrics().snapshot().submission_denials, 1);
}

/// Create refuses invalid fields without inserting anything.
#[tokio::test]
async fn test_create_refusal_inserts_nothing() {
    let (engine, store) = setup();

    let err = engine
        .create(&Requester::hacker("h"), "form", json!({"field1": "x".repeat(60)}))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::WriteDenied { .. }));
    assert_eq!(store.snapshot("form").unwrap().len(), 2);
}

// =============================================================================
// Omitted Slots & Closed Gates
// =============================================================================

/// Root with open `read`/`write` but no `create` or `delete` slot, and a
/// closed group whose child check always fails.
fn ledger_engine() -> (Engine, Arc<InMemoryStore>) {
    let failing = || Predicate::try_when(|_| Err(CheckFailure::new("must not be evaluated")));

    let mut registry = SchemaRegistry::new();
    registry
        .define(
            "ledger",
            Node::group()
                .read(true)
                .write(true)
                .field("_id", Node::leaf().read(true))
                .field("memo", Node::leaf().read(true).write(true))
                .field(
                    "g",
                    Node::group()
                        .read(false)
                        .write(false)
                        .caption("Sealed")
                        .field("x", Node::leaf().read(failing()).write(failing())),
                ),
        )
        .unwrap();

    let store = Arc::new(InMemoryStore::new());
    store
        .seed("ledger", json!({"_id": "l1", "memo": "m", "g": {"x": 1}}))
        .unwrap();

    let engine = Engine::new(Arc::new(registry), store.clone(), Arc::new(StaticUniverse::default()));
    (engine, store)
}

/// No `create` slot denies creation even for admins with open sibling gates.
#[tokio::test]
async fn test_omitted_create_slot_denies() {
    let (engine, store) = ledger_engine();

    let err = engine
        .create(&Requester::admin("a"), "ledger", json!({"memo": "new"}))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::CreateDenied { .. }));
    assert_eq!(store.snapshot("ledger").unwrap().len(), 1);
}

/// No `delete` slot denies deletion even for admins with open sibling gates.
#[tokio::test]
async fn test_omitted_delete_slot_denies() {
    let (engine, store) = ledger_engine();

    let err = engine
        .delete(&Requester::admin("a"), "ledger", Filter::all())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::DeleteDenied { .. }));
    assert_eq!(store.snapshot("ledger").unwrap().len(), 1);
}

/// A closed group refuses with one violation; its children are never checked.
#[tokio::test]
async fn test_closed_group_skips_child_checks_on_write() {
    let (engine, store) = ledger_engine();
    let before = store.snapshot("ledger").unwrap();

    let err = engine
        .update(
            &Requester::admin("a"),
            "ledger",
            Filter::all(),
            json!({"g": {"x": 2}}),
            UpdateOptions::write(),
        )
        .await
        .unwrap_err();

    match &err {
        EngineError::WriteDenied { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].path, "g");
            assert_eq!(violations[0].caption, "Sealed");
        }
        other => panic!("expected WriteDenied, got {:?}", other),
    }
    assert_eq!(engine.metrics().snapshot().internal_errors, 0);
    assert_eq!(store.snapshot("ledger").unwrap(), before);
}

/// The same closed group projects cleanly on read.
#[tokio::test]
async fn test_closed_group_skips_child_checks_on_read() {
    let (engine, _) = ledger_engine();

    let doc = engine
        .fetch_one(&Requester::admin("a"), "ledger", Filter::all())
        .await
        .unwrap();

    assert_eq!(doc, json!({"_id": "l1", "memo": "m", "g": {}}));
}

// =============================================================================
// Successful Writes
// =============================================================================

/// Only submitted leaves change; siblings in the same group survive.
#[tokio::test]
async fn test_partial_nested_update_preserves_siblings() {
    let (engine, store) = setup();

    engine
        .update(
            &Requester::hacker("h"),
            "form",
            Filter::eq("_id", json!("f1")),
            json!({"details": {"count": 2}}),
            UpdateOptions::write(),
        )
        .await
        .unwrap();

    let f1 = &store.snapshot("form").unwrap()[0];
    assert_eq!(f1["details"], json!({"note": "n", "count": 2}));
    assert_eq!(f1["field1"], json!("short"));
}

/// Applying the same update twice yields the same document.
#[tokio::test]
async fn test_update_is_idempotent() {
    let (engine, store) = setup();
    let submission = json!({"field2": 5, "details": {"note": "ok"}});

    for _ in 0..2 {
        engine
            .update(
                &Requester::organizer("o"),
                "form",
                Filter::all(),
                submission.clone(),
                UpdateOptions::write(),
            )
            .await
            .unwrap();
    }
    let once_more = store.snapshot("form").unwrap();

    engine
        .update(
            &Requester::organizer("o"),
            "form",
            Filter::all(),
            submission,
            UpdateOptions::write(),
        )
        .await
        .unwrap();

    assert_eq!(store.snapshot("form").unwrap(), once_more);
}

/// Every matched document receives the patch.
#[tokio::test]
async fn test_update_patches_all_matches() {
    let (engine, store) = setup();

    let ids = engine
        .update(
            &Requester::organizer("o"),
            "form",
            Filter::all(),
            json!({"review": {"score": 3}}),
            UpdateOptions::write(),
        )
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    for doc in store.snapshot("form").unwrap() {
        assert_eq!(doc["review"]["score"], json!(3));
    }
    assert_eq!(engine.metrics().snapshot().documents_updated, 2);
}
