mod helpers;

use helpers::{at, break_storage, open, repair_storage, test_engine};
use linemark::host::DocumentAnchorProvider;
use linemark::{AnnotateOutcome, BookmarkError, ToggleOutcome};
use tempfile::TempDir;

#[test]
fn annotate_creates_bookmark_with_marker_and_note() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/src/main.rs", 20);
    at(&mut engine, doc, 7);

    let outcome = engine.annotate(Some("entry point")).unwrap();
    let AnnotateOutcome::Created { id } = outcome else {
        panic!("expected Created, got {outcome:?}");
    };

    let all = engine.get_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].line, 7);
    assert_eq!(all[0].note.as_deref(), Some("entry point"));
    assert_eq!(engine.host().marker_lines(doc), vec![7]);
    assert_eq!(engine.host().annotations(doc).len(), 1);
    assert!(engine.storage_path().exists());
}

#[test]
fn annotate_existing_line_updates_the_note_in_place() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 3);

    let AnnotateOutcome::Created { id } = engine.annotate(Some("first")).unwrap() else {
        panic!("expected Created");
    };
    let updated = engine.annotate(Some("second")).unwrap();
    assert_eq!(updated, AnnotateOutcome::Updated { id: id.clone() });

    let all = engine.get_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].note.as_deref(), Some("second"));
    let annotations = engine.host().annotations(doc);
    assert_eq!(annotations.len(), 1, "old annotation must be replaced");
    assert!(annotations[0].1.ends_with("second"));
}

#[test]
fn empty_or_cancelled_prompt_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 3);

    engine.host_mut().push_prompt_answer(None);
    assert_eq!(engine.annotate(None).unwrap(), AnnotateOutcome::Cancelled);
    engine.host_mut().push_prompt_answer(Some(""));
    assert_eq!(engine.annotate(None).unwrap(), AnnotateOutcome::Cancelled);
    assert_eq!(engine.annotate(Some("   ")).unwrap(), AnnotateOutcome::Cancelled);

    assert!(!engine.has_bookmarks());
    assert!(!engine.host().has_visuals(doc));
}

#[test]
fn prompt_answer_becomes_the_note() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 5);

    engine.host_mut().push_prompt_answer(Some("from prompt"));
    assert!(matches!(engine.annotate(None).unwrap(), AnnotateOutcome::Created { .. }));
    assert_eq!(engine.get_all()[0].note.as_deref(), Some("from prompt"));
}

#[test]
fn out_of_range_cursor_is_reported_not_created() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 3);
    at(&mut engine, doc, 40);

    let err = engine.annotate(Some("nope")).unwrap_err();
    assert!(matches!(err, BookmarkError::LineOutOfRange { line: 40, .. }));
    assert!(!engine.has_bookmarks());
}

#[test]
fn invalid_documents_are_refused() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = engine.host_mut().open("term://~//42:/bin/zsh", "$ ls\n");
    at(&mut engine, doc, 1);

    let err = engine.annotate(Some("x")).unwrap_err();
    assert!(matches!(err, BookmarkError::InvalidDocument(_)));
    assert!(matches!(engine.toggle(), Err(BookmarkError::InvalidDocument(_))));
}

#[test]
fn no_cursor_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    assert!(matches!(engine.annotate(Some("x")), Err(BookmarkError::NoCursor)));
}

#[test]
fn failed_create_rolls_back_store_and_visuals() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    break_storage(&mut engine);
    at(&mut engine, doc, 4);

    let err = engine.annotate(Some("lost")).unwrap_err();
    assert!(matches!(err, BookmarkError::PersistFailed(_)));
    assert!(!engine.has_bookmarks());
    assert!(!engine.host().has_visuals(doc), "every visual created must be destroyed");
}

#[test]
fn failed_update_restores_old_note_and_annotation() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 4);
    engine.annotate(Some("original")).unwrap();
    let before = engine.host().annotations(doc);

    let broken = break_storage(&mut engine);
    let err = engine.annotate(Some("replacement")).unwrap_err();
    assert!(matches!(err, BookmarkError::PersistFailed(_)));

    assert_eq!(engine.get_all()[0].note.as_deref(), Some("original"));
    assert_eq!(engine.host().annotations(doc), before);

    repair_storage(&broken);
    assert!(matches!(
        engine.annotate(Some("replacement")).unwrap(),
        AnnotateOutcome::Updated { .. }
    ));
}

#[test]
fn toggle_adds_then_removes() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 2);

    let ToggleOutcome::Added { id } = engine.toggle().unwrap() else {
        panic!("expected Added");
    };
    let all = engine.get_all();
    assert!(all[0].note.is_none());
    assert_eq!(engine.host().marker_lines(doc), vec![2]);
    assert!(engine.host().annotations(doc).is_empty());

    assert_eq!(engine.toggle().unwrap(), ToggleOutcome::Removed { id });
    assert!(!engine.has_bookmarks());
    assert!(!engine.host().has_visuals(doc));
}

#[test]
fn single_annotation_toggle_needs_a_note() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    at(&mut engine, doc, 2);
    engine.toggle().unwrap();
    assert!(!engine.toggle_annotation().unwrap());
    assert!(engine.host().annotations(doc).is_empty());
    assert!(engine.get_all()[0].note.is_none());

    at(&mut engine, doc, 6);
    engine.annotate(Some("shown")).unwrap();
    assert!(!engine.toggle_annotation().unwrap());
    assert!(engine.host().annotations(doc).is_empty());
    assert!(engine.toggle_annotation().unwrap());
    assert_eq!(engine.host().annotations(doc).len(), 1);
}

#[test]
fn global_toggle_four_times_keeps_one_annotation_per_note() {
    let tmp = TempDir::new().unwrap();
    let mut engine = test_engine(&tmp);
    let doc = open(&mut engine, "/work/repo/a.rs", 10);
    for (line, note) in [(2, "a"), (5, "b"), (9, "c")] {
        at(&mut engine, doc, line);
        engine.annotate(Some(note)).unwrap();
    }
    let before = engine.host().annotations(doc).len();
    assert_eq!(before, 3);

    for _ in 0..4 {
        engine.toggle_all_annotations();
    }
    assert!(engine.state().annotations_visible);
    assert_eq!(engine.host().annotations(doc).len(), before);

    assert!(!engine.toggle_all_annotations());
    assert!(engine.host().annotations(doc).is_empty());
}
