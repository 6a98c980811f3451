//! Integration tests for error handling and resource cleanup.

use pdfweave::compose::MergeOptions;
use pdfweave::config::EngineConfig;
use pdfweave::error::WeaveError;
use pdfweave::preview::PreviewKey;
use pdfweave::session::EditingSession;
use pdfweave::sources::{SourceId, SourceInput};

use crate::common::{FaultyCodec, numbered_input, sample_pdf};

#[tokio::test]
async fn test_merge_with_no_sources() {
    let session = EditingSession::new(EngineConfig::default()).unwrap();
    let err = session.merge(&MergeOptions::default()).await.unwrap_err();

    assert!(matches!(err, WeaveError::EmptyInput));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_unsupported_inputs_reported_per_file() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    let results = session.add_sources(vec![
        SourceInput::new("notes.txt", b"plain text".to_vec()),
        numbered_input("real.pdf", 100, 1),
        SourceInput::new("empty.pdf", Vec::new()),
    ]);

    assert!(matches!(
        &results[0],
        Err(WeaveError::UnsupportedFormat { name, .. }) if name == "notes.txt"
    ));
    assert!(results[1].is_ok());
    assert!(matches!(
        &results[2],
        Err(WeaveError::UnsupportedFormat { name, .. }) if name == "empty.pdf"
    ));
    assert_eq!(session.sources().len(), 1);
    assert_eq!(session.previews().len(), 1);
}

#[tokio::test]
async fn test_merge_decode_failure_names_source() {
    let codec = FaultyCodec::failing_decode(2);
    let mut session = EditingSession::with_codec(EngineConfig::default(), codec).unwrap();
    session.add_sources(vec![
        numbered_input("one-page.pdf", 100, 1),
        numbered_input("two-pages.pdf", 200, 2),
        numbered_input("three-pages.pdf", 300, 3),
    ]);

    let err = session.merge(&MergeOptions::default()).await.unwrap_err();
    assert!(err.to_string().contains("two-pages.pdf"));
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        WeaveError::CodecError { ref source_name, .. } if source_name == "two-pages.pdf"
    ));
}

#[tokio::test]
async fn test_corrupt_split_source_keeps_previous_state() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    session
        .load_split_source(numbered_input("good.pdf", 100, 4))
        .await
        .unwrap();

    let err = session
        .load_split_source(SourceInput::new("bad.pdf", b"%PDF-1.7\n%%EOF".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, WeaveError::CorruptInput { .. }));
    assert_eq!(session.split_source().unwrap().name(), "good.pdf");
    assert_eq!(session.ranges().unwrap().total_pages(), 4);
}

#[test]
fn test_reorder_unknown_id_leaves_order() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    let ids: Vec<SourceId> = session
        .add_sources(vec![
            numbered_input("a.pdf", 100, 1),
            numbered_input("b.pdf", 200, 1),
        ])
        .into_iter()
        .map(|result| result.unwrap())
        .collect();
    session.remove_source(ids[0]);

    let err = session.reorder_source(ids[0], 0).unwrap_err();
    assert!(matches!(err, WeaveError::NotFound { .. }));
    assert_eq!(session.sources().ids(), vec![ids[1]]);
}

#[test]
fn test_reorder_is_a_permutation() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    let inputs = (0..6)
        .map(|i| SourceInput::new(format!("{i}.pdf"), sample_pdf(&[100 + i])))
        .collect();
    let ids: Vec<SourceId> = session
        .add_sources(inputs)
        .into_iter()
        .map(|result| result.unwrap())
        .collect();

    let mut expected = ids.clone();
    expected.sort();

    // Walk a fixed, scrambled sequence of moves, including out-of-range targets.
    for step in 0..40usize {
        let id = ids[(step * 5 + 3) % ids.len()];
        let target = (step * 7) % (ids.len() + 3);
        session.reorder_source(id, target).unwrap();

        let mut current = session.sources().ids();
        assert_eq!(current.len(), ids.len());
        current.sort();
        assert_eq!(current, expected);
    }
}

#[test]
fn test_release_twice_is_noop() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    let id = session.add_sources(vec![numbered_input("a.pdf", 100, 1)])[0]
        .as_ref()
        .copied()
        .unwrap();
    let handle = session.source_preview(id).unwrap();

    assert!(session.remove_source(id));
    assert!(!session.remove_source(id));
    assert!(!session.previews().is_live(&handle));
    assert!(session.previews().handle(&PreviewKey::Source(id)).is_none());
    assert_eq!(session.previews().statistics().revoked, 1);
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    session.add_sources(vec![numbered_input("a.pdf", 100, 2)]);
    session
        .load_split_source(numbered_input("b.pdf", 200, 2))
        .await
        .unwrap();

    assert_eq!(session.teardown(), 2);
    assert_eq!(session.teardown(), 0);
    assert!(matches!(session.add_range(), Err(WeaveError::NoSplitSource)));
}
