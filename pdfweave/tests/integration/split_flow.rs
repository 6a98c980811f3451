//! Integration tests for split sessions.

use pdfweave::codec::LopdfCodec;
use pdfweave::config::EngineConfig;
use pdfweave::error::WeaveError;
use pdfweave::ranges::{RangeBound, RangeId, RangeUpdate};
use pdfweave::session::EditingSession;

use crate::common::{FaultyCodec, numbered_input, page_widths};

async fn loaded_session(pages: usize) -> (EditingSession<LopdfCodec>, RangeId) {
    let mut session = EditingSession::new(EngineConfig::default()).unwrap();
    session
        .load_split_source(numbered_input("source.pdf", 100, pages))
        .await
        .unwrap();
    let first = session.ranges().unwrap().iter().next().unwrap().id();
    (session, first)
}

#[tokio::test]
async fn test_split_three_to_five_of_ten() {
    let (mut session, first) = loaded_session(10).await;
    session.update_range(first, RangeUpdate::Start(3)).unwrap();
    session.update_range(first, RangeUpdate::End(5)).unwrap();

    let report = session.split().await.unwrap();
    let output = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(output.page_count, 3);
    assert_eq!(page_widths(&output.bytes), vec![103.0, 104.0, 105.0]);
}

#[tokio::test]
async fn test_reversed_range_is_skipped_silently() {
    let (mut session, first) = loaded_session(10).await;
    session.update_range(first, RangeUpdate::Start(6)).unwrap();
    session.update_range(first, RangeUpdate::End(3)).unwrap();

    let report = session.split().await.unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.skipped, vec![first]);
    assert_eq!(report.failures().count(), 0);
}

#[tokio::test]
async fn test_committed_drafts_drive_the_split() {
    let (mut session, first) = loaded_session(8).await;

    session.edit_range_input(first, RangeBound::Start, "  6th").unwrap();
    session.edit_range_input(first, RangeBound::End, "").unwrap();
    assert_eq!(session.commit_range_input(first, RangeBound::Start).unwrap(), 6);
    assert_eq!(session.commit_range_input(first, RangeBound::End).unwrap(), 8);

    // Uncommitted text is ignored by composition.
    session.edit_range_input(first, RangeBound::Start, "1").unwrap();

    let report = session.split().await.unwrap();
    let output = report.outputs().next().unwrap();
    assert_eq!(page_widths(&output.bytes), vec![106.0, 107.0, 108.0]);
}

#[tokio::test]
async fn test_overlapping_ranges_each_get_their_pages() {
    let (mut session, first) = loaded_session(6).await;
    session.update_range(first, RangeUpdate::End(4)).unwrap();
    let second = session.add_range().unwrap();
    session.update_range(second, RangeUpdate::Start(3)).unwrap();
    session
        .update_range(second, RangeUpdate::Name("tail".to_string()))
        .unwrap();

    let report = session.split().await.unwrap();
    let outputs: Vec<_> = report.outputs().collect();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].name, "Part 1.pdf");
    assert_eq!(page_widths(&outputs[0].bytes), vec![101.0, 102.0, 103.0, 104.0]);
    assert_eq!(outputs[1].name, "tail.pdf");
    assert_eq!(page_widths(&outputs[1].bytes), vec![103.0, 104.0, 105.0, 106.0]);
}

#[tokio::test]
async fn test_failed_range_does_not_abort_siblings() {
    let codec = FaultyCodec::failing_copy(4);
    let mut session = EditingSession::with_codec(EngineConfig::default(), codec).unwrap();
    session
        .load_split_source(numbered_input("source.pdf", 100, 10))
        .await
        .unwrap();

    let first = session.ranges().unwrap().iter().next().unwrap().id();
    session.update_range(first, RangeUpdate::End(3)).unwrap();
    let poisoned = session.add_range().unwrap();
    session.update_range(poisoned, RangeUpdate::Start(4)).unwrap();
    session.update_range(poisoned, RangeUpdate::End(6)).unwrap();
    let last = session.add_range().unwrap();
    session.update_range(last, RangeUpdate::Start(7)).unwrap();

    let report = session.split().await.unwrap();
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.success_count(), 2);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, poisoned);
    assert!(matches!(
        failures[0].1,
        WeaveError::CodecError { source_name, .. } if source_name == "source.pdf"
    ));
}

#[tokio::test]
async fn test_previews_follow_range_edits() {
    let (mut session, first) = loaded_session(5).await;

    let refresh = session.refresh_previews().await.unwrap();
    assert_eq!(refresh.composed, vec![first]);
    let original = session.range_preview(first).unwrap();

    session.update_range(first, RangeUpdate::End(2)).unwrap();
    session.refresh_previews().await.unwrap();
    let replaced = session.range_preview(first).unwrap();

    assert_ne!(original, replaced);
    assert!(!session.previews().is_live(&original));
    assert!(session.previews().open(&original).is_none());
    let bytes = session.previews().bytes(&replaced).unwrap();
    assert_eq!(page_widths(&bytes), vec![101.0, 102.0]);
}

#[tokio::test]
async fn test_range_names_are_not_reused() {
    let (mut session, first) = loaded_session(3).await;
    let second = session.add_range().unwrap();
    session.remove_range(second).unwrap();
    session.remove_range(first).unwrap();

    let third = session.add_range().unwrap();
    let range = session.ranges().unwrap().get(third).unwrap();
    assert_eq!(range.name(), "Part 3");
    assert_eq!((range.start(), range.end()), (1, 3));
}
