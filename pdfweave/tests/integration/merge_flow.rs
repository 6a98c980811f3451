//! Integration tests for merge sessions.

use pdfweave::compose::MergeOptions;
use pdfweave::config::{CompressionLevel, EngineConfig};
use pdfweave::session::EditingSession;
use pdfweave::sources::SourceId;
use rstest::rstest;

use crate::common::{numbered_input, page_sizes, page_widths};

fn session_with(config: EngineConfig) -> EditingSession<pdfweave::codec::LopdfCodec> {
    EditingSession::new(config).unwrap()
}

fn add_abc(session: &mut EditingSession<pdfweave::codec::LopdfCodec>) -> Vec<SourceId> {
    session
        .add_sources(vec![
            numbered_input("a.pdf", 100, 2),
            numbered_input("b.pdf", 200, 1),
            numbered_input("c.pdf", 300, 3),
        ])
        .into_iter()
        .map(|result| result.unwrap())
        .collect()
}

#[tokio::test]
async fn test_merge_follows_collection_order() {
    let mut session = session_with(EngineConfig::default());
    let ids = add_abc(&mut session);

    let result = session.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(
        page_widths(&result.output.bytes),
        vec![101.0, 102.0, 201.0, 301.0, 302.0, 303.0]
    );

    session.reorder_source(ids[2], 0).unwrap();
    let result = session.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(
        page_widths(&result.output.bytes),
        vec![301.0, 302.0, 303.0, 101.0, 102.0, 201.0]
    );
}

#[tokio::test]
async fn test_merge_after_removal() {
    let mut session = session_with(EngineConfig::default());
    let ids = add_abc(&mut session);
    session.remove_source(ids[1]);

    let result = session.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(result.statistics.files_merged, 2);
    assert_eq!(
        page_widths(&result.output.bytes),
        vec![101.0, 102.0, 301.0, 302.0, 303.0]
    );
}

#[tokio::test]
async fn test_separators_sized_after_preceding_source() {
    let mut session = session_with(EngineConfig::default());
    session
        .add_sources(vec![
            numbered_input("s1.pdf", 500, 2),
            numbered_input("s2.pdf", 700, 1),
        ])
        .into_iter()
        .for_each(|result| {
            result.unwrap();
        });

    let options = MergeOptions {
        insert_separators: true,
        output_name: None,
    };
    let result = session.merge(&options).await.unwrap();

    let sizes = page_sizes(&result.output.bytes);
    assert_eq!(sizes.len(), 4);
    assert_eq!(sizes[2].width, 501.0);
    assert_eq!(sizes[2].height, 792.0);
    assert_eq!(sizes[3].width, 701.0);
}

#[tokio::test]
async fn test_three_sources_get_two_separators() {
    let mut session = session_with(EngineConfig {
        insert_separators: true,
        ..EngineConfig::default()
    });
    add_abc(&mut session);

    let options = session.merge_options(None);
    let result = session.merge(&options).await.unwrap();
    assert_eq!(result.statistics.separators_inserted, 2);
    assert_eq!(result.output.page_count, 8);
    assert_eq!(
        page_widths(&result.output.bytes),
        vec![101.0, 102.0, 101.0, 201.0, 201.0, 301.0, 302.0, 303.0]
    );
}

#[tokio::test]
async fn test_single_source_has_no_separator() {
    let mut session = session_with(EngineConfig::default());
    session.add_sources(vec![numbered_input("only.pdf", 100, 3)]);

    let options = MergeOptions {
        insert_separators: true,
        output_name: Some("solo".to_string()),
    };
    let result = session.merge(&options).await.unwrap();
    assert_eq!(result.output.name, "solo.pdf");
    assert_eq!(result.output.page_count, 3);
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_merge_output_is_readable_at_every_compression(#[case] compression: CompressionLevel) {
    let mut session = session_with(EngineConfig {
        compression,
        ..EngineConfig::default()
    });
    add_abc(&mut session);

    let result = session.merge(&MergeOptions::default()).await.unwrap();
    let document = lopdf::Document::load_mem(&result.output.bytes).unwrap();
    assert_eq!(document.get_pages().len(), 6);
}

#[tokio::test]
async fn test_merge_then_split_round_trip() {
    let mut session = session_with(EngineConfig::default());
    session.add_sources(vec![numbered_input("whole.pdf", 100, 7)]);
    let merged = session.merge(&MergeOptions::default()).await.unwrap();

    let pages = session
        .load_split_source(pdfweave::sources::SourceInput::new(
            merged.output.name.clone(),
            merged.output.bytes,
        ))
        .await
        .unwrap();
    assert_eq!(pages, 7);

    let report = session.split().await.unwrap();
    let outputs: Vec<_> = report.outputs().collect();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].page_count, 7);
    assert_eq!(page_widths(&outputs[0].bytes).len(), 7);
}
