//! In-memory PDF fixtures for unit tests.
//!
//! Every generated page gets its own `MediaBox` width, which makes page
//! order observable after a composition.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::codec::{DecodedDocument, DocumentCodec, LopdfCodec};

/// Build a PDF whose page `i` is `widths[i]` points wide and 792 tall.
///
/// Resources live on the page-tree root so copies must resolve inheritance.
pub(crate) fn sample_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id, },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (index, &width) in widths.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![36.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 792.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => widths.len() as i64,
            "Resources" => resources_id,
        }
        .into(),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page widths of a serialized PDF, in page order.
pub(crate) fn page_widths(bytes: &[u8]) -> Vec<f32> {
    let codec = LopdfCodec::default();
    let decoded = codec.decode(bytes).unwrap();
    (0..decoded.page_count())
        .map(|index| decoded.page_size(index).unwrap().width)
        .collect()
}
