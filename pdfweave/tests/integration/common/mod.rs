//! Shared helpers for pdfweave integration tests.
//!
//! Documents are generated in memory. Page `i` of a generated document is
//! `widths[i]` points wide, so page order is visible in any output.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use pdfweave::codec::{
    CodecFailure, CodecResult, DecodedDocument, DocumentCodec, LopdfCodec, PageSize, PdfOutput,
    PdfSource,
};
use pdfweave::sources::SourceInput;

/// Build a PDF whose page `i` is `widths[i]` points wide and 792 tall.
pub fn sample_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for (index, &width) in widths.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![20.into(), 760.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("page {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id, },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => widths.len() as i64,
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

/// A named input of `pages` pages, widths `base + 1 ..= base + pages`.
pub fn numbered_input(name: &str, base: i64, pages: usize) -> SourceInput {
    let widths: Vec<i64> = (1..=pages as i64).map(|i| base + i).collect();
    SourceInput::new(name, sample_pdf(&widths))
}

/// Page widths of a serialized PDF, in page order.
pub fn page_widths(bytes: &[u8]) -> Vec<f32> {
    let codec = LopdfCodec::default();
    let decoded = codec.decode(bytes).unwrap();
    (0..decoded.page_count())
        .map(|index| decoded.page_size(index).unwrap().width)
        .collect()
}

/// Page sizes of a serialized PDF, in page order.
pub fn page_sizes(bytes: &[u8]) -> Vec<PageSize> {
    let codec = LopdfCodec::default();
    let decoded = codec.decode(bytes).unwrap();
    (0..decoded.page_count())
        .map(|index| decoded.page_size(index).unwrap())
        .collect()
}

/// PDF codec that fails on purpose.
///
/// Build one with [`FaultyCodec::failing_decode`] or
/// [`FaultyCodec::failing_copy`]; the default never fails.
#[derive(Debug, Default)]
pub struct FaultyCodec {
    inner: LopdfCodec,
    fail_decode_pages: Option<usize>,
    fail_copy_index: Option<usize>,
}

impl FaultyCodec {
    /// Fail decoding documents that have exactly `pages` pages.
    pub fn failing_decode(pages: usize) -> Self {
        Self {
            fail_decode_pages: Some(pages),
            ..Self::default()
        }
    }

    /// Fail any copy that requests page `index`.
    pub fn failing_copy(index: usize) -> Self {
        Self {
            fail_copy_index: Some(index),
            ..Self::default()
        }
    }
}

impl DocumentCodec for FaultyCodec {
    type Decoded = PdfSource;
    type Output = PdfOutput;

    fn probe(&self, bytes: &[u8]) -> CodecResult<()> {
        self.inner.probe(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<PdfSource> {
        let decoded = self.inner.decode(bytes)?;
        if Some(decoded.page_count()) == self.fail_decode_pages {
            return Err(CodecFailure::Corrupt("injected decode failure".to_string()));
        }
        Ok(decoded)
    }

    fn new_output(&self) -> PdfOutput {
        self.inner.new_output()
    }

    fn copy_pages(
        &self,
        output: &mut PdfOutput,
        source: &PdfSource,
        indices: &[usize],
    ) -> CodecResult<()> {
        if let Some(poisoned) = self.fail_copy_index
            && indices.contains(&poisoned)
        {
            return Err(CodecFailure::Corrupt(format!(
                "injected copy failure at page index {poisoned}"
            )));
        }
        self.inner.copy_pages(output, source, indices)
    }

    fn add_blank_page(&self, output: &mut PdfOutput, size: PageSize) -> CodecResult<()> {
        self.inner.add_blank_page(output, size)
    }

    fn output_page_count(&self, output: &PdfOutput) -> usize {
        self.inner.output_page_count(output)
    }

    fn serialize(&self, output: PdfOutput) -> CodecResult<Vec<u8>> {
        self.inner.serialize(output)
    }
}
