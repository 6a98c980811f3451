//! PDF codec built on `lopdf`.
//!
//! Pages are copied object by object: everything reachable from the page
//! dictionary is renumbered into the output, except the `Parent` link and
//! any other page or page-tree node. Attributes a page inherits from its
//! page-tree ancestors are written onto the copy, so the copy renders the
//! same once it hangs under the output's own page tree.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

use super::{CodecFailure, CodecResult, DecodedDocument, DocumentCodec, PageSize};
use crate::config::CompressionLevel;

/// Container signature every PDF starts with.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Readers accept the signature anywhere in the first kilobyte.
const SIGNATURE_WINDOW: usize = 1024;

/// Page attributes that may be inherited from the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// PDF codec configured with an output compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec {
    compression: CompressionLevel,
}

impl LopdfCodec {
    /// Create a codec that serializes with the given compression.
    pub fn new(compression: CompressionLevel) -> Self {
        Self { compression }
    }

    /// Compression applied by [`DocumentCodec::serialize`].
    pub fn compression(&self) -> CompressionLevel {
        self.compression
    }
}

/// A decoded PDF with its pages in document order.
#[derive(Debug)]
pub struct PdfSource {
    document: Document,
    pages: Vec<ObjectId>,
}

impl PdfSource {
    /// Borrow the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl DecodedDocument for PdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        let page_id = *self.pages.get(index)?;
        let media_box = inherited_attribute(&self.document, page_id, b"MediaBox")?;
        media_box_size(&self.document, media_box)
    }
}

/// A PDF under construction.
///
/// The page-tree root id is reserved up front so copied pages can point
/// their `Parent` at it before it exists.
#[derive(Debug)]
pub struct PdfOutput {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl PdfOutput {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Copy one page of `source` into this output and return the new page id.
    ///
    /// `shared` maps source object ids to output ids for the current copy
    /// call, so resources used by several copied pages are written once.
    fn import_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        shared: &mut BTreeMap<ObjectId, ObjectId>,
    ) -> CodecResult<ObjectId> {
        let mut page = source
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| CodecFailure::Corrupt(format!("page {page_id:?}: {e}")))?
            .clone();

        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Some(value) = inherited_attribute(source, page_id, key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        page.remove(b"Parent");

        let mut reachable = BTreeSet::new();
        for (_, value) in page.iter() {
            collect_references(source, value, page_id, &mut reachable);
        }

        let mut pending = Vec::new();
        for id in reachable {
            if !shared.contains_key(&id) {
                shared.insert(id, self.document.new_object_id());
                pending.push(id);
            }
        }

        // A fresh id per copy, so a page copied twice appears twice.
        let new_page_id = self.document.new_object_id();

        for id in pending {
            let mut object = source
                .get_object(id)
                .map_err(|e| CodecFailure::Corrupt(format!("object {id:?}: {e}")))?
                .clone();
            remap_references(&mut object, shared, page_id, new_page_id);
            self.document.objects.insert(shared[&id], object);
        }

        let mut page_object = Object::Dictionary(page);
        remap_references(&mut page_object, shared, page_id, new_page_id);
        if let Object::Dictionary(dict) = &mut page_object {
            dict.set("Parent", self.pages_id);
        }
        self.document.objects.insert(new_page_id, page_object);

        Ok(new_page_id)
    }
}

impl DocumentCodec for LopdfCodec {
    type Decoded = PdfSource;
    type Output = PdfOutput;

    fn probe(&self, bytes: &[u8]) -> CodecResult<()> {
        let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
        if window
            .windows(PDF_SIGNATURE.len())
            .any(|candidate| candidate == PDF_SIGNATURE)
        {
            Ok(())
        } else {
            Err(CodecFailure::Unsupported("missing %PDF- signature".to_string()))
        }
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<PdfSource> {
        self.probe(bytes)?;

        let document =
            Document::load_mem(bytes).map_err(|e| CodecFailure::Corrupt(e.to_string()))?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(CodecFailure::Corrupt("document is encrypted".to_string()));
        }

        let pages = document.get_pages().into_values().collect();
        Ok(PdfSource { document, pages })
    }

    fn new_output(&self) -> PdfOutput {
        PdfOutput::new()
    }

    fn copy_pages(
        &self,
        output: &mut PdfOutput,
        source: &PdfSource,
        indices: &[usize],
    ) -> CodecResult<()> {
        let mut shared = BTreeMap::new();

        for &index in indices {
            let page_id = *source.pages.get(index).ok_or(CodecFailure::PageOutOfRange {
                index,
                page_count: source.pages.len(),
            })?;
            let new_page_id = output.import_page(&source.document, page_id, &mut shared)?;
            output.kids.push(new_page_id);
        }

        Ok(())
    }

    fn add_blank_page(&self, output: &mut PdfOutput, size: PageSize) -> CodecResult<()> {
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => output.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), size.width.into(), size.height.into()],
            "Resources" => Dictionary::new(),
        };
        let page_id = output.document.add_object(page);
        output.kids.push(page_id);
        Ok(())
    }

    fn output_page_count(&self, output: &PdfOutput) -> usize {
        output.kids.len()
    }

    fn serialize(&self, output: PdfOutput) -> CodecResult<Vec<u8>> {
        let PdfOutput {
            mut document,
            pages_id,
            kids,
        } = output;

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<Object>>(),
            "Count" => count,
        };
        document.objects.insert(pages_id, pages.into());

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        match self.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => {
                document.compress();
            }
            CompressionLevel::Maximum => {
                document.prune_objects();
                document.compress();
            }
        }

        document.renumber_objects();

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|e| CodecFailure::Serialize(e.to_string()))?;
        Ok(bytes)
    }
}

/// Look up `key` on the page, then on each page-tree ancestor.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    loop {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        match current.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => {
                current = doc.get_object(*parent_id).and_then(Object::as_dict).ok()?;
            }
            _ => return None,
        }
    }
}

fn media_box_size(doc: &Document, media_box: &Object) -> Option<PageSize> {
    let media_box = match media_box {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let Object::Array(corners) = media_box else {
        return None;
    };
    if corners.len() != 4 {
        return None;
    }
    let llx = as_f32(&corners[0])?;
    let lly = as_f32(&corners[1])?;
    let urx = as_f32(&corners[2])?;
    let ury = as_f32(&corners[3])?;
    Some(PageSize::new((urx - llx).abs(), (ury - lly).abs()))
}

fn as_f32(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Page" || name == b"Pages")
}

/// Collect ids of every object reachable from `object`.
///
/// Other pages and page-tree nodes are not followed; references to them
/// are dropped by [`remap_references`].
fn collect_references(
    doc: &Document,
    object: &Object,
    root_page: ObjectId,
    visited: &mut BTreeSet<ObjectId>,
) {
    match object {
        Object::Reference(id) => {
            if *id == root_page || visited.contains(id) {
                return;
            }
            let Ok(target) = doc.get_object(*id) else {
                return;
            };
            if is_page_tree_node(target) {
                return;
            }
            visited.insert(*id);
            collect_references(doc, target, root_page, visited);
        }
        Object::Array(items) => {
            for item in items {
                collect_references(doc, item, root_page, visited);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_references(doc, value, root_page, visited);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_references(doc, value, root_page, visited);
            }
        }
        _ => {}
    }
}

/// Point references at their output ids; references with no copy become null.
fn remap_references(
    object: &mut Object,
    map: &BTreeMap<ObjectId, ObjectId>,
    page_id: ObjectId,
    new_page_id: ObjectId,
) {
    match object {
        Object::Reference(id) => {
            *object = if *id == page_id {
                Object::Reference(new_page_id)
            } else if let Some(new_id) = map.get(id) {
                Object::Reference(*new_id)
            } else {
                Object::Null
            };
        }
        Object::Array(items) => {
            for item in items {
                remap_references(item, map, page_id, new_page_id);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap_references(value, map, page_id, new_page_id);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap_references(value, map, page_id, new_page_id);
            }
        }
        _ => {}
    }
}
