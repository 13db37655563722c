/*!
    Stable byte representation of a PDF's page content.

    Every page is copied, in page order, into a fresh container that is
    written by one fixed writer configuration:

    - header version is always the same, no `/Info`, no `/ID`
    - objects are renumbered in traversal order (page tree first, then
      whatever the pages reference, depth first)
    - dictionary keys are emitted sorted
    - stream `/Length` is recomputed and always direct
    - inheritable page attributes are copied onto each page

    Document-info metadata, and with it the embedded signature field, never
    reaches the container, so signing and verifying hash the same bytes.
*/

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use sha2::{Digest, Sha256};

use crate::constants::{CANONICAL_PDF_VERSION, INHERITABLE_PAGE_KEYS};
use crate::error::{SignerError, SignerResult};

/**
    Canonical form of a document: the rebuilt container and its bytes.
*/
#[derive(Debug, Clone)]
pub struct CanonicalDocument {
    document: Document,
    bytes: Vec<u8>,
    page_count: usize,
}

impl CanonicalDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /**
        SHA-256 of the canonical bytes.
    */
    pub fn digest(&self) -> [u8; 32] {
        digest(&self.bytes)
    }
}

/**
    SHA-256 over arbitrary bytes.
*/
pub fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/**
    Parse a PDF, rejecting inputs the canonical writer cannot faithfully copy.
*/
pub fn load(bytes: &[u8]) -> SignerResult<Document> {
    let document = Document::load_mem(bytes)?;
    if document.is_encrypted() {
        return Err(SignerError::MalformedDocument(
            "encrypted documents are not supported".into(),
        ));
    }
    Ok(document)
}

/**
    Canonicalize raw PDF bytes.
*/
pub fn canonicalize(bytes: &[u8]) -> SignerResult<CanonicalDocument> {
    canonicalize_document(&load(bytes)?)
}

/**
    Canonicalize an already parsed document.
*/
pub fn canonicalize_document(source: &Document) -> SignerResult<CanonicalDocument> {
    let mut document = rebuild(source)?;
    let page_count = document.get_pages().len();
    let bytes = save(&mut document)?;
    tracing::debug!(pages = page_count, len = bytes.len(), "canonicalized document");
    Ok(CanonicalDocument {
        document,
        bytes,
        page_count,
    })
}

/**
    Write the canonical container plus a document-info dictionary holding
    `metadata` and `field = value`. Any earlier value of `field` is replaced.
*/
pub fn embed(
    canonical: &CanonicalDocument,
    metadata: Vec<(Vec<u8>, Object)>,
    field: &str,
    value: &str,
) -> SignerResult<Vec<u8>> {
    let mut document = canonical.document.clone();

    let mut info = Dictionary::new();
    for (key, val) in metadata {
        if key != field.as_bytes() {
            info.set(key, val);
        }
    }
    info.set(field, Object::string_literal(value));

    let info_id = document.add_object(info);
    document.trailer.set("Info", info_id);
    save(&mut document)
}

/**
    Primitive document-info entries, excluding `skip_field`.
    Indirect values are resolved; nested structures are dropped.
*/
pub fn read_metadata(document: &Document, skip_field: &str) -> Vec<(Vec<u8>, Object)> {
    let Some(info) = info_dictionary(document) else {
        return Vec::new();
    };

    info.iter()
        .filter(|(key, _)| key.as_slice() != skip_field.as_bytes())
        .filter_map(|(key, value)| {
            let value = resolve(document, value)?;
            match value {
                Object::String(..)
                | Object::Name(_)
                | Object::Integer(_)
                | Object::Real(_)
                | Object::Boolean(_) => Some((key.clone(), value.clone())),
                _ => None,
            }
        })
        .collect()
}

/**
    Text of the document-info field `field`, if present.
*/
pub fn signature_field(document: &Document, field: &str) -> SignerResult<Option<Vec<u8>>> {
    let Some(info) = info_dictionary(document) else {
        return Ok(None);
    };
    let Ok(value) = info.get(field.as_bytes()) else {
        return Ok(None);
    };

    match resolve(document, value) {
        Some(Object::String(bytes, _)) => Ok(Some(bytes.clone())),
        Some(Object::Null) | None => Ok(None),
        Some(_) => Err(SignerError::MalformedDocument(format!(
            "/{field} is not a string"
        ))),
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    match resolve(document, info)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn save(document: &mut Document) -> SignerResult<Vec<u8>> {
    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| SignerError::MalformedDocument(format!("serialization failed: {e}")))?;
    Ok(bytes)
}

fn rebuild(source: &Document) -> SignerResult<Document> {
    let pages = source.get_pages();
    if pages.is_empty() {
        return Err(SignerError::MalformedDocument("document has no pages".into()));
    }

    let mut copier = Copier::new(source);
    let pages_id = copier.target.new_object_id();

    // Reserve page ids up front so links between pages map onto the copies
    let mut page_ids = Vec::with_capacity(pages.len());
    for &source_id in pages.values() {
        let target_id = copier.target.new_object_id();
        copier.mapping.insert(source_id, target_id);
        page_ids.push((source_id, target_id));
    }
    for &(source_id, _) in &page_ids {
        for ancestor in ancestors(source, source_id) {
            copier.mapping.insert(ancestor, pages_id);
        }
    }

    let mut kids = Vec::with_capacity(page_ids.len());
    for (source_id, target_id) in page_ids {
        let page = copier.copy_page(source_id, pages_id)?;
        copier.target.objects.insert(target_id, Object::Dictionary(page));
        kids.push(Object::Reference(target_id));
    }

    let mut target = copier.target;

    let mut page_tree = Dictionary::new();
    page_tree.set("Count", kids.len() as i64);
    page_tree.set("Kids", kids);
    page_tree.set("Type", "Pages");
    target.objects.insert(pages_id, Object::Dictionary(page_tree));

    let mut catalog = Dictionary::new();
    catalog.set("Pages", pages_id);
    catalog.set("Type", "Catalog");
    let catalog_id = target.add_object(catalog);
    target.trailer.set("Root", catalog_id);

    Ok(target)
}

/**
    Page-tree nodes above a page, nearest first. Cycles end the walk.
*/
fn ancestors(source: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([page_id]);
    let mut current = page_id;

    while let Some(parent) = source
        .get_dictionary(current)
        .ok()
        .and_then(|dict| dict.get(b"Parent").ok())
        .and_then(|parent| parent.as_reference().ok())
    {
        if !seen.insert(parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

struct Copier<'a> {
    source: &'a Document,
    target: Document,
    mapping: HashMap<ObjectId, ObjectId>,
}

impl<'a> Copier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            target: Document::with_version(CANONICAL_PDF_VERSION),
            mapping: HashMap::new(),
        }
    }

    fn copy_page(&mut self, page_id: ObjectId, pages_id: ObjectId) -> SignerResult<Dictionary> {
        let source = self.source;
        let page = source.get_dictionary(page_id)?;

        // Own and inherited entries are merged before anything is copied,
        // so new ids are handed out in emitted key order.
        let mut entries: BTreeMap<&[u8], &Object> = page
            .iter()
            .filter(|(key, _)| key.as_slice() != b"Parent")
            .map(|(key, value)| (key.as_slice(), value))
            .collect();

        for key in INHERITABLE_PAGE_KEYS {
            if entries.contains_key(key) {
                continue;
            }
            let inherited = ancestors(source, page_id).into_iter().find_map(|id| {
                source
                    .get_dictionary(id)
                    .ok()
                    .and_then(|dict| dict.get(key).ok())
            });
            if let Some(value) = inherited {
                entries.insert(key, value);
            }
        }

        let parent = Object::Reference(pages_id);
        entries.insert(b"Parent", &parent);
        Ok(self.copy_entries(entries))
    }

    fn copy(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.copy_reference(*id)),
            Object::Array(items) => Object::Array(items.iter().map(|o| self.copy(o)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict, false)),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict, true);
                Object::Stream(
                    Stream::new(dict, stream.content.clone())
                        .with_compression(stream.allows_compression),
                )
            }
            other => other.clone(),
        }
    }

    fn copy_reference(&mut self, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.mapping.get(&id) {
            return mapped;
        }

        let target_id = self.target.new_object_id();
        self.mapping.insert(id, target_id);

        // Dangling references are null per the PDF object model
        let source = self.source;
        let copied = match source.get_object(id) {
            Ok(object) => self.copy(object),
            Err(_) => Object::Null,
        };
        self.target.objects.insert(target_id, copied);
        target_id
    }

    fn copy_dictionary(&mut self, dict: &Dictionary, is_stream: bool) -> Dictionary {
        let entries = dict
            .iter()
            .filter(|(key, _)| !(is_stream && key.as_slice() == b"Length"))
            .map(|(key, value)| (key.as_slice(), value))
            .collect();
        self.copy_entries(entries)
    }

    /**
        Copy values in sorted key order. Reference targets are numbered as
        they are first reached, so numbering never depends on the key order
        of the input file.
    */
    fn copy_entries(&mut self, entries: BTreeMap<&[u8], &Object>) -> Dictionary {
        let mut dict = Dictionary::new();
        for (key, value) in entries {
            let copied = self.copy(value);
            dict.set(key.to_vec(), copied);
        }
        dict
    }
}
