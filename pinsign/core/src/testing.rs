/*!
    Fixtures shared by the unit tests.
*/

use std::sync::OnceLock;

use lopdf::{Document, Object, Stream, dictionary};
use rsa::RsaPrivateKey;
use rsa::rand_core::OsRng;

use crate::custody::KeyPair;
use crate::types::Pin;

const TEST_KEY_BITS: usize = 1024;

fn generate() -> KeyPair {
    KeyPair::from_private(RsaPrivateKey::new(&mut OsRng, TEST_KEY_BITS).unwrap())
}

/**
    One small key per test binary; generation dominates test time otherwise.
*/
pub(crate) fn test_key() -> KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

/**
    A second, unrelated key.
*/
pub(crate) fn other_key() -> KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

pub(crate) fn pin(s: &str) -> Pin {
    Pin::new(Some(s)).unwrap()
}

fn page_content(text: &str) -> Vec<u8> {
    format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET").into_bytes()
}

/**
    A PDF with one text page per entry. Resources and MediaBox live on the
    page-tree root so pages inherit them.
*/
pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf_with_info(pages, &[])
}

pub(crate) fn build_pdf_with_info(pages: &[&str], info: &[(&str, &str)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(text)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if !info.is_empty() {
        let mut dict = lopdf::Dictionary::new();
        for (key, value) in info {
            dict.set(*key, Object::string_literal(*value));
        }
        let info_id = doc.add_object(dict);
        doc.trailer.set("Info", info_id);
    }

    save(&mut doc)
}

/**
    Two pages whose dictionaries list several indirect entries out of
    sorted order, the way word processors tend to write them.

    Page 1 owns its `/Resources` (nested dictionaries again unsorted) and
    inherits `/MediaBox`. Page 2 inherits `/Resources` and carries an own
    `/Thumb` that sorts after it. `flip` writes every dictionary with its
    keys in the opposite order.
*/
pub(crate) fn build_pdf_unordered(flip: bool) -> Vec<u8> {
    fn dict(flip: bool, mut entries: Vec<(&str, Object)>) -> lopdf::Dictionary {
        if flip {
            entries.reverse();
        }
        let mut dict = lopdf::Dictionary::new();
        for (key, value) in entries {
            dict.set(key, value);
        }
        dict
    }

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_a = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    let font_b = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1i64,
            "Height" => 1i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8i64,
        },
        vec![0x80],
    ));
    let own_resources = doc.add_object(dict(
        flip,
        vec![
            (
                "XObject",
                Object::Dictionary(dict(flip, vec![("Im1", image.into())])),
            ),
            (
                "Font",
                Object::Dictionary(dict(
                    flip,
                    vec![("F2", font_b.into()), ("F1", font_a.into())],
                )),
            ),
        ],
    ));
    let shared_resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_a },
    });

    let content_1 = doc.add_object(Stream::new(dictionary! {}, page_content("first")));
    let thumb_1 = doc.add_object(Stream::new(dictionary! {}, vec![0x10, 0x20]));
    let page_1 = doc.add_object(dict(
        flip,
        vec![
            ("Type", "Page".into()),
            ("Parent", pages_id.into()),
            ("Resources", own_resources.into()),
            ("Contents", content_1.into()),
            ("Thumb", thumb_1.into()),
        ],
    ));

    let content_2 = doc.add_object(Stream::new(dictionary! {}, page_content("second")));
    let thumb_2 = doc.add_object(Stream::new(dictionary! {}, vec![0x30]));
    let page_2 = doc.add_object(dict(
        flip,
        vec![
            ("Type", "Page".into()),
            ("Parent", pages_id.into()),
            ("Thumb", thumb_2.into()),
            ("Contents", content_2.into()),
        ],
    ));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_1), Object::Reference(page_2)],
            "Count" => 2i64,
            "Resources" => shared_resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    save(&mut doc)
}

/**
    Rewrite the content stream of page `page` (1-based) in place.
*/
pub(crate) fn tamper_page(pdf: &[u8], page: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];
    let content_id = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Contents")
        .unwrap()
        .as_reference()
        .unwrap();
    match doc.get_object_mut(content_id).unwrap() {
        Object::Stream(stream) => stream.set_content(page_content("forged")),
        other => panic!("page content is not a stream: {other:?}"),
    }
    save(&mut doc)
}

/**
    Replace the document-info dictionary, keeping all page content.
*/
pub(crate) fn with_info_field(pdf: &[u8], key: &str, value: Object) -> Vec<u8> {
    let mut doc = Document::load_mem(pdf).unwrap();
    let info_id = doc.add_object(dictionary! { key => value });
    doc.trailer.set("Info", info_id);
    save(&mut doc)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
