#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdf_table_entries::{CollaboratorError, Summarizer};

fn page_content(lines: &[&str]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![40.into(), 790.into()]),
    ];

    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// Builds a text PDF with one page per entry of `pages`, one line per row.
pub fn build_pdf(pages: &[&[&str]]) -> Result<Document, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(lines).encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = i64::try_from(kids.len())?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

pub fn write_pdf(path: &Path, pages: &[&[&str]]) -> Result<(), Box<dyn std::error::Error>> {
    build_pdf(pages)?.save(path)?;
    Ok(())
}

pub fn pdf_bytes(pages: &[&[&str]]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut bytes = Vec::new();
    build_pdf(pages)?.save_to(&mut bytes)?;
    Ok(bytes)
}

/// A staff directory spanning two pages followed by a one-page price list.
pub const DIRECTORY_PAGES: [&[&str]; 3] = [
    &["ID  NAME  ROLE", "1  Ann  Chair", "1  Ann  Editor"],
    &["ID  NAME  ROLE", "1  Ann  Clerk", "2  Bob  Auditor"],
    &["CODE  ITEM  PRICE", "A1  Pen  1.50", "A2  Ink  2.00"],
];

/// Records every entry it is given and answers with a fixed paragraph.
#[derive(Default)]
pub struct RecordingSummarizer {
    pub seen: RefCell<Vec<String>>,
}

impl Summarizer for RecordingSummarizer {
    fn summarize(&self, entry_text: &str) -> Result<String, CollaboratorError> {
        self.seen.borrow_mut().push(entry_text.to_string());
        Ok(format!("paragraph #{}", self.seen.borrow().len()))
    }
}

/// Fails every call, as an unreachable model server would.
pub struct OfflineSummarizer;

impl Summarizer for OfflineSummarizer {
    fn summarize(&self, _entry_text: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Transport("connection refused".to_string()))
    }
}
