use std::collections::BTreeMap;

use encoding_rs::{BIG5, Encoding, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::model::PageText;
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

/// Where a page's text came from; only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOrigin {
    WholeDocument,
    ContentStream,
    PageExtract,
}

fn page_chunks(full_text: &str) -> Vec<&str> {
    let mut chunks = full_text.split('\u{000C}').collect::<Vec<_>>();
    if chunks.last().is_some_and(|chunk| chunk.is_empty()) {
        chunks.pop();
    }
    chunks
}

fn is_garbled(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let mut total = 0_usize;
    let mut replacement = 0_usize;
    let mut control = 0_usize;
    let mut han = 0_usize;
    let mut han_ext_a = 0_usize;
    for ch in text.chars() {
        total += 1;
        match ch {
            '\u{FFFD}' => replacement += 1,
            '\n' | '\r' | '\t' => {}
            ch if ch.is_control() => control += 1,
            '\u{3400}'..='\u{4DBF}' => {
                han += 1;
                han_ext_a += 1;
            }
            '\u{4E00}'..='\u{9FFF}' => han += 1,
            _ => {}
        }
    }

    // Rare extension-A ideographs dominating usually means a wrong code page.
    replacement * 8 > total || control * 5 > total || (han > 20 && han_ext_a * 4 > han)
}

/// Legacy encoding implied by a font encoding name, if any.
fn hinted_encoding(name: &str) -> Option<&'static Encoding> {
    let name = name.to_ascii_lowercase();
    if ["utf16", "ucs2", "identity-h", "unicode"]
        .iter()
        .any(|hint| name.contains(hint))
    {
        Some(UTF_16BE)
    } else if ["big5", "b5", "eten"].iter().any(|hint| name.contains(hint)) {
        Some(BIG5)
    } else {
        None
    }
}

fn decode_string(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !is_garbled(&decoded) {
        return decoded;
    }

    if let Some(rest) = bytes
        .strip_prefix(&[0xFE, 0xFF])
        .or_else(|| bytes.strip_prefix(&[0xFF, 0xFE]))
    {
        let (text, had_errors) = UTF_16BE.decode_without_bom_handling(rest);
        if !had_errors && !text.is_empty() {
            return text.into_owned();
        }
    }

    if let Some(fallback) = encoding.and_then(hinted_encoding) {
        let (text, had_errors) = fallback.decode_without_bom_handling(bytes);
        if !had_errors && !text.is_empty() {
            return text.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Rates how well `text` will split into tables.
///
/// Lines that break into cells score highest when they sit next to other
/// such lines, since a lone cell line never forms a table.
fn tabular_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut score = 0_i64;
    let mut run = 0_i64;
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let cells = split_line_into_cells(line).len();
        let tabular = cells >= 2 || soft_split_line_into_cells(line).len() >= 3;
        if tabular {
            run += 1;
            score += if run > 1 { 60 } else { 40 };
        } else {
            run = 0;
        }
        score += 1;
    }

    if is_garbled(text) {
        score -= 800;
    }
    score
}

fn pick_text(candidates: Vec<(TextOrigin, String)>) -> Option<(TextOrigin, String)> {
    candidates
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .max_by_key(|(_, text)| tabular_score(text))
}

/// Walks text-showing operators and breaks lines on text-positioning ones.
struct LineCollector<'a> {
    encodings: BTreeMap<Vec<u8>, &'a str>,
    encoding: Option<&'a str>,
    current: String,
    lines: Vec<String>,
}

impl<'a> LineCollector<'a> {
    fn new(encodings: BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            encodings,
            encoding: None,
            current: String::new(),
            lines: Vec::new(),
        }
    }

    fn push_operands(&mut self, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let text = decode_string(self.encoding, bytes);
                    self.current.push_str(&text);
                }
                Object::Array(items) => {
                    self.push_operands(items);
                    self.current.push(' ');
                }
                // Large negative kerning is a visual gap between words.
                Object::Integer(offset) if *offset < -100 => self.current.push(' '),
                _ => {}
            }
        }
    }

    fn break_line(&mut self) {
        if !self.current.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.current.clear();
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "Tf" => {
                if let Some(font) = operands.first().and_then(|operand| operand.as_name().ok()) {
                    self.encoding = self.encodings.get(font).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => self.push_operands(operands),
            "T*" | "Td" | "TD" | "ET" => self.break_line(),
            _ => {}
        }
    }

    fn finish(mut self) -> Option<String> {
        self.break_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();

    let mut collector = LineCollector::new(encodings);
    for operation in &content.operations {
        collector.apply(&operation.operator, &operation.operands);
    }
    collector.finish()
}

/// Picks, per page, the text rendering that splits best into cells.
///
/// `full_text` is `pdf-extract`'s whole-document text; it competes only when
/// its form-feed chunks line up one-to-one with the page tree.
pub(crate) fn read_pdf_pages(document: &Document, full_text: Option<&str>) -> Vec<PageText> {
    let page_tree = document.get_pages();
    let chunks = full_text
        .map(page_chunks)
        .filter(|chunks| chunks.len() == page_tree.len());

    page_tree
        .iter()
        .enumerate()
        .map(|(index, (&page_number, &page_id))| {
            let mut candidates = Vec::with_capacity(3);
            if let Some(chunk) = chunks.as_ref().and_then(|chunks| chunks.get(index)) {
                candidates.push((TextOrigin::WholeDocument, (*chunk).to_string()));
            }
            if let Some(text) = content_stream_text(document, page_id) {
                candidates.push((TextOrigin::ContentStream, text));
            }
            if let Ok(text) = document.extract_text(&[page_number]) {
                candidates.push((TextOrigin::PageExtract, text));
            }

            let (origin, text) = pick_text(candidates).unwrap_or((TextOrigin::PageExtract, String::new()));
            tracing::trace!(page = page_number, ?origin, "picked page text");
            PageText { page_number, text }
        })
        .collect()
}
