use std::fmt::{Display, Formatter};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Plain text of one page, as chosen by the PDF reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// One extracted row; `None` marks a cell the extractor left empty.
pub type RawRow = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    #[must_use]
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    /// Builds a table from plain strings, mapping `""` to an empty cell.
    #[must_use]
    pub fn from_text<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        let cell = cell.as_ref();
                        (!cell.is_empty()).then(|| cell.to_string())
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn header(&self) -> Option<&RawRow> {
        self.rows.first()
    }

    #[must_use]
    pub fn first_data_row(&self) -> Option<&RawRow> {
        self.rows.get(1)
    }

    #[must_use]
    pub fn last_row(&self) -> Option<&RawRow> {
        self.rows.last()
    }
}

/// A page's leading header row, offered to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderCandidate(pub Vec<Option<String>>);

/// Ordered header names describing one expected table shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Option<String>>")]
pub struct HeaderPattern(pub Vec<String>);

impl From<Vec<Option<String>>> for HeaderPattern {
    fn from(cells: Vec<Option<String>>) -> Self {
        Self(cells.into_iter().flatten().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for HeaderPattern {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnIndexEntry {
    pub page: u32,
    pub column_names: Vec<String>,
}

/// Closed interval of 1-based page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of pages covered; zero for an inverted range.
    #[must_use]
    pub const fn page_count(self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    pub const fn fits_within(self, page_count: u32) -> bool {
        self.start >= 1 && self.start <= self.end && self.end <= page_count
    }
}

impl Display for PageRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Text(String),
    Empty,
    /// Still empty after forward-fill: no earlier value existed.
    Unresolved,
}

impl Cell {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Empty | Self::Unresolved => true,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Empty | Self::Unresolved => None,
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) if !text.is_empty() => Self::Text(text),
            _ => Self::Empty,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::from(Some(value.to_string()))
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Empty | Self::Unresolved => serializer.serialize_none(),
        }
    }
}

/// Column name to cell mapping that keeps column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Cell)>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`; an existing column keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, cell: Cell) {
        let name = name.into();
        if let Some((_, existing)) = self.fields.iter_mut().find(|(key, _)| *key == name) {
            *existing = cell;
        } else {
            self.fields.push((name, cell));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, cell)| cell)
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &Cell)> {
        self.fields
            .get(index)
            .map(|(key, cell)| (key.as_str(), cell))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(key, cell)| (key.as_str(), cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Cell)> {
        self.fields
            .iter_mut()
            .map(|(key, cell)| (key.as_str(), cell))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, C: Into<Cell>> FromIterator<(K, C)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (name, cell) in iter {
            row.insert(name, cell.into());
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, cell) in &self.fields {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Rows of one sub-document, merged across page breaks under a single header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedTable {
    pub range: PageRange,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl ReconstructedTable {
    #[must_use]
    pub fn empty(range: PageRange) -> Self {
        Self {
            range,
            header: Vec::new(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryId {
    pub range: PageRange,
    /// 1-based position within the range.
    pub ordinal: usize,
}

impl EntryId {
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!(
            "table_{}-{}_entry_{}",
            self.range.start, self.range.end, self.ordinal
        )
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "pages {} entry {}", self.range, self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub key: (String, Cell),
    pub rows: Vec<Row>,
}

impl Entry {
    /// JSON rendering handed to the summarizer.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, EntryId, HeaderPattern, PageRange, RawTable, Row};

    #[test]
    fn from_text_maps_blank_strings_to_empty_cells() {
        let table = RawTable::from_text([vec!["ID", ""]]);
        assert_eq!(table.rows[0], vec![Some("ID".to_string()), None]);
    }

    #[test]
    fn duplicate_column_keeps_first_position() {
        let mut row = Row::new();
        row.insert("A", Cell::from("1"));
        row.insert("B", Cell::from("2"));
        row.insert("A", Cell::from("3"));
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_index(0), Some(("A", &Cell::Text("3".to_string()))));
    }

    #[test]
    fn row_serializes_in_column_order_with_nulls() {
        let row: Row = [("Z", Cell::from("x")), ("A", Cell::Unresolved)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).expect("row should serialize");
        assert_eq!(json, r#"{"Z":"x","A":null}"#);
    }

    #[test]
    fn pattern_deserialization_skips_null_headers() {
        let pattern: HeaderPattern =
            serde_json::from_str(r#"["ID", null, "NAME"]"#).expect("pattern should parse");
        assert_eq!(pattern.0, vec!["ID", "NAME"]);
    }

    #[test]
    fn range_bounds_checks() {
        assert!(PageRange::new(1, 3).fits_within(3));
        assert!(!PageRange::new(0, 3).fits_within(3));
        assert!(!PageRange::new(3, 2).fits_within(3));
        assert!(!PageRange::new(2, 4).fits_within(3));
        assert_eq!(PageRange::new(5, 4).page_count(), 0);
    }

    #[test]
    fn entry_file_stem_carries_range_and_ordinal() {
        let id = EntryId {
            range: PageRange::new(4, 9),
            ordinal: 2,
        };
        assert_eq!(id.file_stem(), "table_4-9_entry_2");
    }
}
