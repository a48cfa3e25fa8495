mod collaborator;
mod column_index;
mod document;
mod error;
mod grouping;
mod header_sampler;
mod matcher;
mod model;
mod normalize;
mod ollama;
mod options;
mod output;
mod pdf_reader;
mod pipeline;
mod ranges;
mod reconstruct;
mod segment;
mod table_detect;
mod table_parse;
mod warning;

pub use collaborator::{HeaderClassifier, StaticClassifier, Summarizer, parse_pattern_reply};
pub use column_index::build_index;
pub use document::{ExtractionMode, MemoryDocument, PdfDocument, Segmentable, TableSource};
pub use error::{CollaboratorError, PipelineError, Stage};
pub use grouping::group;
pub use header_sampler::sample_headers;
pub use matcher::{is_partial_match, match_patterns, normalize_token};
pub use model::{
    Cell, ColumnIndexEntry, Entry, EntryId, HeaderCandidate, HeaderPattern, PageRange, PageText,
    RawRow, RawTable, ReconstructedTable, Row,
};
pub use normalize::fill;
pub use ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OllamaClient, OllamaConfig};
pub use options::{DEFAULT_MATCH_THRESHOLD, KeyColumn, PipelineOptions};
pub use output::{MANIFEST_FILE, entry_path, write_entry, write_manifest, write_table_csv};
pub use pipeline::{
    Discovery, EntryReport, EntryStatus, Pipeline, RangeOutput, RunReport, discover,
    extract_entries, process_sub_document, summarize_entries,
};
pub use ranges::build_ranges;
pub use reconstruct::{is_continuation, merge_page_tables, reconstruct};
pub use segment::{Scratch, SubDocument, segment, validate_ranges};
pub use warning::{RunWarning, WarningCode};
