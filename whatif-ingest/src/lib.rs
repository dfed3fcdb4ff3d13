//! whatif-ingest: statement ingestion from PDF page text into typed transactions.
//!
//! Pipeline: pages -> normalize -> classify -> parse (+ date normalization).

pub mod classify;
pub mod date;
pub mod extract;
pub mod normalize;
pub mod parser;
pub mod pdf;
pub mod types;

pub use classify::LineClassifier;
pub use date::{DateError, DateNormalizer, DateOrder, NormalizedDate};
pub use extract::{ExtractConfig, ExtractionReport, ExtractionStats, StatementExtractor};
pub use normalize::TextNormalizer;
pub use parser::{TransactionParser, parse_amount};
pub use pdf::{read_pages, read_pdf_pages, read_text_pages, split_pages};
pub use types::{LineError, LineKind};
