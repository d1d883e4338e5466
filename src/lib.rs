pub mod error;
pub mod config;
pub mod patterns;
pub mod parser;
pub mod scanner;
pub mod summarizer;
pub mod masking;
pub mod notes;
pub mod tabular;
pub mod settings;
pub mod capabilities;
pub mod report;

pub use error::{InsightError, Result};
pub use patterns::PatternSet;
pub use report::{assemble, Report, ReportContent, ReportKind, ReportMetadata};
pub use scanner::{scan_file, scan_lines, ScanStats};
pub use summarizer::{summarize, ExtractiveSummarizer};
