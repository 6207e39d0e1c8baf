pub mod batch;
pub mod extract;
pub mod ingest;

pub use batch::BatchWriter;
pub use extract::{BookFields, ExtractedBook, PublishedDate};
pub use ingest::{IngestError, IngestService, IngestSummary};
