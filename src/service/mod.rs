//! Backing services for entity resolution.
//!
//! The traits describe the request/response contract of the document and
//! record services; the in-memory backends implement it for embedded use
//! and tests.

mod memory;
mod traits;

pub use memory::{InMemoryDocumentService, InMemoryRecordService, ServiceCalls};
pub use traits::{DocumentService, RecordService};
