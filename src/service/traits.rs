//! Abstract service traits for factlens.
//!
//! These traits define the contract the two backing services must honour.
//! Batch methods take a set of keys and answer with a map keyed by the
//! requested key; keys that were not found are simply absent. Only
//! transport failures are errors.

use std::collections::{BTreeSet, HashMap};

use crate::document::Document;
use crate::error::ServiceError;
use crate::record::{Record, RecordId};

/// Free-text document service.
pub trait DocumentService: Send + Sync {
    /// Fetch a single document by title. Redirects are followed, so the
    /// returned document's title may differ from `title`.
    fn get_document(&self, title: &str) -> Result<Option<Document>, ServiceError>;

    /// Fetch many documents in one request, keyed by requested title.
    fn get_documents(
        &self,
        titles: &BTreeSet<String>,
    ) -> Result<HashMap<String, Document>, ServiceError>;
}

/// Structured fact-store service.
pub trait RecordService: Send + Sync {
    /// Fetch a record by its id.
    fn get_record_by_id(&self, id: &RecordId) -> Result<Option<Record>, ServiceError>;

    /// Fetch many records by id in one request.
    fn get_records_by_ids(
        &self,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, ServiceError>;

    /// Fetch the record whose cross-referenced document is `title`.
    fn get_record_by_title(&self, title: &str) -> Result<Option<Record>, ServiceError>;

    /// Fetch many records by document title in one request.
    fn get_records_by_titles(
        &self,
        titles: &BTreeSet<String>,
    ) -> Result<HashMap<String, Record>, ServiceError>;

    /// Fetch a record by free-text label.
    fn get_record_by_label(&self, label: &str) -> Result<Option<Record>, ServiceError>;

    /// Fetch many records by label in one request.
    fn get_records_by_labels(
        &self,
        labels: &BTreeSet<String>,
    ) -> Result<HashMap<String, Record>, ServiceError>;
}
