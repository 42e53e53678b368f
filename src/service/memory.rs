//! In-memory service backends.
//!
//! Thread-safe in-memory implementations of the service traits. They are
//! intended for embedded usage and tests: every call is counted so callers
//! can check how many round-trips a resolution strategy costs, and a
//! service can be switched off to simulate transport failure.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::document::Document;
use crate::error::ServiceError;
use crate::record::{Record, RecordId};
use crate::service::traits::{DocumentService, RecordService};

fn lock_err(context: &'static str) -> ServiceError {
    ServiceError::Backend {
        message: format!("poisoned lock: {context}"),
    }
}

fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Per-operation call counts of an in-memory service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCalls {
    /// Single-key lookups.
    pub single: usize,
    /// Batched lookups.
    pub batch: usize,
}

impl ServiceCalls {
    /// Total number of round-trips.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.single + self.batch
    }
}

#[derive(Debug, Default)]
struct CallCounter {
    single: AtomicUsize,
    batch: AtomicUsize,
    unavailable: AtomicBool,
}

impl CallCounter {
    fn single(&self, service: &'static str) -> Result<(), ServiceError> {
        self.single.fetch_add(1, Ordering::Relaxed);
        self.check(service)
    }

    fn batch(&self, service: &'static str) -> Result<(), ServiceError> {
        self.batch.fetch_add(1, Ordering::Relaxed);
        self.check(service)
    }

    fn check(&self, service: &'static str) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ServiceError::Unavailable {
                service: service.to_string(),
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> ServiceCalls {
        ServiceCalls {
            single: self.single.load(Ordering::Relaxed),
            batch: self.batch.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.single.store(0, Ordering::Relaxed);
        self.batch.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct DocumentState {
    by_title: HashMap<String, Document>,
    redirects: HashMap<String, String>,
}

impl DocumentState {
    fn lookup(&self, title: &str) -> Option<&Document> {
        let key = normalize_key(title);
        let key = self.redirects.get(&key).unwrap_or(&key);
        self.by_title.get(key)
    }
}

/// Thread-safe in-memory document service.
///
/// Titles are matched case-insensitively; redirects map an alternative
/// title onto a canonical one.
#[derive(Debug, Default)]
pub struct InMemoryDocumentService {
    state: RwLock<DocumentState>,
    calls: CallCounter,
}

impl InMemoryDocumentService {
    /// Create a new empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under its canonical title, replacing any previous one.
    pub fn insert(&self, document: Document) -> Result<(), ServiceError> {
        let mut state = self.state.write().map_err(|_| lock_err("document.insert"))?;
        state.by_title.insert(normalize_key(&document.title), document);
        Ok(())
    }

    /// Make `from` resolve to the document titled `to`.
    pub fn add_redirect(&self, from: &str, to: &str) -> Result<(), ServiceError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("document.add_redirect"))?;
        state.redirects.insert(normalize_key(from), normalize_key(to));
        Ok(())
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> ServiceCalls {
        self.calls.snapshot()
    }

    pub fn reset_calls(&self) {
        self.calls.reset();
    }

    /// Make every subsequent call fail with `ServiceError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.calls.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

impl DocumentService for InMemoryDocumentService {
    fn get_document(&self, title: &str) -> Result<Option<Document>, ServiceError> {
        self.calls.single("documents")?;
        let state = self.state.read().map_err(|_| lock_err("document.get"))?;
        Ok(state.lookup(title).cloned())
    }

    fn get_documents(
        &self,
        titles: &BTreeSet<String>,
    ) -> Result<HashMap<String, Document>, ServiceError> {
        self.calls.batch("documents")?;
        let state = self.state.read().map_err(|_| lock_err("document.get_many"))?;
        Ok(titles
            .iter()
            .filter_map(|title| state.lookup(title).map(|doc| (title.clone(), doc.clone())))
            .collect())
    }
}

#[derive(Debug, Default)]
struct RecordState {
    by_id: HashMap<RecordId, Record>,
    by_title: HashMap<String, RecordId>,
    by_label: HashMap<String, RecordId>,
}

impl RecordState {
    fn by_title(&self, title: &str) -> Option<&Record> {
        self.by_title
            .get(&normalize_key(title))
            .and_then(|id| self.by_id.get(id))
    }

    fn by_label(&self, label: &str) -> Option<&Record> {
        self.by_label
            .get(&normalize_key(label))
            .and_then(|id| self.by_id.get(id))
    }
}

/// Thread-safe in-memory record service.
///
/// Records are indexed by id, by their sitelink title in the service's
/// language and by every label. The first record inserted under a given
/// label keeps it.
#[derive(Debug)]
pub struct InMemoryRecordService {
    language: String,
    state: RwLock<RecordState>,
    calls: CallCounter,
}

impl Default for InMemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordService {
    /// Create a new empty service indexing English sitelinks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_language("en")
    }

    /// Create a new empty service indexing sitelinks of `language`.
    ///
    /// Title lookups only see sitelinks of this language. Pair it with a
    /// [`ResolverConfig`](crate::config::ResolverConfig) of the same
    /// language, or name-first resolution finds documents but no records.
    #[must_use]
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            state: RwLock::default(),
            calls: CallCounter::default(),
        }
    }

    /// Store a record, replacing any previous record with the same id.
    pub fn insert(&self, record: Record) -> Result<(), ServiceError> {
        let mut state = self.state.write().map_err(|_| lock_err("record.insert"))?;
        if let Some(title) = record.document_title(&self.language) {
            state
                .by_title
                .insert(normalize_key(title), record.id.clone());
        }
        for label in record.labels() {
            state
                .by_label
                .entry(normalize_key(label))
                .or_insert_with(|| record.id.clone());
        }
        state.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> ServiceCalls {
        self.calls.snapshot()
    }

    pub fn reset_calls(&self) {
        self.calls.reset();
    }

    /// Make every subsequent call fail with `ServiceError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.calls.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

impl RecordService for InMemoryRecordService {
    fn get_record_by_id(&self, id: &RecordId) -> Result<Option<Record>, ServiceError> {
        self.calls.single("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_id"))?;
        Ok(state.by_id.get(id).cloned())
    }

    fn get_records_by_ids(
        &self,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, ServiceError> {
        self.calls.batch("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_ids"))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.by_id.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    fn get_record_by_title(&self, title: &str) -> Result<Option<Record>, ServiceError> {
        self.calls.single("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_title"))?;
        Ok(state.by_title(title).cloned())
    }

    fn get_records_by_titles(
        &self,
        titles: &BTreeSet<String>,
    ) -> Result<HashMap<String, Record>, ServiceError> {
        self.calls.batch("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_titles"))?;
        Ok(titles
            .iter()
            .filter_map(|t| state.by_title(t).map(|r| (t.clone(), r.clone())))
            .collect())
    }

    fn get_record_by_label(&self, label: &str) -> Result<Option<Record>, ServiceError> {
        self.calls.single("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_label"))?;
        Ok(state.by_label(label).cloned())
    }

    fn get_records_by_labels(
        &self,
        labels: &BTreeSet<String>,
    ) -> Result<HashMap<String, Record>, ServiceError> {
        self.calls.batch("records")?;
        let state = self.state.read().map_err(|_| lock_err("record.get_by_labels"))?;
        Ok(labels
            .iter()
            .filter_map(|l| state.by_label(l).map(|r| (l.clone(), r.clone())))
            .collect())
    }
}
