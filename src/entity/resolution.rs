//! Single-entity resolution against the backing services.
//!
//! A [`Resolver`] bundles the two services with the collaborators that
//! interpret what they return (type classification and attribute
//! extraction) and the configuration. Every entity holds a shared handle
//! to the resolver it was built with.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::document::Document;
use crate::entity::attributes::{AttributeExtractor, PredicateVocabulary};
use crate::entity::type_tag::{InfoboxClassifier, TypeClassifier};
use crate::error::{FactResult, ValidationError};
use crate::record::{Record, RecordId};
use crate::service::{DocumentService, RecordService};

/// Outcome of resolving one entity. Both halves may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Document found by title or cross-reference.
    pub document: Option<Document>,
    /// Record found by id, title or label.
    pub record: Option<Record>,
}

impl Resolution {
    /// Returns true if either half was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.document.is_some() || self.record.is_some()
    }
}

/// Services, collaborators and configuration used to resolve entities.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use factlens::{InMemoryDocumentService, InMemoryRecordService, Resolver};
///
/// let resolver = Resolver::new(
///     Arc::new(InMemoryDocumentService::new()),
///     Arc::new(InMemoryRecordService::new()),
/// )
/// .into_shared();
/// assert_eq!(resolver.config().language, "en");
/// ```
#[derive(Clone)]
pub struct Resolver {
    documents: Arc<dyn DocumentService>,
    records: Arc<dyn RecordService>,
    classifier: Arc<dyn TypeClassifier>,
    extractor: Arc<dyn AttributeExtractor>,
    config: ResolverConfig,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver with the default classifier, extractor and config.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentService>, records: Arc<dyn RecordService>) -> Self {
        Self {
            documents,
            records,
            classifier: Arc::new(InfoboxClassifier::default()),
            extractor: Arc::new(PredicateVocabulary::default()),
            config: ResolverConfig::default(),
        }
    }

    /// Replaces the type classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn TypeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the attribute extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn AttributeExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: ResolverConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Wraps the resolver for sharing between entities.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn documents(&self) -> &dyn DocumentService {
        self.documents.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &dyn RecordService {
        self.records.as_ref()
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn TypeClassifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn extractor(&self) -> &dyn AttributeExtractor {
        self.extractor.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The document title a record cross-references in the configured language.
    #[must_use]
    pub fn cross_ref<'a>(&self, record: &'a Record) -> Option<&'a str> {
        record.document_title(&self.config.language)
    }

    /// Resolves one entity.
    ///
    /// With a known record id the record is fetched first and its
    /// cross-referenced document follows. Otherwise the document is fetched
    /// by name and the record by the document's canonical title, falling
    /// back to a label lookup when no document exists.
    pub fn resolve(&self, name: &str, record_id: Option<&RecordId>) -> FactResult<Resolution> {
        if let Some(id) = record_id {
            debug!(name, record_id = %id, "resolving by record id");
            let record = self.records.get_record_by_id(id)?;
            let document = match record.as_ref().and_then(|r| self.cross_ref(r)) {
                Some(title) => self.documents.get_document(title)?,
                None => None,
            };
            return Ok(Resolution { document, record });
        }

        debug!(name, "resolving by document name");
        let document = self.documents.get_document(name)?;
        let record = match &document {
            Some(doc) => self.records.get_record_by_title(&doc.title)?,
            None => {
                debug!(name, "no document, falling back to label");
                self.records.get_record_by_label(name)?
            }
        };
        Ok(Resolution { document, record })
    }
}
