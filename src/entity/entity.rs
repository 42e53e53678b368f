//! Lazily-resolved entities.
//!
//! An entity starts as a bare name (optionally with a known record id or
//! pre-fetched backing objects). Its document and record are resolved on
//! demand, the first time an attribute is asked for, and from then on the
//! entity answers attribute queries from its own mapping.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::describe::describe;
use crate::document::Document;
use crate::entity::attributes::Attributes;
use crate::entity::resolution::Resolver;
use crate::entity::type_tag::{capability_for, Capability, TypeTag};
use crate::error::{FactError, FactResult};
use crate::record::{Record, RecordId};
use crate::value::Value;

/// Shared, single-threaded handle to an entity.
///
/// Collections and caller code may hold the same entity; resolution
/// through any handle is visible through all of them.
pub type EntityRef = Rc<RefCell<Entity>>;

/// Members answered by the entity itself, never by its attributes.
const INTRINSIC_MEMBERS: [&str; 3] = ["name", "type_tag", "record_id"];

/// A named real-world entity backed by a document and a record.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use factlens::{Document, Entity, InMemoryDocumentService, InMemoryRecordService, Resolver};
///
/// let docs = Arc::new(InMemoryDocumentService::new());
/// docs.insert(Document::new("Paris", "{{Infobox settlement}}")).unwrap();
/// let resolver = Resolver::new(docs, Arc::new(InMemoryRecordService::new())).into_shared();
///
/// let mut paris = Entity::new(resolver, "Paris");
/// assert!(!paris.is_loaded());
/// assert_eq!(paris.get("population").unwrap(), None);
/// assert!(paris.is_loaded());
/// ```
pub struct Entity {
    name: String,
    document: Option<Document>,
    record: Option<Record>,
    record_id: Option<RecordId>,
    type_tag: Option<TypeTag>,
    attributes: Attributes,
    load_attempted: bool,
    resolver: Arc<Resolver>,
}

impl Entity {
    /// Creates an unresolved entity.
    #[must_use]
    pub fn new(resolver: Arc<Resolver>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document: None,
            record: None,
            record_id: None,
            type_tag: None,
            attributes: Attributes::new(),
            load_attempted: false,
            resolver,
        }
    }

    /// Creates an unresolved entity with a known record id.
    #[must_use]
    pub fn with_record_id(resolver: Arc<Resolver>, name: impl Into<String>, id: RecordId) -> Self {
        let mut entity = Self::new(resolver, name);
        entity.record_id = Some(id);
        entity
    }

    /// Starts building an entity with a known id or pre-fetched data.
    pub fn builder(resolver: Arc<Resolver>, name: impl Into<String>) -> EntityBuilder {
        EntityBuilder::new(resolver, name)
    }

    /// Builds and resolves an entity, keeping it only if it was found and,
    /// when `required` is given, carries that type tag.
    pub fn load_of_type(
        resolver: Arc<Resolver>,
        name: impl Into<String>,
        required: Option<&TypeTag>,
    ) -> FactResult<Option<Self>> {
        let entity = Self::builder(resolver, name).load(true).build()?;
        if !entity.is_loaded() {
            return Ok(None);
        }
        if let Some(required) = required {
            if entity.type_tag() != Some(required) {
                debug!(name = %entity.name(), %required, "type tag mismatch");
                return Ok(None);
            }
        }
        Ok(Some(entity))
    }

    /// Wraps the entity in a shared handle.
    #[must_use]
    pub fn shared(self) -> EntityRef {
        Rc::new(RefCell::new(self))
    }

    /// Canonical document title once loaded, the given name before.
    #[must_use]
    pub fn name(&self) -> &str {
        self.document
            .as_ref()
            .map_or(self.name.as_str(), |doc| doc.title.as_str())
    }

    /// The resolved document, if any.
    #[must_use]
    pub const fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The resolved record, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// The record id supplied at construction.
    #[must_use]
    pub const fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    /// The type tag derived from the document.
    #[must_use]
    pub const fn type_tag(&self) -> Option<&TypeTag> {
        self.type_tag.as_ref()
    }

    /// Attributes extracted so far, without resolving.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The resolver this entity loads through.
    #[must_use]
    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Loaded means a document or a record has been found.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.document.is_some() || self.record.is_some()
    }

    /// The capability granted by this entity's type tag, if typed.
    #[must_use]
    pub fn capability(&self) -> Option<&'static dyn Capability> {
        self.type_tag.as_ref().map(capability_for)
    }

    /// Resolves the entity unless it is already loaded. Returns whether it
    /// is loaded afterwards.
    pub fn load(&mut self) -> FactResult<bool> {
        if self.is_loaded() {
            return Ok(true);
        }
        self.reload()
    }

    /// Resolves the entity even if it is already loaded.
    ///
    /// A transport failure leaves the entity unattempted, so the next
    /// implicit access retries.
    pub fn reload(&mut self) -> FactResult<bool> {
        let name = self.name().to_string();
        let resolution = self.resolver.resolve(&name, self.record_id.as_ref())?;
        self.load_attempted = true;
        self.document = resolution.document;
        self.record = resolution.record;
        self.after_load();
        debug!(name = %name, loaded = self.is_loaded(), "entity resolved");
        Ok(self.is_loaded())
    }

    /// Reconciles the entity with externally fetched data.
    ///
    /// Unlike [`Entity::load`] this makes no service calls. Absent halves
    /// leave the current ones untouched.
    pub fn setup(&mut self, document: Option<Document>, record: Option<Record>) {
        self.load_attempted = true;
        let found = document.is_some() || record.is_some();
        if let Some(document) = document {
            self.document = Some(document);
        }
        if let Some(record) = record {
            self.record = Some(record);
        }
        if found {
            self.after_load();
        }
        trace!(name = %self.name(), found, "entity set up");
    }

    fn after_load(&mut self) {
        if self.type_tag.is_none() {
            if let Some(document) = &self.document {
                self.type_tag = self.resolver.classifier().derive(document);
            }
        }
        if let Some(record) = &self.record {
            let extracted = self.resolver.extractor().extract(record);
            self.attributes.merge(extracted);
        }
    }

    /// Implicit resolution happens at most once per entity.
    fn ensure_loaded(&mut self) -> FactResult<()> {
        if !self.is_loaded() && !self.load_attempted {
            self.load()?;
        }
        Ok(())
    }

    /// Returns true if `name` can be asked for with [`Entity::get`].
    #[must_use]
    pub fn responds_to(&self, name: &str) -> bool {
        !self.resolver.config().is_reserved(name)
    }

    /// Looks up a member by name, resolving the entity first if needed.
    ///
    /// Intrinsic members (`name`, `type_tag`, `record_id`) are answered
    /// without resolving. After resolution, members of the type tag's
    /// capability shadow attributes of the same name. Unknown attributes
    /// are `None`. Reserved names fail with [`FactError::NoSuchMember`].
    pub fn get(&mut self, name: &str) -> FactResult<Option<Value>> {
        if !self.responds_to(name) {
            return Err(FactError::no_such_member(name));
        }
        if let Some(value) = self.intrinsic(name) {
            return Ok(value);
        }

        self.ensure_loaded()?;

        if let Some(capability) = self.capability().filter(|c| c.has_member(name)) {
            return Ok(capability.evaluate(name, &self.attributes));
        }
        Ok(self.attributes.get(name).cloned())
    }

    fn intrinsic(&self, name: &str) -> Option<Option<Value>> {
        if !INTRINSIC_MEMBERS.contains(&name) {
            return None;
        }
        Some(match name {
            "name" => Some(Value::from(self.name())),
            "type_tag" => self.type_tag.as_ref().map(|t| Value::from(t.to_string())),
            _ => self
                .record_id
                .as_ref()
                .or_else(|| self.record.as_ref().map(|r| &r.id))
                .map(|id| Value::from(id.as_str())),
        })
    }

    /// Reads an attribute without triggering resolution.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Structured projection: `name` plus every attribute as plain JSON.
    pub fn to_structured(&mut self) -> FactResult<serde_json::Map<String, serde_json::Value>> {
        self.ensure_loaded()?;
        let mut map: serde_json::Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_simple()))
            .collect();
        map.insert(
            "name".to_string(),
            serde_json::Value::String(self.name().to_string()),
        );
        Ok(map)
    }

    /// Resolves if needed and serializes [`Entity::to_structured`].
    pub fn to_json(&mut self) -> FactResult<String> {
        Ok(serde_json::to_string(&self.to_structured()?)?)
    }

    /// Developer-facing form: `#<Entity(Paris):city>`, `#<Entity?(Atlantis)>`.
    #[must_use]
    pub fn inspect(&self) -> String {
        let marker = if self.is_loaded() { "" } else { "?" };
        match &self.type_tag {
            Some(tag) => format!("#<Entity{marker}({}):{tag}>", self.name()),
            None => format!("#<Entity{marker}({})>", self.name()),
        }
    }

    /// Multi-line description of the entity and its attributes.
    pub fn describe(&mut self) -> FactResult<String> {
        self.ensure_loaded()?;
        let rows: Vec<(String, String)> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(describe(&self.inspect(), &rows))
    }
}

impl fmt::Display for Entity {
    /// Quotes names containing a comma and marks unresolved entities with `?`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if name.contains(',') {
            write!(f, "\"{name}\"")?;
        } else {
            f.write_str(name)?;
        }
        if !self.is_loaded() {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name())
            .field("loaded", &self.is_loaded())
            .field("type_tag", &self.type_tag)
            .field("record_id", &self.record_id)
            .field("attributes", &self.attributes.len())
            .finish_non_exhaustive()
    }
}

/// Builder for entities with a known id or pre-fetched backing data.
///
/// # Example
/// ```rust,ignore
/// let paris = Entity::builder(resolver, "Paris")
///     .record_id(RecordId::new("Q90")?)
///     .load(true)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct EntityBuilder {
    resolver: Arc<Resolver>,
    name: String,
    document: Option<Document>,
    record: Option<Record>,
    record_id: Option<RecordId>,
    load: bool,
}

impl EntityBuilder {
    fn new(resolver: Arc<Resolver>, name: impl Into<String>) -> Self {
        Self {
            resolver,
            name: name.into(),
            document: None,
            record: None,
            record_id: None,
            load: false,
        }
    }

    /// Pre-fetched document.
    #[must_use]
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Pre-fetched record.
    #[must_use]
    pub fn record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Known structured-store id, used as a resolution shortcut.
    #[must_use]
    pub fn record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Resolve immediately on build (default: false).
    #[must_use]
    pub const fn load(mut self, load: bool) -> Self {
        self.load = load;
        self
    }

    /// Build the entity.
    ///
    /// Pre-fetched data is processed right away; otherwise the entity is
    /// resolved now only if requested.
    pub fn build(self) -> FactResult<Entity> {
        let mut entity = Entity::new(self.resolver, self.name);
        entity.record_id = self.record_id;
        if self.document.is_some() || self.record.is_some() {
            entity.setup(self.document, self.record);
        } else if self.load {
            entity.load()?;
        }
        Ok(entity)
    }
}
