//! # factlens - Lazily-resolved real-world entities
//!
//! factlens models people, places and concepts backed by two services: a
//! free-text document service (encyclopedia pages) and a structured fact
//! store (records of predicate/value claims). Entities defer every service
//! call until an attribute is actually asked for, and collections resolve
//! many entities at once with a small, fixed number of batched requests.
//!
//! ## Core Concepts
//!
//! - **Entity**: a name plus an optional document, record and record id;
//!   resolves itself on first attribute access
//! - **Resolver**: the services and collaborators an entity resolves through
//! - **TypeTag**: a classifier derived from the document, granting computed
//!   members through a [`Capability`]
//! - **EntityCollection**: an ordered list of entities (or nil) with
//!   batched resolution and type-preserving transforms
//!
//! ## Usage
//!
//! ```rust,ignore
//! use factlens::{Entity, EntityCollection, Resolver, TypeTag, Value};
//!
//! let resolver = Resolver::new(documents, records).into_shared();
//!
//! // A single entity loads on first access.
//! let mut paris = Entity::new(resolver.clone(), "Paris");
//! let population = paris.get("population")?;
//!
//! // A collection loads all members in at most four requests.
//! let cities = EntityCollection::from_names(resolver, ["Paris", "Berlin", "Rome"]);
//! cities.load()?;
//! println!("{}", cities.describe()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collection;
pub mod config;
mod describe;
pub mod document;
pub mod entity;
pub mod error;
pub mod record;
pub mod service;
pub mod value;

// Re-export primary types at crate root for convenience
pub use collection::{CollectionSummary, EntityCollection, Item, Projected};
pub use config::ResolverConfig;
pub use document::Document;
pub use entity::{
    capability_for, AttributeExtractor, Attributes, Capability, Entity, EntityBuilder, EntityRef,
    InfoboxClassifier, PredicateVocabulary, Resolution, Resolver, TypeClassifier, TypeTag,
};
pub use error::{FactError, FactResult, ServiceError, ValidationError};
pub use record::{Claim, Record, RecordId};
pub use service::{
    DocumentService, InMemoryDocumentService, InMemoryRecordService, RecordService, ServiceCalls,
};
pub use value::{EntityLink, Value};
