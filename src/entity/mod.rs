//! Entity layer modules.
//!
//! This module groups the entity itself, its type tags and capabilities,
//! attribute extraction, and single-entity resolution.

pub mod attributes;
pub mod entity;
pub mod resolution;
pub mod type_tag;

pub use attributes::{attribute_name, AttributeExtractor, Attributes, PredicateVocabulary};
pub use entity::{Entity, EntityBuilder, EntityRef};
pub use resolution::{Resolution, Resolver};
pub use type_tag::{capability_for, Capability, InfoboxClassifier, TypeClassifier, TypeTag};
