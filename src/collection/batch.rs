//! Batched resolution of many entities.
//!
//! Members are resolved in two ordered passes:
//!
//! 1. Identity pass. Members with a known record id are resolved id-first
//!    (record, then its cross-referenced document); the rest name-first
//!    (document, then the record keyed by the document's canonical title).
//! 2. Label pass. Members still unloaded are looked up as record labels.
//!
//! The id-keyed record fetch runs before the shared document fetch, so
//! names and cross-references travel in a single document request. The
//! whole load costs at most four service calls per resolver whatever the
//! member count, and any call whose key set is empty is skipped. Members
//! built on different resolvers are resolved through their own.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::entity::{EntityRef, Resolver};
use crate::error::FactResult;
use crate::record::{Record, RecordId};

/// Unloaded members, each entity once even if it appears repeatedly.
fn unloaded(members: &[Option<EntityRef>]) -> Vec<EntityRef> {
    let mut seen = HashSet::new();
    members
        .iter()
        .flatten()
        .filter(|e| !e.borrow().is_loaded())
        .filter(|e| seen.insert(Rc::as_ptr(*e)))
        .cloned()
        .collect()
}

/// Groups entities by the resolver they were built on, in first-seen order.
fn by_resolver(entities: Vec<EntityRef>) -> Vec<(Arc<Resolver>, Vec<EntityRef>)> {
    let mut groups: Vec<(Arc<Resolver>, Vec<EntityRef>)> = Vec::new();
    for entity in entities {
        let resolver = entity.borrow().resolver().clone();
        match groups.iter_mut().find(|(r, _)| Arc::ptr_eq(r, &resolver)) {
            Some((_, group)) => group.push(entity),
            None => groups.push((resolver, vec![entity])),
        }
    }
    groups
}

/// Runs both passes over `members`, once per distinct resolver.
pub(crate) fn load_members(members: &[Option<EntityRef>]) -> FactResult<()> {
    let groups = by_resolver(unloaded(members));
    if groups.len() > 1 {
        debug!(resolvers = groups.len(), "members span several resolvers");
    }
    for (resolver, group) in groups {
        let (by_id, by_name): (Vec<EntityRef>, Vec<EntityRef>) = group
            .iter()
            .cloned()
            .partition(|e| e.borrow().record_id().is_some());

        load_by_identity(&resolver, &by_name, &by_id)?;

        let remaining: Vec<EntityRef> = group
            .into_iter()
            .filter(|e| !e.borrow().is_loaded())
            .collect();
        load_by_labels(&resolver, &remaining)?;
    }
    Ok(())
}

fn load_by_identity(
    resolver: &Resolver,
    by_name: &[EntityRef],
    by_id: &[EntityRef],
) -> FactResult<()> {
    if by_name.is_empty() && by_id.is_empty() {
        return Ok(());
    }

    let ids: BTreeSet<RecordId> = by_id
        .iter()
        .filter_map(|e| e.borrow().record_id().cloned())
        .collect();
    let records_by_id: HashMap<RecordId, Record> = if ids.is_empty() {
        HashMap::new()
    } else {
        resolver.records().get_records_by_ids(&ids)?
    };
    debug!(requested = ids.len(), found = records_by_id.len(), "records fetched by id");

    let names: BTreeSet<String> = by_name.iter().map(|e| e.borrow().name().to_string()).collect();
    let mut titles = names.clone();
    titles.extend(
        records_by_id
            .values()
            .filter_map(|r| resolver.cross_ref(r))
            .map(ToString::to_string),
    );
    let documents: HashMap<String, Document> = if titles.is_empty() {
        HashMap::new()
    } else {
        resolver.documents().get_documents(&titles)?
    };
    debug!(requested = titles.len(), found = documents.len(), "documents fetched");

    let canonical: BTreeSet<String> = names
        .iter()
        .filter_map(|name| documents.get(name))
        .map(|doc| doc.title.clone())
        .collect();
    let records_by_title: HashMap<String, Record> = if canonical.is_empty() {
        HashMap::new()
    } else {
        resolver.records().get_records_by_titles(&canonical)?
    };
    debug!(
        requested = canonical.len(),
        found = records_by_title.len(),
        "records fetched by title"
    );

    for entity in by_name {
        let name = entity.borrow().name().to_string();
        let document = documents.get(&name).cloned();
        let record = document
            .as_ref()
            .and_then(|doc| records_by_title.get(&doc.title))
            .cloned();
        entity.borrow_mut().setup(document, record);
    }

    for entity in by_id {
        let record = entity
            .borrow()
            .record_id()
            .and_then(|id| records_by_id.get(id))
            .cloned();
        let document = record
            .as_ref()
            .and_then(|r| resolver.cross_ref(r))
            .and_then(|title| documents.get(title))
            .cloned();
        entity.borrow_mut().setup(document, record);
    }
    Ok(())
}

fn load_by_labels(resolver: &Resolver, entities: &[EntityRef]) -> FactResult<()> {
    if entities.is_empty() {
        return Ok(());
    }

    let labels: BTreeSet<String> = entities
        .iter()
        .map(|e| e.borrow().name().to_string())
        .collect();
    let records = resolver.records().get_records_by_labels(&labels)?;
    debug!(requested = labels.len(), found = records.len(), "records fetched by label");

    for entity in entities {
        let record = records.get(entity.borrow().name()).cloned();
        entity.borrow_mut().setup(None, record);
    }
    Ok(())
}
