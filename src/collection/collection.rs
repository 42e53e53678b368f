//! Ordered collections of entities.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::collection::batch::load_members;
use crate::collection::summary::CollectionSummary;
use crate::entity::{Entity, EntityRef, Resolver};
use crate::error::{FactResult, ValidationError};
use crate::value::Value;

/// One input element of a collection, or one output element of a projection.
#[derive(Debug, Clone)]
pub enum Item {
    /// A name, coerced into an unresolved entity.
    Name(String),
    /// An entity, passed through.
    Entity(EntityRef),
    /// A placeholder for a missing entity.
    Nil,
    /// An attribute value; strings, entity links and null coerce, the rest
    /// cannot.
    Value(Value),
}

impl From<&str> for Item {
    fn from(v: &str) -> Self {
        Self::Name(v.to_string())
    }
}

impl From<String> for Item {
    fn from(v: String) -> Self {
        Self::Name(v)
    }
}

impl From<EntityRef> for Item {
    fn from(v: EntityRef) -> Self {
        Self::Entity(v)
    }
}

impl From<Entity> for Item {
    fn from(v: Entity) -> Self {
        Self::Entity(v.shared())
    }
}

impl From<Option<EntityRef>> for Item {
    fn from(v: Option<EntityRef>) -> Self {
        v.map_or(Self::Nil, Self::Entity)
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// Result of [`EntityCollection::project`]: a collection when every
/// projected item is an entity or nil, a plain sequence otherwise.
#[derive(Debug)]
pub enum Projected {
    /// Every item was an entity or nil.
    Collection(EntityCollection),
    /// At least one item was a plain value.
    Sequence(Vec<Item>),
}

impl Projected {
    /// Returns true if the projection kept the collection type.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// The collection, if the projection kept the collection type.
    #[must_use]
    pub fn into_collection(self) -> Option<EntityCollection> {
        match self {
            Self::Collection(c) => Some(c),
            Self::Sequence(_) => None,
        }
    }
}

/// An ordered sequence of entities and nil placeholders that resolves
/// its members in batches.
///
/// The collection does not own its entities exclusively: members are
/// shared handles that callers and other collections may also hold.
/// Transforms that keep members as entities (or nil) return a new
/// collection over the same handles.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use factlens::{EntityCollection, InMemoryDocumentService, InMemoryRecordService, Resolver};
///
/// let resolver = Resolver::new(
///     Arc::new(InMemoryDocumentService::new()),
///     Arc::new(InMemoryRecordService::new()),
/// )
/// .into_shared();
///
/// let cities = EntityCollection::from_names(resolver, ["Paris", "Berlin"]);
/// assert_eq!(cities.len(), 2);
/// assert_eq!(cities.to_string(), "[Paris?, Berlin?]");
/// ```
#[derive(Debug, Clone)]
pub struct EntityCollection {
    resolver: Arc<Resolver>,
    members: Vec<Option<EntityRef>>,
}

impl EntityCollection {
    /// Builds a collection, coercing every item.
    ///
    /// Fails on the first item that cannot become an entity or nil; no
    /// collection is produced in that case.
    pub fn new<I, T>(resolver: Arc<Resolver>, items: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        let members = items
            .into_iter()
            .map(|item| coerce(&resolver, item.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { resolver, members })
    }

    /// Builds a collection of unresolved entities.
    pub fn from_names<I, S>(resolver: Arc<Resolver>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = names
            .into_iter()
            .map(|name| Some(Entity::new(resolver.clone(), name).shared()))
            .collect();
        Self { resolver, members }
    }

    /// Builds a collection from attribute values (e.g. a list of linked
    /// entities).
    pub fn from_values(resolver: Arc<Resolver>, values: &[Value]) -> Result<Self, ValidationError> {
        Self::new(resolver, values.iter().cloned().map(Item::Value))
    }

    /// Wraps existing members without coercion.
    #[must_use]
    pub fn from_members(resolver: Arc<Resolver>, members: Vec<Option<EntityRef>>) -> Self {
        Self { resolver, members }
    }

    fn rewrap(&self, members: Vec<Option<EntityRef>>) -> Self {
        Self::from_members(self.resolver.clone(), members)
    }

    /// The resolver used to coerce new names.
    #[must_use]
    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    #[must_use]
    pub fn members(&self) -> &[Option<EntityRef>] {
        &self.members
    }

    #[must_use]
    pub fn into_members(self) -> Vec<Option<EntityRef>> {
        self.members
    }

    /// Number of members, nil included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The entity at `index`; `None` when out of range or nil.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EntityRef> {
        self.members.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Option<EntityRef>> {
        self.members.iter()
    }

    /// Non-nil members.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.members.iter().flatten()
    }

    /// Coerces and appends one item.
    pub fn push(&mut self, item: impl Into<Item>) -> Result<(), ValidationError> {
        let member = coerce(&self.resolver, item.into())?;
        self.members.push(member);
        Ok(())
    }

    /// Returns true if every non-nil member is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.entities().all(|e| e.borrow().is_loaded())
    }

    /// Resolves all unloaded members in batches. Returns how many members
    /// are loaded afterwards.
    ///
    /// Each member resolves through the resolver it was built on, so a
    /// collection mixing resolvers costs one batch round per resolver.
    pub fn load(&self) -> FactResult<usize> {
        load_members(&self.members)?;
        Ok(self.entities().filter(|e| e.borrow().is_loaded()).count())
    }

    /// Loads unloaded members, then summarises type tags and attribute keys.
    pub fn describe(&self) -> FactResult<CollectionSummary> {
        if !self.is_loaded() {
            self.load()?;
        }
        Ok(CollectionSummary::of(self))
    }

    // Type-preserving transforms.

    /// Members for which `predicate` holds.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Option<EntityRef>) -> bool,
    {
        self.rewrap(self.members.iter().filter(|m| predicate(*m)).cloned().collect())
    }

    /// Members for which `predicate` does not hold.
    #[must_use]
    pub fn reject<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Option<EntityRef>) -> bool,
    {
        self.filter(|m| !predicate(m))
    }

    /// Drops nil members.
    #[must_use]
    pub fn compact(&self) -> Self {
        self.filter(Option::is_some)
    }

    /// Members not present in `other`. Entities compare by identity.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.reject(|m| {
            other.members.iter().any(|o| match (m, o) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            })
        })
    }

    /// Maps members to members.
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Option<EntityRef>) -> Option<EntityRef>,
    {
        self.rewrap(self.members.iter().map(f).collect())
    }

    /// Maps members to items, re-wrapping as a collection only when every
    /// result is an entity or nil.
    pub fn project<F>(&self, f: F) -> Projected
    where
        F: FnMut(&Option<EntityRef>) -> Item,
    {
        let items: Vec<Item> = self.members.iter().map(f).collect();
        if items
            .iter()
            .all(|i| matches!(i, Item::Entity(_) | Item::Nil))
        {
            let members = items
                .into_iter()
                .map(|i| match i {
                    Item::Entity(e) => Some(e),
                    _ => None,
                })
                .collect();
            Projected::Collection(self.rewrap(members))
        } else {
            Projected::Sequence(items)
        }
    }

    /// Maps members to arbitrary values, yielding a plain sequence.
    pub fn map_values<T, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(&Option<EntityRef>) -> T,
    {
        self.members.iter().map(f).collect()
    }

    /// Stable sort by a key extracted from each member.
    #[must_use]
    pub fn sort_by_key<K, F>(&self, mut f: F) -> Self
    where
        K: Ord,
        F: FnMut(&Option<EntityRef>) -> K,
    {
        let mut members = self.members.clone();
        members.sort_by_key(|m| f(m));
        self.rewrap(members)
    }

    /// Sorts by display name, nil members last.
    #[must_use]
    pub fn sort_by_name(&self) -> Self {
        self.sort_by_key(|m| match m {
            Some(e) => (0, e.borrow().name().to_string()),
            None => (1, String::new()),
        })
    }

    #[must_use]
    pub fn first(&self) -> Option<&Option<EntityRef>> {
        self.members.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Option<EntityRef>> {
        self.members.last()
    }

    /// The first `n` members.
    #[must_use]
    pub fn first_n(&self, n: usize) -> Self {
        self.rewrap(self.members.iter().take(n).cloned().collect())
    }

    /// The last `n` members, in order.
    #[must_use]
    pub fn last_n(&self, n: usize) -> Self {
        let start = self.members.len().saturating_sub(n);
        self.rewrap(self.members[start..].to_vec())
    }

    /// Up to `n` distinct members chosen at random.
    #[must_use]
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Self {
        self.rewrap(self.members.choose_multiple(rng, n).cloned().collect())
    }

    /// All members in random order.
    #[must_use]
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut members = self.members.clone();
        members.shuffle(rng);
        self.rewrap(members)
    }
}

fn coerce(resolver: &Arc<Resolver>, item: Item) -> Result<Option<EntityRef>, ValidationError> {
    match item {
        Item::Name(name) => Ok(Some(Entity::new(resolver.clone(), name).shared())),
        Item::Entity(entity) => Ok(Some(entity)),
        Item::Nil | Item::Value(Value::Null) => Ok(None),
        Item::Value(Value::String(name)) => Ok(Some(Entity::new(resolver.clone(), name).shared())),
        Item::Value(Value::Entity(link)) => {
            let entity = match link.record_id {
                Some(id) => Entity::with_record_id(resolver.clone(), link.name, id),
                None => Entity::new(resolver.clone(), link.name),
            };
            Ok(Some(entity.shared()))
        }
        Item::Value(other) => Err(ValidationError::CannotCoerce {
            value: other.to_string(),
        }),
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Option<EntityRef>;
    type IntoIter = std::slice::Iter<'a, Option<EntityRef>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl PartialEq for EntityCollection {
    /// Same members in the same order; entities compare by identity.
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| match (a, b) {
                    (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                    (None, None) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match member {
                Some(entity) => write!(f, "{}", entity.borrow())?,
                None => write!(f, "nil")?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::document::Document;
    use crate::record::{Record, RecordId};
    use crate::service::{InMemoryDocumentService, InMemoryRecordService};
    use crate::value::EntityLink;

    fn resolver() -> Arc<Resolver> {
        let docs = Arc::new(InMemoryDocumentService::new());
        let records = Arc::new(InMemoryRecordService::new());
        docs.insert(Document::new("Paris", "{{Infobox settlement}}")).unwrap();
        records
            .insert(
                Record::new(RecordId::new("Q90").unwrap())
                    .with_label("Paris")
                    .with_sitelink("en", "Paris")
                    .with_claim("population", 2_102_650),
            )
            .unwrap();
        Resolver::new(docs, records).into_shared()
    }

    fn names(c: &EntityCollection) -> Vec<String> {
        c.map_values(|m| m.as_ref().map_or("nil".to_string(), |e| e.borrow().name().to_string()))
    }

    #[test]
    fn test_new_coerces_items() {
        let r = resolver();
        let berlin = Entity::new(r.clone(), "Berlin").shared();
        let c = EntityCollection::new(
            r,
            vec![Item::from("Paris"), Item::from(berlin.clone()), Item::Nil],
        )
        .unwrap();
        assert_eq!(c.len(), 3);
        assert!(Rc::ptr_eq(c.get(1).unwrap(), &berlin));
        assert!(c.get(2).is_none());
    }

    #[test]
    fn test_new_rejects_uncoercible_item() {
        let r = resolver();
        let err = EntityCollection::new(
            r,
            vec![Item::from("Paris"), Item::Value(Value::Int(42))],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::CannotCoerce { ref value } if value == "42"));
    }

    #[test]
    fn test_from_values() {
        let r = resolver();
        let values = vec![
            Value::from("Paris"),
            Value::Entity(EntityLink::with_id("Berlin", RecordId::new("Q64").unwrap())),
            Value::Null,
        ];
        let c = EntityCollection::from_values(r.clone(), &values).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(
            c.get(1).unwrap().borrow().record_id(),
            Some(&RecordId::new("Q64").unwrap())
        );

        assert!(EntityCollection::from_values(r, &[Value::Bool(true)]).is_err());
    }

    #[test]
    fn test_identity_map_preserves_collection() {
        let c = EntityCollection::from_names(resolver(), ["Paris", "Berlin"]);
        let mapped = c.map(Clone::clone);
        assert_eq!(mapped, c);
    }

    #[test]
    fn test_compact_drops_nil() {
        let r = resolver();
        let c = EntityCollection::new(r, vec![Item::from("Paris"), Item::Nil]).unwrap();
        let compacted = c.compact();
        assert_eq!(compacted.len(), 1);
        assert_eq!(c.filter(Option::is_some).len(), 1);
    }

    #[test]
    fn test_project_keeps_collection_for_entities() {
        let c = EntityCollection::from_names(resolver(), ["Paris", "Berlin"]);
        let projected = c.project(|m| Item::from(m.clone()));
        assert!(projected.is_collection());
        assert_eq!(projected.into_collection().unwrap(), c);
    }

    #[test]
    fn test_project_falls_back_to_sequence() {
        let c = EntityCollection::from_names(resolver(), ["Paris", "Berlin"]);
        let projected = c.project(|m| {
            Item::Value(Value::from(
                m.as_ref().map_or(String::new(), |e| e.borrow().name().to_string()),
            ))
        });
        match projected {
            Projected::Sequence(items) => assert_eq!(items.len(), 2),
            Projected::Collection(_) => panic!("expected a plain sequence"),
        }
    }

    #[test]
    fn test_sort_by_name_puts_nil_last() {
        let r = resolver();
        let c = EntityCollection::new(r, vec![Item::Nil, Item::from("Zurich"), Item::from("Athens")])
            .unwrap();
        assert_eq!(names(&c.sort_by_name()), vec!["Athens", "Zurich", "nil"]);
    }

    #[test]
    fn test_difference_by_identity() {
        let r = resolver();
        let paris = Entity::new(r.clone(), "Paris").shared();
        let other_paris = Entity::new(r.clone(), "Paris").shared();
        let c = EntityCollection::new(r.clone(), vec![paris.clone(), other_paris]).unwrap();
        let removed = EntityCollection::new(r, vec![paris]).unwrap();
        assert_eq!(c.difference(&removed).len(), 1);
    }

    #[test]
    fn test_slicing() {
        let c = EntityCollection::from_names(resolver(), ["A", "B", "C", "D"]);
        assert_eq!(names(&c.first_n(2)), vec!["A", "B"]);
        assert_eq!(names(&c.last_n(3)), vec!["B", "C", "D"]);
        assert_eq!(c.last_n(10).len(), 4);
        assert_eq!(c.first().unwrap().as_ref().unwrap().borrow().name(), "A");
    }

    #[test]
    fn test_sample_and_shuffle_keep_members() {
        let c = EntityCollection::from_names(resolver(), ["A", "B", "C", "D"]);
        let mut rng = StdRng::seed_from_u64(7);

        let sample = c.sample(2, &mut rng);
        assert_eq!(sample.len(), 2);
        for member in sample.entities() {
            assert!(c.entities().any(|e| Rc::ptr_eq(e, member)));
        }

        let mut shuffled = names(&c.shuffle(&mut rng));
        shuffled.sort();
        assert_eq!(shuffled, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_load_counts_loaded_members() {
        let r = resolver();
        let c = EntityCollection::new(r, vec![Item::from("Paris"), Item::from("Atlantis"), Item::Nil])
            .unwrap();
        assert_eq!(c.load().unwrap(), 1);
        assert!(!c.is_loaded());
    }

    #[test]
    fn test_display() {
        let r = resolver();
        let c = EntityCollection::new(
            r,
            vec![Item::from("Paris"), Item::from("Washington, D.C."), Item::Nil],
        )
        .unwrap();
        c.load().unwrap();
        assert_eq!(c.to_string(), "[Paris, \"Washington, D.C.\"?, nil]");
    }

    #[test]
    fn test_push_coerces() {
        let mut c = EntityCollection::from_names(resolver(), ["Paris"]);
        c.push("Berlin").unwrap();
        assert!(c.push(Value::Float(1.5)).is_err());
        assert_eq!(c.len(), 2);
    }
}
