//! Cross-collection references and their resolution.
//!
//! A [`Link`] is a value-typed pointer `(collection, id)` — a lookup key,
//! never an owning reference.  Deleting the row it points at does not
//! cascade; resolution simply stops finding it.
//!
//! [`Resolver`] is the typed half: bound at compile time to an [`Entity`]
//! (and through it to a collection name), it turns links into materialized
//! rows by scanning the target collection.  Resolving a link through the
//! wrong collection's resolver is a programmer error and fails loudly.

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;
use tracing::debug;

use crate::record::{Record, Value};
use crate::store::{Store, StoreError};

#[derive(Error, Debug)]
pub enum LinkError {
    /// A link for one collection was handed to another collection's
    /// resolver.  Config/programmer error — never recoverable at runtime.
    #[error("expected a link into {expected:?}, got one into {found:?}")]
    MismatchedCollection { expected: String, found: String },
}

// ── Link ─────────────────────────────────────────────────────────────────────

/// An immutable `(collection, id)` pair.  Textual form is `collection:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub collection: String,
    pub id: String,
}

impl Link {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self { collection: collection.into(), id: id.into() }
    }

    /// Parse `collection:id`; the first `:` splits, the id keeps the rest.
    pub fn parse(s: &str) -> Option<Self> {
        let (collection, id) = s.split_once(':')?;
        Some(Self::new(collection, id))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection, self.id)
    }
}

/// Links serialize as their textual form, matching the stored grammar.
impl serde::Serialize for Link {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Entity ───────────────────────────────────────────────────────────────────

/// A typed row in one collection.
///
/// `from_record` returns `None` for rows that do not decode into the entity
/// shape; resolution treats such rows as absent rather than failing the
/// whole scan.
pub trait Entity: Sized {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn from_record(record: &Record) -> Option<Self>;
    fn to_record(&self) -> Record;
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Per-collection link resolver, bound to an entity type and a store.
pub struct Resolver<'s, T: Entity> {
    store: &'s Store,
    _entity: PhantomData<T>,
}

impl<'s, T: Entity> Resolver<'s, T> {
    pub fn new(store: &'s Store) -> Self {
        Self { store, _entity: PhantomData }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Build a link into this resolver's collection.
    pub fn to_link(&self, id: &str) -> Link {
        Link::new(T::COLLECTION, id)
    }

    /// Load and decode every row of the collection.  Rows that do not
    /// decode are skipped.
    pub fn load_all(&self) -> Result<Vec<T>, StoreError> {
        let records = self.store.load(T::COLLECTION)?;
        Ok(records.iter().filter_map(T::from_record).collect())
    }

    /// Replace the whole collection with `items`.
    pub fn save_all(&self, items: &[T]) -> Result<(), StoreError> {
        let records: Vec<Record> = items.iter().map(T::to_record).collect();
        self.store.save(T::COLLECTION, &records)
    }

    /// Resolve one link to its target row.
    ///
    /// Returns `Ok(None)` when the id is absent — a missing target is data,
    /// not an error.  A link into a different collection is
    /// [`LinkError::MismatchedCollection`].
    pub fn resolve(&self, link: &Link) -> Result<Option<T>, StoreError> {
        if link.collection != T::COLLECTION {
            return Err(LinkError::MismatchedCollection {
                expected: T::COLLECTION.to_string(),
                found: link.collection.clone(),
            }
            .into());
        }

        let records = self.store.load(T::COLLECTION)?;
        let hit = records
            .iter()
            .find(|rec| rec.get("id").and_then(Value::as_str) == Some(link.id.as_str()));

        match hit {
            Some(rec) => {
                let entity = T::from_record(rec);
                if entity.is_none() {
                    debug!(collection = T::COLLECTION, id = %link.id, "row found but does not decode");
                }
                Ok(entity)
            }
            None => Ok(None),
        }
    }

    /// Resolve a batch, silently dropping links whose target is missing.
    /// Relative order of the survivors is preserved.  Callers that need to
    /// know about the missing ones must pre-check with [`Resolver::resolve`].
    pub fn resolve_many(&self, links: &[Link]) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::with_capacity(links.len());
        for link in links {
            if let Some(item) = self.resolve(link)? {
                out.push(item);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_form_roundtrip() {
        let link = Link::new("books", "b1");
        assert_eq!(link.to_string(), "books:b1");
        assert_eq!(Link::parse("books:b1"), Some(link));
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let link = Link::parse("books:odd:id").unwrap();
        assert_eq!(link.collection, "books");
        assert_eq!(link.id, "odd:id");
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert_eq!(Link::parse("no colon here"), None);
    }

    #[test]
    fn serializes_as_textual_form() {
        let json = serde_json::to_string(&Link::new("books", "b1")).unwrap();
        assert_eq!(json, r#""books:b1""#);
    }
}
