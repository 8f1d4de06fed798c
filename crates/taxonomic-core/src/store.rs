//! Generic create/read/update/delete/search over one kind of record.
//!
//! A [`Collection`] is an ordered, in-memory set of records sharing a typed
//! identifier. It knows nothing about tags or items; the registries layer
//! domain rules on top of it.

use tracing::error;

/// A record that can live in a [`Collection`].
pub trait Record: Clone {
    /// Typed identifier for this record kind.
    type Id: Copy + Eq + Into<u64>;

    fn id(&self) -> Self::Id;

    /// Searchable string fields, in declaration order.
    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        Vec::new()
    }
}

/// Errors from the collection layer.
///
/// `NotFound` from [`Collection::update`] or [`Collection::remove`] means the
/// caller addressed a record that does not exist, a bug in the caller, not a
/// reachable user scenario. `Duplicate` is a recoverable uniqueness violation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no record with id {0}")]
    NotFound(u64),

    #[error("{0} must be unique")]
    Duplicate(&'static str),
}

/// A field-level search hit: the first field of a record that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<T> {
    pub field: &'static str,
    pub record: T,
}

/// An ordered in-memory collection of one kind of record.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    rows: Vec<T>,
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.rows.clone()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Highest raw id present, if any. Used to re-seat the id generator
    /// after a restore.
    pub fn highest_id(&self) -> Option<u64> {
        self.rows.iter().map(|row| row.id().into()).max()
    }

    /// Append a record whose id has already been assigned.
    pub fn insert(&mut self, row: T) -> T {
        self.rows.push(row.clone());
        row
    }

    /// Append a record unless an existing row conflicts with it. On a
    /// conflict nothing is mutated and `keys` names the violated constraint.
    pub fn insert_unique(
        &mut self,
        row: T,
        keys: &'static str,
        conflicts: impl Fn(&T) -> bool,
    ) -> Result<T, StoreError> {
        if self.rows.iter().any(|existing| conflicts(existing)) {
            return Err(StoreError::Duplicate(keys));
        }
        self.rows.push(row.clone());
        Ok(row)
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    /// All records matching the predicate, in insertion order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<&T> {
        self.rows.iter().filter(|row| pred(row)).collect()
    }

    /// Merge a patch onto the record with the given id.
    pub fn update(&mut self, id: T::Id, apply: impl FnOnce(&mut T)) -> Result<T, StoreError> {
        match self.rows.iter_mut().find(|row| row.id() == id) {
            Some(row) => {
                apply(row);
                Ok(row.clone())
            }
            None => {
                let raw: u64 = id.into();
                error!(id = raw, "can't update a record that doesn't exist");
                Err(StoreError::NotFound(raw))
            }
        }
    }

    /// Remove and return the record with the given id.
    pub fn remove(&mut self, id: T::Id) -> Result<T, StoreError> {
        match self.rows.iter().position(|row| row.id() == id) {
            Some(index) => Ok(self.rows.remove(index)),
            None => {
                let raw: u64 = id.into();
                error!(id = raw, "can't remove a record that doesn't exist");
                Err(StoreError::NotFound(raw))
            }
        }
    }

    /// For each record, the first field containing `query` as a
    /// case-insensitive substring. `fields` restricts the scan to a subset of
    /// the record's text fields. An empty query matches nothing.
    pub fn search(&self, query: &str, fields: Option<&[&str]>) -> Vec<SearchHit<T>> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.rows
            .iter()
            .filter_map(|row| {
                row.text_fields()
                    .into_iter()
                    .filter(|(name, _)| fields.map_or(true, |subset| subset.contains(name)))
                    .find(|(_, value)| value.to_lowercase().contains(&needle))
                    .map(|(field, _)| SearchHit {
                        field,
                        record: row.clone(),
                    })
            })
            .collect()
    }
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}
