//! The sample registry.
//!
//! A [`SampleRegistry`] is guaranteed non-empty by construction: the first
//! record is stored separately from the rest, so "the default record" is
//! always available without a fallible lookup.

use std::collections::BTreeSet;

use image2gps_types::Record;
use tracing::debug;

use crate::error::RegistryError;

/// Immutable, non-empty table of selectable samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRegistry {
    /// The first record, used as the fallback for unknown ids.
    head: Record,
    /// Remaining records in display order.
    tail: Vec<Record>,
}

impl SampleRegistry {
    /// Build a registry from records in display order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Empty`] if `records` is empty, or
    /// [`RegistryError::DuplicateId`] if two records share an id.
    pub fn new(records: Vec<Record>) -> Result<Self, RegistryError> {
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(record.id.clone()) {
                return Err(RegistryError::DuplicateId(record.id.clone()));
            }
        }

        let mut iter = records.into_iter();
        let head = iter.next().ok_or(RegistryError::Empty)?;
        let tail: Vec<Record> = iter.collect();

        debug!(
            default = %head.id,
            count = tail.len().saturating_add(1),
            "Sample registry built"
        );
        Ok(Self { head, tail })
    }

    /// Registry holding the bundled Penn Engineering samples.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError`] if the bundled table is malformed.
    pub fn penn_engineering() -> Result<Self, RegistryError> {
        Self::new(crate::penn::penn_engineering_samples())
    }

    /// The default record (first in display order).
    pub const fn default_record(&self) -> &Record {
        &self.head
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.iter().find(|record| record.id.as_str() == id)
    }

    /// Look up a record by id, falling back to the default record when the
    /// id is unknown.
    pub fn resolve(&self, id: &str) -> &Record {
        self.get(id).unwrap_or_else(|| {
            debug!(requested = id, fallback = %self.head.id, "Unknown sample id, using default");
            &self.head
        })
    }

    /// Iterate over all records in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Number of records (always at least 1).
    pub const fn len(&self) -> usize {
        self.tail.len().saturating_add(1)
    }

    /// Always `false`; present for API symmetry with collections.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Split the records into the two gallery columns.
    ///
    /// The left column holds `ceil(n / 2)` records, the right the rest.
    pub fn gallery_columns(&self) -> (Vec<&Record>, Vec<&Record>) {
        let left_len = self.len().div_ceil(2);
        let mut left = Vec::with_capacity(left_len);
        let mut right = Vec::with_capacity(self.len().saturating_sub(left_len));
        for (index, record) in self.iter().enumerate() {
            if index < left_len {
                left.push(record);
            } else {
                right.push(record);
            }
        }
        (left, right)
    }
}
