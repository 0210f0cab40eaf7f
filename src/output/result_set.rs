//! Ordered, key-deduplicated record collection
//!
//! A `ResultSet` is owned by the pipeline driver and handed to the writers.
//! It never holds two records with the same non-empty natural key.

use crate::output::traits::{Keyed, WriteError, WriteResult};
use serde::Deserialize;
use std::collections::HashMap;

/// What to do when a record's natural key is already present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the record seen first, drop later ones
    #[default]
    FirstWins,
    /// Replace the stored record in place with the newest one
    LastWins,
    /// Refuse the collision
    Error,
}

/// Outcome of a single insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Added,
    Replaced,
    Skipped,
}

/// Ordered collection of records, unique by natural key
#[derive(Debug, Clone)]
pub struct ResultSet<R> {
    records: Vec<R>,
    positions: HashMap<String, usize>,
    policy: DuplicatePolicy,
    collisions: usize,
}

impl<R: Keyed> ResultSet<R> {
    /// Creates an empty set with the given collision policy
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            records: Vec::new(),
            positions: HashMap::new(),
            policy,
            collisions: 0,
        }
    }

    /// Collects records into a set, applying the policy in iteration order
    pub fn collect<I>(records: I, policy: DuplicatePolicy) -> WriteResult<Self>
    where
        I: IntoIterator<Item = R>,
    {
        let mut set = Self::new(policy);
        set.extend(records)?;
        Ok(set)
    }

    /// Collects records keeping the first record of each key
    ///
    /// Unlike [`ResultSet::collect`] this cannot fail; later duplicates are
    /// dropped and counted as collisions.
    pub fn first_wins<I>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        let mut set = Self::new(DuplicatePolicy::FirstWins);
        for record in records {
            let key = record.natural_key().trim().to_string();
            if !key.is_empty() {
                if set.positions.contains_key(&key) {
                    set.collisions += 1;
                    continue;
                }
                set.positions.insert(key, set.records.len());
            }
            set.records.push(record);
        }
        set
    }

    /// Inserts a record according to the collision policy
    ///
    /// Replacement keeps the original position so output order is stable.
    pub fn insert(&mut self, record: R) -> WriteResult<Insertion> {
        let key = record.natural_key().trim().to_string();

        if key.is_empty() {
            self.records.push(record);
            return Ok(Insertion::Added);
        }

        match self.positions.get(&key) {
            None => {
                self.positions.insert(key, self.records.len());
                self.records.push(record);
                Ok(Insertion::Added)
            }
            Some(&index) => {
                self.collisions += 1;
                match self.policy {
                    DuplicatePolicy::FirstWins => {
                        tracing::debug!(key = %key, "Duplicate key, keeping first record");
                        Ok(Insertion::Skipped)
                    }
                    DuplicatePolicy::LastWins => {
                        tracing::debug!(key = %key, "Duplicate key, keeping last record");
                        self.records[index] = record;
                        Ok(Insertion::Replaced)
                    }
                    DuplicatePolicy::Error => Err(WriteError::DuplicateKey(key)),
                }
            }
        }
    }

    /// Inserts every record in order, stopping at the first refused collision
    pub fn extend<I>(&mut self, records: I) -> WriteResult<()>
    where
        I: IntoIterator<Item = R>,
    {
        for record in records {
            self.insert(record)?;
        }
        Ok(())
    }

    /// Returns true if a record with this key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key.trim())
    }
}

impl<R> ResultSet<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Number of key collisions seen so far, whatever the policy did with them
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

impl<'a, R> IntoIterator for &'a ResultSet<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
