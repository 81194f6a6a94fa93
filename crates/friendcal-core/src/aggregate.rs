//! Deduplicating accumulator for persons gathered across fetch windows.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::person::Person;

/// Persons keyed by identifier.
///
/// Upstream windows overlap, so the same friend usually arrives more than
/// once. A later insert replaces the earlier record without comparing
/// fields.
#[derive(Debug, Clone, Default)]
pub struct BirthdaySet {
    by_id: HashMap<String, Person>,
}

impl BirthdaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a person, returning the record it replaced.
    pub fn insert(&mut self, person: Person) -> Option<Person> {
        self.by_id.insert(person.id().to_string(), person)
    }

    /// Inserts a batch and returns how many identifiers were new.
    pub fn extend_batch(&mut self, batch: impl IntoIterator<Item = Person>) -> usize {
        let mut added = 0;
        for person in batch {
            if self.insert(person).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Persons ordered by month, day, then identifier.
    pub fn sorted(&self) -> Vec<&Person> {
        let mut people: Vec<&Person> = self.by_id.values().collect();
        people.sort_by(|a, b| a.birthday_key().cmp(&b.birthday_key()));
        people
    }

    /// Fails with [`CoreError::NoBirthdays`] when nothing was collected.
    pub fn ensure_not_empty(self) -> CoreResult<Self> {
        if self.is_empty() {
            Err(CoreError::NoBirthdays)
        } else {
            Ok(self)
        }
    }
}

impl Extend<Person> for BirthdaySet {
    fn extend<I: IntoIterator<Item = Person>>(&mut self, iter: I) {
        for person in iter {
            self.insert(person);
        }
    }
}

impl FromIterator<Person> for BirthdaySet {
    fn from_iter<I: IntoIterator<Item = Person>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
