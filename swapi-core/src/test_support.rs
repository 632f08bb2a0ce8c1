//! Test-only fixtures: sample records and an in-memory [`PersonSink`].

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::{Person, PersonId, PersonSink};

/// Build a deterministic, fully populated [`Person`] for `id`.
///
/// # Panics
///
/// Panics when `id` is zero.
#[must_use]
#[expect(clippy::expect_used, reason = "fixtures reject invalid ids loudly")]
pub fn sample_person(id: u32) -> Person {
    Person {
        id: PersonId::new(id).expect("sample ids must be positive"),
        birth_year: "19BBY".to_owned(),
        eye_color: "blue".to_owned(),
        films: "A New Hope, The Empire Strikes Back".to_owned(),
        gender: "male".to_owned(),
        hair_color: "blond".to_owned(),
        height: "172".to_owned(),
        homeworld: "Tatooine".to_owned(),
        mass: "77".to_owned(),
        name: format!("Person {id}"),
        skin_color: "fair".to_owned(),
        species: String::new(),
        starships: "X-wing".to_owned(),
        vehicles: "Snowspeeder".to_owned(),
    }
}

/// Errors produced by [`MemorySink`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemorySinkError {
    /// The batch contained an id configured to fail.
    #[error("person {id} was rejected by the sink")]
    Rejected {
        /// Offending identifier.
        id: PersonId,
    },
    /// The id already exists in the sink.
    #[error("person {id} is already stored")]
    Duplicate {
        /// Offending identifier.
        id: PersonId,
    },
}

/// In-memory [`PersonSink`] recording each committed batch.
///
/// Batches are all-or-nothing: a rejected or duplicate id leaves the sink
/// untouched, mirroring a rolled back transaction.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
    reject: BTreeSet<PersonId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    batches: Vec<Vec<Person>>,
    ids: BTreeSet<PersonId>,
}

impl MemorySink {
    /// Create a sink that fails any batch containing one of `ids`.
    pub fn rejecting<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = PersonId>,
    {
        Self {
            state: Mutex::default(),
            reject: ids.into_iter().collect(),
        }
    }

    /// Snapshot of committed batches in commit order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<Person>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .batches
            .clone()
    }

    /// Identifiers of every committed person, ascending.
    #[must_use]
    pub fn stored_ids(&self) -> Vec<u32> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .iter()
            .map(|id| id.get())
            .collect()
    }
}

impl PersonSink for MemorySink {
    type Error = MemorySinkError;

    fn insert_people(&self, people: &[Person]) -> Result<usize, Self::Error> {
        if let Some(person) = people.iter().find(|p| self.reject.contains(&p.id)) {
            return Err(MemorySinkError::Rejected { id: person.id });
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut seen = BTreeSet::new();
        for person in people {
            if state.ids.contains(&person.id) || !seen.insert(person.id) {
                return Err(MemorySinkError::Duplicate { id: person.id });
            }
        }
        state.ids.extend(seen);
        state.batches.push(people.to_vec());
        Ok(people.len())
    }
}
