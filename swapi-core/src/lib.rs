//! Core domain types for the SWAPI people loader.
//!
//! These models keep the pipeline stages honest: identifiers are validated
//! on construction, enriched records are only built once every reference
//! field has been resolved, and the regrouping stage is generic over any
//! stream so it stays independent of how records were fetched.
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::fmt;
use std::num::NonZeroU32;

use thiserror::Error;

mod rechunk;
mod sink;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use rechunk::{Rechunk, rechunk};
pub use sink::PersonSink;

/// Identifier of a person resource in the upstream API.
///
/// Identifiers are always positive; zero is rejected.
///
/// # Examples
///
/// ```
/// use swapi_core::PersonId;
///
/// # fn main() -> Result<(), swapi_core::PersonIdError> {
/// let id = PersonId::new(4)?;
/// assert_eq!(id.get(), 4);
/// assert_eq!(id.to_string(), "4");
/// assert!(PersonId::new(0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonId(NonZeroU32);

/// Errors returned by [`PersonId::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersonIdError {
    /// The identifier was zero.
    #[error("person id must be a positive integer")]
    Zero,
}

impl PersonId {
    /// Validates and constructs a [`PersonId`].
    pub const fn new(value: u32) -> Result<Self, PersonIdError> {
        match NonZeroU32::new(value) {
            Some(inner) => Ok(Self(inner)),
            None => Err(PersonIdError::Zero),
        }
    }

    /// Wrap an already non-zero value.
    #[must_use]
    pub const fn from_non_zero(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Return the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PersonId {
    type Error = PersonIdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive, ascending range of person identifiers to load.
///
/// # Examples
///
/// ```
/// use swapi_core::{IdRange, PersonId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let range = IdRange::new(PersonId::new(1)?, PersonId::new(3)?)?;
/// let ids: Vec<u32> = range.iter().map(PersonId::get).collect();
/// assert_eq!(ids, vec![1, 2, 3]);
/// assert_eq!(range.len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    first: PersonId,
    last: PersonId,
}

/// Errors returned by [`IdRange::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdRangeError {
    /// The first identifier came after the last one.
    #[error("id range start {first} is greater than its end {last}")]
    Inverted {
        /// Requested first identifier.
        first: PersonId,
        /// Requested last identifier.
        last: PersonId,
    },
}

/// Highest person identifier published by the upstream API.
const DEFAULT_LAST_ID: NonZeroU32 = match NonZeroU32::new(83) {
    Some(value) => value,
    None => NonZeroU32::MIN,
};

impl IdRange {
    /// Validates and constructs an [`IdRange`].
    pub fn new(first: PersonId, last: PersonId) -> Result<Self, IdRangeError> {
        if first > last {
            return Err(IdRangeError::Inverted { first, last });
        }
        Ok(Self { first, last })
    }

    /// First identifier in the range.
    #[must_use]
    pub const fn first(&self) -> PersonId {
        self.first
    }

    /// Last identifier in the range.
    #[must_use]
    pub const fn last(&self) -> PersonId {
        self.last
    }

    /// Number of identifiers covered by the range.
    #[must_use]
    pub fn len(&self) -> usize {
        let span = self.last.get() - self.first.get();
        usize::try_from(span).map_or(usize::MAX, |value| value.saturating_add(1))
    }

    /// Ranges always contain at least one identifier.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PersonId> + use<> {
        (self.first.get()..=self.last.get())
            .filter_map(NonZeroU32::new)
            .map(PersonId::from_non_zero)
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self {
            first: PersonId::from_non_zero(NonZeroU32::MIN),
            last: PersonId::from_non_zero(DEFAULT_LAST_ID),
        }
    }
}

/// Attribute whose upstream value is one or more cross-reference URLs.
///
/// Reference fields are resolved into display text before a [`Person`] is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    /// Films the person appears in, resolved by title.
    Films,
    /// Home planet, resolved by name.
    Homeworld,
    /// Species, resolved by name.
    Species,
    /// Starships piloted, resolved by name.
    Starships,
    /// Vehicles piloted, resolved by name.
    Vehicles,
}

impl ReferenceField {
    /// All reference fields in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Films,
        Self::Homeworld,
        Self::Species,
        Self::Starships,
        Self::Vehicles,
    ];

    /// Column and upstream JSON key holding the field.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Films => "films",
            Self::Homeworld => "homeworld",
            Self::Species => "species",
            Self::Starships => "starships",
            Self::Vehicles => "vehicles",
        }
    }

    /// Key extracted from each referenced resource.
    ///
    /// # Examples
    ///
    /// ```
    /// use swapi_core::ReferenceField;
    ///
    /// assert_eq!(ReferenceField::Films.lookup_key(), "title");
    /// assert_eq!(ReferenceField::Vehicles.lookup_key(), "name");
    /// ```
    #[must_use]
    pub const fn lookup_key(self) -> &'static str {
        match self {
            Self::Films => "title",
            Self::Homeworld | Self::Species | Self::Starships | Self::Vehicles => "name",
        }
    }
}

impl fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A fully enriched person record.
///
/// Numeric upstream attributes such as `height` and `mass` keep their textual
/// form. Reference fields hold the resolved display values joined by `", "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Identifier the record was fetched with.
    pub id: PersonId,
    /// Birth year in the upstream notation (e.g. `19BBY`).
    pub birth_year: String,
    /// Eye colour.
    pub eye_color: String,
    /// Titles of the films the person appears in.
    pub films: String,
    /// Gender.
    pub gender: String,
    /// Hair colour.
    pub hair_color: String,
    /// Height in centimetres, as text.
    pub height: String,
    /// Name of the home planet.
    pub homeworld: String,
    /// Mass in kilograms, as text.
    pub mass: String,
    /// Display name.
    pub name: String,
    /// Skin colour.
    pub skin_color: String,
    /// Names of the person's species.
    pub species: String,
    /// Names of the starships piloted.
    pub starships: String,
    /// Names of the vehicles piloted.
    pub vehicles: String,
}

impl Person {
    /// Resolved display value for a reference field.
    #[must_use]
    pub fn reference(&self, field: ReferenceField) -> &str {
        match field {
            ReferenceField::Films => &self.films,
            ReferenceField::Homeworld => &self.homeworld,
            ReferenceField::Species => &self.species,
            ReferenceField::Starships => &self.starships,
            ReferenceField::Vehicles => &self.vehicles,
        }
    }
}

/// A regrouped batch of fetch results; `None` marks an absent identifier.
pub type PersonBatch = Vec<Option<Person>>;

/// Drop absent markers from a batch, keeping order.
#[must_use]
pub fn present_people(batch: PersonBatch) -> Vec<Person> {
    batch.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(value: u32) -> PersonId {
        PersonId::new(value).expect("non-zero id")
    }

    #[rstest]
    fn person_id_rejects_zero() {
        assert_eq!(PersonId::new(0), Err(PersonIdError::Zero));
    }

    #[rstest]
    #[case(1)]
    #[case(83)]
    #[case(u32::MAX)]
    fn person_id_round_trips_positive_values(#[case] value: u32) {
        assert_eq!(id(value).get(), value);
    }

    #[rstest]
    fn id_range_rejects_inverted_bounds() {
        let err = IdRange::new(id(5), id(2)).expect_err("inverted range");
        assert_eq!(
            err,
            IdRangeError::Inverted {
                first: id(5),
                last: id(2)
            }
        );
    }

    #[rstest]
    fn id_range_with_single_id_yields_it_once() {
        let range = IdRange::new(id(7), id(7)).expect("valid range");
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![id(7)]);
        assert_eq!(range.len(), 1);
    }

    #[rstest]
    fn default_range_covers_published_people() {
        let range = IdRange::default();
        assert_eq!(range.first(), id(1));
        assert_eq!(range.last(), id(83));
        assert_eq!(range.iter().count(), 83);
    }

    #[rstest]
    #[case(ReferenceField::Films, "films", "title")]
    #[case(ReferenceField::Homeworld, "homeworld", "name")]
    #[case(ReferenceField::Species, "species", "name")]
    #[case(ReferenceField::Starships, "starships", "name")]
    #[case(ReferenceField::Vehicles, "vehicles", "name")]
    fn reference_fields_map_to_columns_and_keys(
        #[case] field: ReferenceField,
        #[case] column: &str,
        #[case] key: &str,
    ) {
        assert_eq!(field.column(), column);
        assert_eq!(field.lookup_key(), key);
    }

    #[rstest]
    fn present_people_drops_absent_markers() {
        let batch = vec![None, Some(test_support::sample_person(2)), None];
        let people = present_people(batch);
        assert_eq!(people.len(), 1);
        assert_eq!(people.first().map(|person| person.id), Some(id(2)));
    }
}
