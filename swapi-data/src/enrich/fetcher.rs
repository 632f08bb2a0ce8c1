use log::debug;
use serde::Deserialize;
use swapi_core::{Person, PersonId, ReferenceField};

use super::{FetchError, resolve_references};
use crate::source::ResourceSource;

/// Fetch the person identified by `id` and resolve its reference fields.
///
/// Returns `Ok(None)` when the API answers `404`. Reference fields are
/// resolved one after another in declaration order; the record is only built
/// once all of them succeeded.
///
/// # Errors
///
/// Any other transport failure, a malformed person document, or a failed
/// reference lookup aborts the record and is returned to the caller.
///
/// # Examples
/// ```
/// use swapi_core::PersonId;
/// use swapi_data::enrich::fetch_person;
/// use swapi_data::source::test_support::StubResourceSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = StubResourceSource::default().with_person(1, "Luke Skywalker");
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
///
/// let luke = runtime.block_on(fetch_person(&source, PersonId::new(1)?))?;
/// let luke = luke.expect("person 1 exists");
/// assert_eq!(luke.homeworld, "Tatooine");
/// assert_eq!(luke.films, "A New Hope, The Empire Strikes Back");
///
/// let missing = runtime.block_on(fetch_person(&source, PersonId::new(2)?))?;
/// assert!(missing.is_none());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_person<S>(source: &S, id: PersonId) -> Result<Option<Person>, FetchError>
where
    S: ResourceSource + ?Sized,
{
    let url = source.person_url(id);
    let document = match source.fetch_json(&url).await {
        Ok(document) => document,
        Err(err) if err.is_not_found() => {
            debug!("person {id} not found at {url}");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let raw: RawPerson =
        serde_json::from_value(document).map_err(|source| FetchError::Decode {
            url: url.into_inner(),
            source,
        })?;
    let person = raw.enrich(source, id).await?;
    debug!("fetched person {id}: {person:?}");
    Ok(Some(person))
}

/// Person document as served by the API, references still unresolved.
#[derive(Debug, Deserialize)]
struct RawPerson {
    birth_year: String,
    eye_color: String,
    gender: String,
    hair_color: String,
    height: String,
    mass: String,
    name: String,
    skin_color: String,
    films: Vec<String>,
    homeworld: String,
    species: Vec<String>,
    starships: Vec<String>,
    vehicles: Vec<String>,
}

impl RawPerson {
    fn references(&self, field: ReferenceField) -> &[String] {
        match field {
            ReferenceField::Films => &self.films,
            ReferenceField::Homeworld => std::slice::from_ref(&self.homeworld),
            ReferenceField::Species => &self.species,
            ReferenceField::Starships => &self.starships,
            ReferenceField::Vehicles => &self.vehicles,
        }
    }

    async fn resolve<S>(&self, source: &S, field: ReferenceField) -> Result<String, FetchError>
    where
        S: ResourceSource + ?Sized,
    {
        resolve_references(source, self.references(field), field.lookup_key()).await
    }

    async fn enrich<S>(self, source: &S, id: PersonId) -> Result<Person, FetchError>
    where
        S: ResourceSource + ?Sized,
    {
        let films = self.resolve(source, ReferenceField::Films).await?;
        let homeworld = self.resolve(source, ReferenceField::Homeworld).await?;
        let species = self.resolve(source, ReferenceField::Species).await?;
        let starships = self.resolve(source, ReferenceField::Starships).await?;
        let vehicles = self.resolve(source, ReferenceField::Vehicles).await?;
        Ok(Person {
            id,
            birth_year: self.birth_year,
            eye_color: self.eye_color,
            films,
            gender: self.gender,
            hair_color: self.hair_color,
            height: self.height,
            homeworld,
            mass: self.mass,
            name: self.name,
            skin_color: self.skin_color,
            species,
            starships,
            vehicles,
        })
    }
}
