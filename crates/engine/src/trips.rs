//! Trips collection, scoped by owner.

use std::sync::Arc;

use api_types::{
    trip::{Trip, TripId, TripNew},
    user::UserId,
};
use tracing::debug;

use crate::{
    EngineError, ResultEngine,
    document::{Document, FieldValue, Fields},
    provider::DocumentStore,
    session::SessionStore,
    util::required,
};

pub(crate) const COLLECTION: &str = "trips";
/// Field holding the owner id.
pub(crate) const OWNER_FIELD: &str = "userId";

#[derive(Debug)]
pub struct TripRepository<D> {
    store: Arc<D>,
    session: SessionStore,
}

impl<D> Clone for TripRepository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: self.session.clone(),
        }
    }
}

impl<D: DocumentStore> TripRepository<D> {
    pub fn new(store: Arc<D>, session: SessionStore) -> Self {
        Self { store, session }
    }

    /// Create a trip owned by `owner_id`.
    ///
    /// Not idempotent: retrying after a timeout may create a second trip.
    pub async fn create_trip(
        &self,
        place: &str,
        country: &str,
        owner_id: &UserId,
    ) -> ResultEngine<TripId> {
        let (Some(place), Some(country)) = (required(place), required(country)) else {
            return Err(EngineError::Validation(
                "Place and Country are required!".to_string(),
            ));
        };
        let trip = TripNew {
            place: place.to_string(),
            country: country.to_string(),
            owner_id: owner_id.clone(),
        };

        let credentials = self.session.credentials();
        let id = self
            .store
            .insert(COLLECTION, trip_fields(&trip), credentials.as_ref())
            .await
            .map_err(|err| EngineError::WriteFailed(err.to_string()))?;
        debug!("created trip {id} for {owner_id}");
        Ok(TripId::new(id))
    }

    /// Every trip owned by `owner_id`, in provider order.
    pub async fn list_trips_for_owner(&self, owner_id: &UserId) -> ResultEngine<Vec<Trip>> {
        let credentials = self.session.credentials();
        let documents = self
            .store
            .query_eq(
                COLLECTION,
                OWNER_FIELD,
                FieldValue::from(owner_id.as_str()),
                credentials.as_ref(),
            )
            .await
            .map_err(|err| EngineError::ReadFailed(err.to_string()))?;
        documents.iter().map(trip_from_document).collect()
    }
}

fn trip_fields(trip: &TripNew) -> Fields {
    Fields::from([
        ("place".to_string(), FieldValue::from(trip.place.as_str())),
        ("country".to_string(), FieldValue::from(trip.country.as_str())),
        (
            OWNER_FIELD.to_string(),
            FieldValue::from(trip.owner_id.as_str()),
        ),
    ])
}

fn trip_from_document(document: &Document) -> ResultEngine<Trip> {
    Ok(Trip {
        id: TripId::new(document.id.clone()),
        place: document.string("place")?,
        country: document.string("country")?,
        owner_id: UserId::new(document.string(OWNER_FIELD)?),
    })
}
