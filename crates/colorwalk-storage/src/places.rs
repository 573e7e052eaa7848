use crate::model::{Place, PlaceCreateRequest};
use crate::{require_coordinates, require_non_blank, ColorWalkStore, StoreError};
use chrono::Utc;
use colorwalk_recommend::PlaceId;

impl ColorWalkStore {
    pub fn create_place(&self, request: PlaceCreateRequest) -> Result<Place, StoreError> {
        require_non_blank("name", &request.name)?;
        require_coordinates(request.latitude, request.longitude)?;

        let place = self.mutate(|state| {
            let now = Utc::now();
            let place = Place {
                id: state.allocate_id(),
                name: request.name.trim().to_string(),
                description: request.description,
                latitude: request.latitude,
                longitude: request.longitude,
                address: request.address,
                image_url: request.image_url,
                category: request.category,
                created_at: now,
                updated_at: now,
            };
            state.places.insert(place.id, place.clone());
            Ok(place)
        })?;

        tracing::info!(place_id = place.id, name = %place.name, "place created");
        Ok(place)
    }

    pub fn place(&self, id: PlaceId) -> Result<Place, StoreError> {
        self.read(|state| state.places.get(&id).cloned())
            .ok_or(StoreError::PlaceNotFound(id))
    }

    /// All places in id order
    pub fn places(&self) -> Vec<Place> {
        self.read(|state| state.places.values().cloned().collect())
    }

    pub fn delete_place(&self, id: PlaceId) -> Result<(), StoreError> {
        self.mutate(|state| {
            state
                .places
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::PlaceNotFound(id))
        })?;
        tracing::info!(place_id = id, "place deleted");
        Ok(())
    }
}
