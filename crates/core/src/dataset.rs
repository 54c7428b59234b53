use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::DatasetError;
use crate::models::{CityData, Location};

#[derive(Debug, Deserialize)]
struct RawDataset {
    cities: Vec<CityData>,
    #[serde(default)]
    locations: Option<Vec<Location>>,
}

/// Read-only lookup provider for cities and coordinates. Iteration order is the
/// document order and is authoritative wherever ties are broken by scanning.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    cities: Vec<CityData>,
    locations: Vec<Location>,
}

impl ReferenceData {
    pub fn new(cities: Vec<CityData>, locations: Vec<Location>) -> Result<Self, DatasetError> {
        if cities.is_empty() {
            return Err(DatasetError::Empty);
        }

        if let Some(city) = cities.iter().find(|city| city.hotels.is_empty()) {
            return Err(DatasetError::CityWithoutHotels {
                city: city.city.clone(),
            });
        }

        Ok(Self { cities, locations })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DatasetError> {
        let dataset: RawDataset = serde_json::from_str(raw)?;
        let locations = dataset.locations.unwrap_or_else(default_locations);
        Self::new(dataset.cities, locations)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let data = Self::from_json_str(&raw)?;
        debug!(
            path = %path.display(),
            cities = data.cities.len(),
            locations = data.locations.len(),
            "reference dataset loaded"
        );
        Ok(data)
    }

    pub fn cities(&self) -> &[CityData] {
        &self.cities
    }

    pub fn city(&self, name: &str) -> Option<&CityData> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|city| city.city.eq_ignore_ascii_case(name))
    }

    pub fn city_names(&self) -> Vec<String> {
        self.cities.iter().map(|city| city.city.clone()).collect()
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        let name = name.trim();
        self.locations
            .iter()
            .find(|location| location.name.eq_ignore_ascii_case(name))
    }
}

/// Airport coordinates used when the dataset carries no `locations` table.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Mumbai", 19.0760, 72.8777),
        Location::new("Delhi", 28.6139, 77.2090),
        Location::new("Paris", 48.8566, 2.3522),
        Location::new("Tokyo", 35.6762, 139.6503),
        Location::new("Dubai", 25.2048, 55.2708),
        Location::new("London", 51.5072, -0.1276),
        Location::new("Rome", 41.9028, 12.4964),
        Location::new("Sydney", -33.8688, 151.2093),
        Location::new("New York", 40.7128, -74.0060),
    ]
}
