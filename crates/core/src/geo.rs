use serde::{Deserialize, Serialize};

use crate::dataset::ReferenceData;
use crate::models::Location;
use crate::policy::PlanningPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightEstimate {
    /// `None` when either end of the route is unknown; the cost is then zero.
    pub distance_km: Option<i64>,
    pub rate_per_km: Option<f64>,
    pub cost: i64,
}

impl FlightEstimate {
    pub fn unavailable() -> Self {
        Self {
            distance_km: None,
            rate_per_km: None,
            cost: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.distance_km.is_some()
    }
}

/// Great-circle distance on a 6371 km sphere.
pub fn haversine_km(from: &Location, to: &Location) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.lat,
            longitude: from.lon,
        },
        haversine::Location {
            latitude: to.lat,
            longitude: to.lon,
        },
        haversine::Units::Kilometers,
    )
}

pub fn estimate_flight(
    reference: &ReferenceData,
    policy: &PlanningPolicy,
    source: Option<&str>,
    destination: Option<&str>,
) -> FlightEstimate {
    let (Some(source), Some(destination)) = (source, destination) else {
        return FlightEstimate::unavailable();
    };

    let (Some(from), Some(to)) = (reference.location(source), reference.location(destination))
    else {
        return FlightEstimate::unavailable();
    };

    let distance = haversine_km(from, to);
    let rate = policy.rate_for(distance);

    FlightEstimate {
        distance_km: Some(distance as i64),
        rate_per_km: Some(rate),
        cost: (distance * rate).floor() as i64,
    }
}
