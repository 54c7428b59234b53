use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::planner::Itinerary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotelTier {
    Luxury,
    MidRange,
    Budget,
}

impl HotelTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Luxury => "luxury",
            Self::MidRange => "mid-range",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for HotelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    #[serde(rename = "type")]
    pub hotel_type: String,
    pub rating: f32,
    pub price_per_night: i64,
    pub location: String,
}

impl Hotel {
    /// Dataset types outside the known tiers still load; they just never match a tier filter.
    pub fn is_tier(&self, tier: HotelTier) -> bool {
        self.hotel_type.eq_ignore_ascii_case(tier.as_str())
    }

    pub fn stay_cost(&self, nights: u32) -> i64 {
        self.price_per_night * i64::from(nights)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    #[serde(deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    pub entry_fee: i64,
    pub duration_hours: f32,
    pub best_time_to_visit: String,
}

impl Attraction {
    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        self.category
            .iter()
            .any(|own| tags.iter().any(|tag| own.eq_ignore_ascii_case(tag)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityData {
    pub city: String,
    pub hotels: Vec<Arc<Hotel>>,
    pub attractions: Vec<Arc<Attraction>>,
}

impl CityData {
    /// Pointer identity, not name equality: two cities may list hotels with the same name.
    pub fn owns_hotel(&self, hotel: &Arc<Hotel>) -> bool {
        self.hotels.iter().any(|own| Arc::ptr_eq(own, hotel))
    }

    pub fn hotel_named(&self, name: &str) -> Option<&Arc<Hotel>> {
        self.hotels
            .iter()
            .find(|hotel| hotel.name.eq_ignore_ascii_case(name))
    }

    pub fn attraction_named(&self, name: &str) -> Option<&Arc<Attraction>> {
        self.attractions
            .iter()
            .find(|attraction| attraction.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub duration: u32,
    pub budget: Option<i64>,
}

impl TripRequest {
    /// Only a fully resolved request goes to the generator; anything else is a follow-up.
    pub fn into_parameters(self) -> Option<TripParameters> {
        match (self.source, self.destination, self.budget) {
            (Some(source), Some(destination), Some(budget)) => Some(TripParameters {
                source: Some(source),
                destination: Some(destination),
                duration: self.duration,
                budget,
            }),
            _ => None,
        }
    }
}

/// The four primary fields a plan is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripParameters {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub duration: u32,
    pub budget: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTripRecord {
    pub timestamp: String,
    pub source: Option<String>,
    pub destination: String,
    pub days: u32,
    pub budget: i64,
    pub total_cost: i64,
    pub hotel: String,
    pub attractions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: i64,
    pub timestamp: String,
    pub source: Option<String>,
    pub destination: String,
    pub days: u32,
    pub budget: i64,
    pub total_cost: i64,
    pub hotel: String,
    pub attractions: String,
}

impl TripRecord {
    pub fn from_new(id: i64, record: NewTripRecord) -> Self {
        Self {
            id,
            timestamp: record.timestamp,
            source: record.source,
            destination: record.destination,
            days: record.days,
            budget: record.budget,
            total_cost: record.total_cost,
            hotel: record.hotel,
            attractions: record.attractions,
        }
    }

    pub fn parameters(&self) -> TripParameters {
        TripParameters {
            source: self.source.clone(),
            destination: Some(self.destination.clone()),
            duration: self.days,
            budget: self.budget,
        }
    }

    pub fn attraction_names(&self) -> Vec<&str> {
        self.attractions
            .split(", ")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TripPlanning,
    Recall,
    HotelListing,
    HotelBooking,
    AttractionChange,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConciergeReply {
    pub reply_text: String,
    pub intent: Intent,
    /// Set when the reply reports a recoverable user error.
    pub notice: Option<String>,
    pub itinerary: Option<Itinerary>,
}

impl ConciergeReply {
    pub fn text(intent: Intent, reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            intent,
            notice: None,
            itinerary: None,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
