use std::sync::Arc;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::dataset::ReferenceData;
use crate::error::ConciergeError;
use crate::geo::{estimate_flight, FlightEstimate};
use crate::models::{Attraction, CityData, Hotel, NewTripRecord, TripParameters};
use crate::policy::PlanningPolicy;

/// One attraction position in the day-by-day plan. `None` is free time.
pub type Slot = Option<Arc<Attraction>>;

/// Choices carried into a generation instead of being drawn afresh.
#[derive(Debug, Clone, Default)]
pub struct Carryover {
    /// Hotel booked by the user; reused when it belongs to the destination city.
    pub booked_hotel: Option<Arc<Hotel>>,
    /// Hotel recovered from a history record; used only when nothing is booked.
    pub restored_hotel: Option<Arc<Hotel>>,
    /// Pinned slot list plus the pool it was drawn from.
    pub pinned: Option<PinnedAttractions>,
}

#[derive(Debug, Clone)]
pub struct PinnedAttractions {
    pub slots: Vec<Slot>,
    pub pool: Vec<Arc<Attraction>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelChoice {
    Booked,
    Restored,
    WithinCap,
    CheapestFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub flight: i64,
    pub hotel: i64,
    pub attractions: i64,
    pub misc: i64,
    pub total: i64,
}

impl CostBreakdown {
    pub fn new(flight: i64, hotel: i64, attractions: i64, misc: i64) -> Self {
        Self {
            flight,
            hotel,
            attractions,
            misc,
            total: flight + hotel + attractions + misc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub source: Option<String>,
    pub destination: String,
    pub duration: u32,
    pub budget: i64,
    pub flight: FlightEstimate,
    pub remaining_after_flight: i64,
    pub hotel: Arc<Hotel>,
    pub hotel_choice: HotelChoice,
    pub slots: Vec<Slot>,
    pub costs: CostBreakdown,
    #[serde(skip)]
    pub city_hotels: Vec<Arc<Hotel>>,
    #[serde(skip)]
    pub attraction_pool: Vec<Arc<Attraction>>,
}

impl Itinerary {
    /// Negative when the plan does not fit the budget.
    pub fn remaining_budget(&self) -> i64 {
        self.budget - self.costs.total
    }

    pub fn attractions(&self) -> impl Iterator<Item = &Arc<Attraction>> {
        self.slots.iter().flatten()
    }

    pub fn day_slots(&self, day: u32, per_day: usize) -> &[Slot] {
        let start = (day.saturating_sub(1) as usize).saturating_mul(per_day);
        if start >= self.slots.len() {
            return &[];
        }
        let end = (start + per_day).min(self.slots.len());
        &self.slots[start..end]
    }

    pub fn parameters(&self) -> TripParameters {
        TripParameters {
            source: self.source.clone(),
            destination: Some(self.destination.clone()),
            duration: self.duration,
            budget: self.budget,
        }
    }

    pub fn to_record(&self, timestamp: impl Into<String>) -> NewTripRecord {
        NewTripRecord {
            timestamp: timestamp.into(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            days: self.duration,
            budget: self.budget,
            total_cost: self.costs.total,
            hotel: self.hotel.name.clone(),
            attractions: self
                .attractions()
                .map(|attraction| attraction.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Budget allocation and selection. Pure apart from the random source; persisting the
/// result and replacing the session are the caller's job.
pub fn plan_itinerary<R: Rng + ?Sized>(
    reference: &ReferenceData,
    policy: &PlanningPolicy,
    params: &TripParameters,
    carryover: &Carryover,
    rng: &mut R,
) -> Result<Itinerary, ConciergeError> {
    let flight = estimate_flight(
        reference,
        policy,
        params.source.as_deref(),
        params.destination.as_deref(),
    );
    let remaining = params.budget - flight.cost;

    let Some(destination) = params.destination.as_deref() else {
        return Err(ConciergeError::UnresolvedDestination {
            known: reference.city_names(),
        });
    };

    let Some(city) = reference.city(destination) else {
        return Err(ConciergeError::DatasetMiss {
            city: destination.to_string(),
        });
    };

    let duration = policy.normalize_duration(Some(params.duration));
    if !policy.allows_duration(duration) {
        return Err(ConciergeError::invalid_selection(format!(
            "a {} day trip is longer than the {}-day planning limit",
            duration, policy.max_duration_days
        )));
    }
    let (hotel, hotel_choice) =
        select_hotel(city, policy, carryover, duration, remaining, rng)?;

    let (slots, attraction_pool) = match &carryover.pinned {
        Some(pinned) => (pinned.slots.clone(), pinned.pool.clone()),
        None => {
            let mut pool = city.attractions.clone();
            pool.shuffle(rng);
            let slots = pool
                .iter()
                .take(policy.slot_count(duration))
                .cloned()
                .map(Some)
                .collect::<Vec<_>>();
            (slots, pool)
        }
    };

    let attraction_cost = slots
        .iter()
        .flatten()
        .map(|attraction| attraction.entry_fee)
        .sum::<i64>();
    let misc_cost = (remaining as f64 * policy.misc_budget_share).floor() as i64;
    let costs = CostBreakdown::new(
        flight.cost,
        hotel.stay_cost(duration),
        attraction_cost,
        misc_cost,
    );

    debug!(
        destination = %city.city,
        hotel = %hotel.name,
        hotel_choice = ?hotel_choice,
        slots = slots.len(),
        total_cost = costs.total,
        "itinerary planned"
    );

    Ok(Itinerary {
        source: params.source.clone(),
        destination: city.city.clone(),
        duration,
        budget: params.budget,
        flight,
        remaining_after_flight: remaining,
        hotel,
        hotel_choice,
        slots,
        costs,
        city_hotels: city.hotels.clone(),
        attraction_pool,
    })
}

fn select_hotel<R: Rng + ?Sized>(
    city: &CityData,
    policy: &PlanningPolicy,
    carryover: &Carryover,
    duration: u32,
    remaining: i64,
    rng: &mut R,
) -> Result<(Arc<Hotel>, HotelChoice), ConciergeError> {
    if let Some(booked) = &carryover.booked_hotel {
        if city.owns_hotel(booked) {
            return Ok((booked.clone(), HotelChoice::Booked));
        }
        debug!(hotel = %booked.name, city = %city.city, "booked hotel belongs to another city");
    }

    if let Some(restored) = &carryover.restored_hotel {
        if city.owns_hotel(restored) {
            return Ok((restored.clone(), HotelChoice::Restored));
        }
    }

    let cap = remaining as f64 * policy.hotel_budget_share;
    let viable = city
        .hotels
        .iter()
        .filter(|hotel| hotel.stay_cost(duration) as f64 <= cap)
        .cloned()
        .collect::<Vec<_>>();

    if let Some(hotel) = viable.choose(rng) {
        return Ok((hotel.clone(), HotelChoice::WithinCap));
    }

    city.hotels
        .iter()
        .min_by_key(|hotel| hotel.price_per_night)
        .map(|hotel| (hotel.clone(), HotelChoice::CheapestFallback))
        .ok_or_else(|| ConciergeError::DatasetMiss {
            city: city.city.clone(),
        })
}
