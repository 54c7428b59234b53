use std::sync::Arc;

use crate::error::ConciergeError;
use crate::intent::AttractionTheme;
use crate::models::{Attraction, Hotel, HotelTier, TripParameters};
use crate::planner::{Carryover, Itinerary, PinnedAttractions, Slot};
use crate::policy::PartialDayPolicy;

/// State of the last planned trip. Replaced wholesale by every successful generation;
/// follow-up commands overwrite individual fields.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    pub source: Option<String>,
    pub destination: String,
    pub budget: i64,
    pub duration: u32,
    pub hotels: Vec<Arc<Hotel>>,
    /// Set only by an explicit booking.
    pub selected_hotel: Option<Arc<Hotel>>,
    pub planned_hotel: Arc<Hotel>,
    pub chosen_attractions: Vec<Slot>,
    pub attraction_pool: Vec<Arc<Attraction>>,
    /// Resolves numeric hotel choices against the most recent listing.
    pub filtered_hotels: Vec<Arc<Hotel>>,
}

impl SessionMemory {
    /// Builds the session for a freshly generated plan. A booking and the last hotel
    /// listing survive only while the destination stays the same.
    pub fn from_itinerary(itinerary: &Itinerary, previous: Option<SessionMemory>) -> Self {
        let (selected_hotel, filtered_hotels) = match previous {
            Some(previous) if previous.destination.eq_ignore_ascii_case(&itinerary.destination) => {
                (previous.selected_hotel, previous.filtered_hotels)
            }
            _ => (None, Vec::new()),
        };

        Self {
            source: itinerary.source.clone(),
            destination: itinerary.destination.clone(),
            budget: itinerary.budget,
            duration: itinerary.duration,
            hotels: itinerary.city_hotels.clone(),
            selected_hotel,
            planned_hotel: itinerary.hotel.clone(),
            chosen_attractions: itinerary.slots.clone(),
            attraction_pool: itinerary.attraction_pool.clone(),
            filtered_hotels,
        }
    }

    pub fn parameters(&self) -> TripParameters {
        TripParameters {
            source: self.source.clone(),
            destination: Some(self.destination.clone()),
            duration: self.duration,
            budget: self.budget,
        }
    }

    /// Regeneration that keeps the booking but draws attractions afresh.
    pub fn carryover(&self) -> Carryover {
        Carryover {
            booked_hotel: self.selected_hotel.clone(),
            ..Carryover::default()
        }
    }

    /// Regeneration that keeps the booking and the current slot list.
    pub fn pinned_carryover(&self) -> Carryover {
        Carryover {
            booked_hotel: self.selected_hotel.clone(),
            restored_hotel: None,
            pinned: Some(PinnedAttractions {
                slots: self.chosen_attractions.clone(),
                pool: self.attraction_pool.clone(),
            }),
        }
    }

    pub fn list_hotels(&mut self, tier: HotelTier) -> &[Arc<Hotel>] {
        self.filtered_hotels = self
            .hotels
            .iter()
            .filter(|hotel| hotel.is_tier(tier))
            .cloned()
            .collect();
        &self.filtered_hotels
    }

    /// Resolves a 1-based option from the last listing without touching the session.
    pub fn resolve_listed_hotel(&self, option: usize) -> Result<Arc<Hotel>, ConciergeError> {
        option
            .checked_sub(1)
            .and_then(|index| self.filtered_hotels.get(index))
            .cloned()
            .ok_or_else(|| {
                ConciergeError::invalid_selection(format!(
                    "hotel option {} is not in the last list (1-{})",
                    display_number(option),
                    self.filtered_hotels.len()
                ))
            })
    }

    pub fn attractions_matching(&self, theme: AttractionTheme) -> Vec<Arc<Attraction>> {
        self.attraction_pool
            .iter()
            .filter(|attraction| attraction.has_any_tag(theme.tags()))
            .cloned()
            .collect()
    }

    /// Writes `matches` into the slots of `day` in order. Slots past the end of the plan
    /// are left alone. Returns how many slots received a new attraction.
    pub fn replace_day(
        &mut self,
        day: usize,
        matches: &[Arc<Attraction>],
        per_day: usize,
        policy: PartialDayPolicy,
    ) -> Result<usize, ConciergeError> {
        if day == 0 || day > self.duration as usize {
            return Err(ConciergeError::invalid_selection(format!(
                "day {} is outside this {}-day trip",
                display_number(day),
                self.duration
            )));
        }

        let start = (day - 1) * per_day;
        let mut replaced = 0;

        for offset in 0..per_day {
            let Some(slot) = self.chosen_attractions.get_mut(start + offset) else {
                break;
            };

            match matches.get(offset) {
                Some(attraction) => {
                    *slot = Some(attraction.clone());
                    replaced += 1;
                }
                None if policy == PartialDayPolicy::ClearUnmatched => *slot = None,
                None => {}
            }
        }

        Ok(replaced)
    }
}

fn display_number(value: usize) -> String {
    if value == usize::MAX {
        "(too large)".to_string()
    } else {
        value.to_string()
    }
}
