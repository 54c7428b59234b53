pub mod dataset;
pub mod error;
pub mod geo;
pub mod intent;
pub mod models;
pub mod planner;
pub mod policy;
pub mod render;
pub mod session;

pub use dataset::ReferenceData;
pub use error::{ConciergeError, DatasetError, USAGE_HINT};
pub use geo::{estimate_flight, haversine_km, FlightEstimate};
pub use intent::{
    classify_follow_up, is_exit_command, normalize_text, parse_trip_request, AttractionTheme,
    FollowUpCommand,
};
pub use models::*;
pub use planner::{
    plan_itinerary, Carryover, CostBreakdown, HotelChoice, Itinerary, PinnedAttractions, Slot,
};
pub use policy::{PartialDayPolicy, PlanningPolicy, RecallPolicy};
pub use render::{
    render_history, render_hotel_listing, render_itinerary, EXAMPLE_REQUEST, FAREWELL, GREETING,
    HOTEL_OPTION_PROMPT, HOTEL_TIER_PROMPT,
};
pub use session::SessionMemory;
