use std::path::PathBuf;
use std::sync::Arc;

use voyage_agents::ConciergeAgent;
use voyage_core::{
    HotelChoice, Intent, PartialDayPolicy, PlanningPolicy, RecallPolicy, ReferenceData,
    HOTEL_OPTION_PROMPT, HOTEL_TIER_PROMPT, USAGE_HINT,
};
use voyage_observability::AppMetrics;
use voyage_storage::{Store, TripHistoryRepository};

const ROME_TRIP: &str = "Plan a 3 day trip from Mumbai to Rome under $4000";

fn dataset_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/travel_dataset.json")
}

fn reference() -> Arc<ReferenceData> {
    Arc::new(ReferenceData::load(dataset_path()).expect("dataset should load"))
}

fn agent_with(store: Store, policy: PlanningPolicy) -> ConciergeAgent<Store> {
    ConciergeAgent::new(reference(), policy, Arc::new(store), AppMetrics::shared()).with_seed(7)
}

fn agent(store: Store) -> ConciergeAgent<Store> {
    agent_with(store, PlanningPolicy::default())
}

fn slot_names(agent: &ConciergeAgent<Store>) -> Vec<Option<String>> {
    agent
        .session()
        .expect("session should exist")
        .chosen_attractions
        .iter()
        .map(|slot| slot.as_ref().map(|attraction| attraction.name.clone()))
        .collect()
}

#[tokio::test]
async fn plans_a_full_trip() {
    let store = Store::memory();
    let mut agent = agent(store.clone());

    let reply = agent.handle_message(ROME_TRIP).await.unwrap();

    assert_eq!(reply.intent, Intent::TripPlanning);
    assert!(reply.notice.is_none());
    let itinerary = reply.itinerary.as_ref().expect("itinerary expected");
    assert_eq!(itinerary.destination, "Rome");
    assert_eq!(itinerary.source.as_deref(), Some("Mumbai"));
    assert_eq!(itinerary.duration, 3);
    assert_eq!(itinerary.slots.len(), 6);
    assert!(itinerary.flight.is_available());

    let costs = itinerary.costs;
    assert_eq!(
        costs.total,
        costs.flight + costs.hotel + costs.attractions + costs.misc
    );
    assert_eq!(itinerary.remaining_budget(), 4000 - costs.total);
    assert_eq!(itinerary.hotel_choice, HotelChoice::WithinCap);
    assert!(itinerary.hotel.stay_cost(3) as f64 <= itinerary.remaining_after_flight as f64 * 0.6);

    assert!(reply.reply_text.contains("Day 3"));
    assert!(reply.reply_text.contains("Remaining Budget"));

    let latest = store.latest_trip().await.unwrap().expect("trip recorded");
    assert_eq!(latest.destination, "Rome");
    assert_eq!(latest.total_cost, costs.total);
    assert_eq!(latest.hotel, itinerary.hotel.name);
}

#[tokio::test]
async fn follow_up_before_any_plan_asks_for_a_trip() {
    let mut agent = agent(Store::memory());

    let reply = agent.handle_message("show luxury hotels").await.unwrap();

    assert_eq!(reply.notice.as_deref(), Some("no_active_session"));
    assert_eq!(reply.reply_text, "Please plan a trip first.");
    assert!(agent.session().is_none());
}

#[tokio::test]
async fn recall_with_empty_history_reports_no_history() {
    let mut agent = agent(Store::memory());

    let reply = agent.handle_message("show last trip").await.unwrap();

    assert_eq!(reply.intent, Intent::Recall);
    assert_eq!(reply.notice.as_deref(), Some("no_history"));
}

#[tokio::test]
async fn booked_hotel_survives_regeneration() {
    let mut agent = agent(Store::memory());
    agent.handle_message(ROME_TRIP).await.unwrap();

    let listing = agent.handle_message("show luxury hotels").await.unwrap();
    assert!(listing.reply_text.contains("1. Hotel Hassler"));
    assert!(listing.reply_text.contains("2. Hotel Artemide"));

    let booked = agent.handle_message("book hotel 1").await.unwrap();
    let itinerary = booked.itinerary.as_ref().expect("regenerated itinerary");
    assert_eq!(booked.intent, Intent::HotelBooking);
    assert_eq!(itinerary.hotel.name, "Hotel Hassler");
    assert_eq!(itinerary.hotel_choice, HotelChoice::Booked);

    let selected = agent
        .session()
        .and_then(|session| session.selected_hotel.clone())
        .expect("booking recorded");
    assert!(Arc::ptr_eq(&selected, &itinerary.hotel));

    let changed = agent.handle_message("change day 1 to museum").await.unwrap();
    let itinerary = changed.itinerary.expect("regenerated itinerary");
    assert!(Arc::ptr_eq(&selected, &itinerary.hotel));
}

#[tokio::test]
async fn out_of_range_booking_leaves_session_alone() {
    let store = Store::memory();
    let mut agent = agent(store.clone());
    agent.handle_message(ROME_TRIP).await.unwrap();
    agent.handle_message("show budget hotels").await.unwrap();
    let before = slot_names(&agent);

    let reply = agent.handle_message("choose hotel 9").await.unwrap();

    assert_eq!(reply.notice.as_deref(), Some("invalid_selection"));
    assert!(reply.itinerary.is_none());
    assert!(agent.session().unwrap().selected_hotel.is_none());
    assert_eq!(slot_names(&agent), before);
    assert_eq!(store.recent_trips(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn hotel_prompts_without_enough_detail() {
    let mut agent = agent(Store::memory());
    agent.handle_message(ROME_TRIP).await.unwrap();

    let reply = agent.handle_message("book hotel 1").await.unwrap();
    assert_eq!(reply.reply_text, HOTEL_OPTION_PROMPT);

    let reply = agent.handle_message("show hotels").await.unwrap();
    assert_eq!(reply.reply_text, HOTEL_TIER_PROMPT);
}

#[tokio::test]
async fn single_shopping_match_keeps_other_slot() {
    let mut agent = agent(Store::memory());
    agent.handle_message(ROME_TRIP).await.unwrap();
    let before = slot_names(&agent);

    let reply = agent
        .handle_message("change day 2 to shopping")
        .await
        .unwrap();

    assert_eq!(reply.intent, Intent::AttractionChange);
    let after = slot_names(&agent);
    assert_eq!(after.len(), 6);
    assert_eq!(after[2].as_deref(), Some("Via del Corso"));
    assert_eq!(after[3], before[3]);
    assert_eq!(after[..2], before[..2]);
    assert_eq!(after[4..], before[4..]);
}

#[tokio::test]
async fn single_shopping_match_can_clear_other_slot() {
    let policy = PlanningPolicy {
        partial_day: PartialDayPolicy::ClearUnmatched,
        ..PlanningPolicy::default()
    };
    let mut agent = agent_with(Store::memory(), policy);
    agent.handle_message(ROME_TRIP).await.unwrap();

    let reply = agent
        .handle_message("change day 2 to shopping")
        .await
        .unwrap();

    let after = slot_names(&agent);
    assert_eq!(after.len(), 6);
    assert_eq!(after[2].as_deref(), Some("Via del Corso"));
    assert_eq!(after[3], None);
    assert!(reply.reply_text.contains("Free time"));
}

#[tokio::test]
async fn day_outside_trip_is_rejected() {
    let mut agent = agent(Store::memory());
    agent.handle_message(ROME_TRIP).await.unwrap();

    let reply = agent.handle_message("change day 9 to museum").await.unwrap();

    assert_eq!(reply.notice.as_deref(), Some("invalid_selection"));
    assert!(reply.reply_text.starts_with("Invalid selection:"));
}

#[tokio::test]
async fn recall_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("history.db").display());

    {
        let mut first = agent(Store::sqlite(&url).await.unwrap());
        first.handle_message(ROME_TRIP).await.unwrap();
    }

    let store = Store::sqlite(&url).await.unwrap();
    let mut second = agent(store.clone());
    let reply = second.handle_message("show last trip").await.unwrap();

    assert_eq!(reply.intent, Intent::Recall);
    let itinerary = reply.itinerary.expect("recalled itinerary");
    assert_eq!(itinerary.destination, "Rome");
    assert_eq!(itinerary.duration, 3);
    assert_eq!(itinerary.budget, 4000);
    assert_eq!(store.recent_trips(10).await.unwrap().len(), 2);
    assert!(second.session().is_some());
}

#[tokio::test]
async fn restore_recall_replays_stored_selection() {
    let store = Store::memory();
    let mut first = agent(store.clone());
    first.handle_message(ROME_TRIP).await.unwrap();
    let recorded = store.latest_trip().await.unwrap().unwrap();

    let policy = PlanningPolicy {
        recall: RecallPolicy::Restore,
        ..PlanningPolicy::default()
    };
    let mut second = agent_with(store.clone(), policy).with_seed(1234);
    let reply = second.handle_message("previous").await.unwrap();

    let itinerary = reply.itinerary.expect("recalled itinerary");
    assert_eq!(itinerary.hotel.name, recorded.hotel);
    assert_eq!(itinerary.hotel_choice, HotelChoice::Restored);
    let names = itinerary
        .attractions()
        .map(|attraction| attraction.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names, recorded.attraction_names());
}

#[tokio::test]
async fn unrecognized_follow_up_gets_usage_hint() {
    let mut agent = agent(Store::memory());
    agent.handle_message(ROME_TRIP).await.unwrap();

    let reply = agent.handle_message("hello there").await.unwrap();

    assert_eq!(reply.intent, Intent::Unknown);
    assert_eq!(reply.notice.as_deref(), Some("unrecognized_command"));
    assert_eq!(reply.reply_text, USAGE_HINT);
}

#[tokio::test]
async fn unknown_destination_is_not_recorded() {
    let store = Store::memory();
    let mut agent = agent(store.clone());

    let reply = agent
        .handle_message("from mumbai to atlantis under $3000")
        .await
        .unwrap();

    assert_eq!(reply.notice.as_deref(), Some("dataset_miss"));
    assert_eq!(reply.reply_text, "Destination 'Atlantis' not found in dataset.");
    assert!(store.latest_trip().await.unwrap().is_none());
    assert!(agent.session().is_none());
}

#[tokio::test]
async fn reply_serializes_for_json_output() {
    let mut agent = agent(Store::memory());
    let reply = agent.handle_message(ROME_TRIP).await.unwrap();

    let value = serde_json::to_value(&reply).unwrap();

    assert_eq!(value["intent"], "trip_planning");
    assert_eq!(value["itinerary"]["destination"], "Rome");
    assert!(value["itinerary"]["costs"]["total"].is_i64());
}

#[tokio::test]
async fn long_trip_keeps_requested_length() {
    let store = Store::memory();
    let mut agent = agent(store.clone());

    let reply = agent
        .handle_message("from mumbai to rome under $90000 for 45 days")
        .await
        .unwrap();

    assert!(reply.notice.is_none());
    let itinerary = reply.itinerary.expect("itinerary expected");
    assert_eq!(itinerary.duration, 45);
    assert!(reply.reply_text.contains("Day 45"));
    let latest = store.latest_trip().await.unwrap().unwrap();
    assert_eq!(latest.days, 45);
}

#[tokio::test]
async fn trip_beyond_planning_limit_is_refused() {
    let store = Store::memory();
    let mut agent = agent(store.clone());

    let reply = agent
        .handle_message("from mumbai to rome under $90000 for 400 days")
        .await
        .unwrap();

    assert_eq!(reply.notice.as_deref(), Some("invalid_selection"));
    assert!(reply.reply_text.contains("400 day trip"));
    assert!(store.latest_trip().await.unwrap().is_none());
    assert!(agent.session().is_none());
}
