use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use voyage_core::{
    classify_follow_up, normalize_text, parse_trip_request, plan_itinerary, render_hotel_listing,
    render_itinerary, AttractionTheme, Carryover, ConciergeError, ConciergeReply,
    FollowUpCommand, HotelChoice, HotelTier, Intent, PinnedAttractions, PlanningPolicy,
    RecallPolicy, ReferenceData, SessionMemory, TripParameters, TripRecord, HOTEL_OPTION_PROMPT,
    HOTEL_TIER_PROMPT,
};
use voyage_observability::AppMetrics;
use voyage_storage::TripHistoryRepository;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One conversation: owns the session memory and the random source, and routes each
/// message either to the itinerary generator or to the follow-up dispatcher.
pub struct ConciergeAgent<S>
where
    S: TripHistoryRepository,
{
    reference: Arc<ReferenceData>,
    policy: PlanningPolicy,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    rng: StdRng,
    session: Option<SessionMemory>,
    conversation_id: Uuid,
}

impl<S> ConciergeAgent<S>
where
    S: TripHistoryRepository,
{
    pub fn new(
        reference: Arc<ReferenceData>,
        policy: PlanningPolicy,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            reference,
            policy,
            store,
            metrics,
            rng: StdRng::from_os_rng(),
            session: None,
            conversation_id: Uuid::new_v4(),
        }
    }

    /// Pins every random draw (hotel pick, shuffle, day pick) to `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> Option<&SessionMemory> {
        self.session.as_ref()
    }

    #[instrument(skip(self, text), fields(conversation_id = %self.conversation_id))]
    pub async fn handle_message(&mut self, text: &str) -> Result<ConciergeReply> {
        self.metrics.inc_message();

        let normalized = normalize_text(text);
        let request = parse_trip_request(&normalized, &self.reference, &self.policy);
        debug!(request = ?request, "slots extracted");

        let reply = match request.into_parameters() {
            Some(params) => {
                let carryover = self
                    .session
                    .as_ref()
                    .map(SessionMemory::carryover)
                    .unwrap_or_default();
                self.generate(params, carryover, Intent::TripPlanning, None)
                    .await?
            }
            None => self.follow_up(&normalized).await?,
        };

        info!(
            intent = ?reply.intent,
            notice = ?reply.notice,
            planned = reply.itinerary.is_some(),
            "message handled"
        );
        Ok(reply)
    }

    pub async fn recent_trips(&self, limit: usize) -> Result<Vec<TripRecord>> {
        self.store.recent_trips(limit).await
    }

    /// Plans, records and adopts a trip. The record is committed before the session is
    /// replaced, so a storage failure leaves the previous session intact. `staged` is an
    /// edited copy of the session that becomes the base only once the record is written.
    async fn generate(
        &mut self,
        params: TripParameters,
        carryover: Carryover,
        intent: Intent,
        staged: Option<SessionMemory>,
    ) -> Result<ConciergeReply> {
        let itinerary = match plan_itinerary(
            &self.reference,
            &self.policy,
            &params,
            &carryover,
            &mut self.rng,
        ) {
            Ok(itinerary) => itinerary,
            Err(err) => return Ok(user_error(&self.metrics, intent, err)),
        };

        if itinerary.hotel_choice == HotelChoice::CheapestFallback {
            self.metrics.inc_hotel_fallback();
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let stored = self.store.append_trip(itinerary.to_record(timestamp)).await?;

        let previous = staged.or_else(|| self.session.take());
        self.session = Some(SessionMemory::from_itinerary(&itinerary, previous));
        self.metrics.inc_itinerary();

        info!(
            trip_id = stored.id,
            destination = %itinerary.destination,
            days = itinerary.duration,
            hotel = %itinerary.hotel.name,
            total_cost = itinerary.costs.total,
            remaining = itinerary.remaining_budget(),
            "itinerary generated"
        );

        Ok(ConciergeReply {
            reply_text: render_itinerary(&itinerary, self.policy.attractions_per_day),
            intent,
            notice: None,
            itinerary: Some(itinerary),
        })
    }

    async fn follow_up(&mut self, text: &str) -> Result<ConciergeReply> {
        self.metrics.inc_follow_up();

        let command = classify_follow_up(text);
        debug!(command = ?command, "follow-up classified");

        match command {
            FollowUpCommand::Recall => self.recall().await,
            _ if command.requires_session() && self.session.is_none() => Ok(user_error(
                &self.metrics,
                command.intent(),
                ConciergeError::NoActiveSession,
            )),
            FollowUpCommand::ListHotels(tier) => Ok(self.list_hotels(tier)),
            FollowUpCommand::BookHotel(option) => self.book_hotel(option).await,
            FollowUpCommand::ChangeTheme { theme, day } => self.change_theme(theme, day).await,
            FollowUpCommand::Unrecognized => Ok(user_error(
                &self.metrics,
                Intent::Unknown,
                ConciergeError::UnrecognizedCommand,
            )),
        }
    }

    async fn recall(&mut self) -> Result<ConciergeReply> {
        let Some(record) = self.store.latest_trip().await? else {
            return Ok(user_error(
                &self.metrics,
                Intent::Recall,
                ConciergeError::NoHistory,
            ));
        };

        info!(trip_id = record.id, destination = %record.destination, "recalling trip");

        let mut carryover = self
            .session
            .as_ref()
            .map(SessionMemory::carryover)
            .unwrap_or_default();
        if self.policy.recall == RecallPolicy::Restore {
            self.restore_selection(&record, &mut carryover);
        }

        self.generate(record.parameters(), carryover, Intent::Recall, None)
            .await
    }

    /// Looks the recorded hotel and attractions up by name. Attractions are pinned only
    /// when every recorded name still resolves; otherwise they are drawn afresh.
    fn restore_selection(&self, record: &TripRecord, carryover: &mut Carryover) {
        let Some(city) = self.reference.city(&record.destination) else {
            return;
        };

        carryover.restored_hotel = city.hotel_named(&record.hotel).cloned();

        let names = record.attraction_names();
        let restored = names
            .iter()
            .filter_map(|name| city.attraction_named(name).cloned())
            .collect::<Vec<_>>();

        if !names.is_empty() && restored.len() == names.len() {
            carryover.pinned = Some(PinnedAttractions {
                slots: restored.into_iter().map(Some).collect(),
                pool: city.attractions.clone(),
            });
        } else {
            debug!(
                recorded = names.len(),
                resolved = restored.len(),
                "recorded attractions no longer match the dataset"
            );
        }
    }

    fn list_hotels(&mut self, tier: Option<HotelTier>) -> ConciergeReply {
        let Some(tier) = tier else {
            return ConciergeReply::text(Intent::HotelListing, HOTEL_TIER_PROMPT);
        };
        let Some(session) = self.session.as_mut() else {
            return user_error(
                &self.metrics,
                Intent::HotelListing,
                ConciergeError::NoActiveSession,
            );
        };

        let listed = session.list_hotels(tier);
        debug!(tier = %tier, listed = listed.len(), "hotels listed");
        ConciergeReply::text(Intent::HotelListing, render_hotel_listing(tier, listed))
    }

    async fn book_hotel(&mut self, option: Option<usize>) -> Result<ConciergeReply> {
        let Some(session) = self.session.as_ref() else {
            return Ok(user_error(
                &self.metrics,
                Intent::HotelBooking,
                ConciergeError::NoActiveSession,
            ));
        };

        let Some(option) = option.filter(|_| !session.filtered_hotels.is_empty()) else {
            return Ok(ConciergeReply::text(
                Intent::HotelBooking,
                HOTEL_OPTION_PROMPT,
            ));
        };

        let hotel = match session.resolve_listed_hotel(option) {
            Ok(hotel) => hotel,
            Err(err) => return Ok(user_error(&self.metrics, Intent::HotelBooking, err)),
        };

        info!(hotel = %hotel.name, option, "hotel booked");
        let mut staged = session.clone();
        staged.selected_hotel = Some(hotel);

        let params = staged.parameters();
        let carryover = staged.carryover();
        self.generate(params, carryover, Intent::HotelBooking, Some(staged))
            .await
    }

    async fn change_theme(
        &mut self,
        theme: AttractionTheme,
        day: Option<usize>,
    ) -> Result<ConciergeReply> {
        let per_day = self.policy.attractions_per_day;
        let partial_day = self.policy.partial_day;

        let Some(session) = self.session.as_ref() else {
            return Ok(user_error(
                &self.metrics,
                Intent::AttractionChange,
                ConciergeError::NoActiveSession,
            ));
        };

        let day = match day {
            Some(day) => day,
            None => self.rng.random_range(1..=session.duration.max(1) as usize),
        };

        let mut staged = session.clone();
        let matches = staged.attractions_matching(theme);
        let replaced = match staged.replace_day(day, &matches, per_day, partial_day) {
            Ok(replaced) => replaced,
            Err(err) => return Ok(user_error(&self.metrics, Intent::AttractionChange, err)),
        };

        info!(
            theme = ?theme,
            day,
            matches = matches.len(),
            replaced,
            "attractions changed"
        );

        let params = staged.parameters();
        let carryover = staged.pinned_carryover();
        self.generate(params, carryover, Intent::AttractionChange, Some(staged))
            .await
    }
}

fn user_error(metrics: &AppMetrics, intent: Intent, err: ConciergeError) -> ConciergeReply {
    metrics.inc_user_error();
    info!(code = err.code(), intent = ?intent, "user error reported");

    ConciergeReply {
        reply_text: err.to_string(),
        intent,
        notice: Some(err.code().to_string()),
        itinerary: None,
    }
}
